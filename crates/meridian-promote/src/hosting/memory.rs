//! In-memory hosting service for testing.

use std::collections::HashMap;
use std::sync::RwLock;
use std::time::Duration;

use async_trait::async_trait;

use crate::types::{ProductionVariant, ResourceKind};

use super::{
    classify, CreateEndpointConfigRequest, CreateModelRequest, HostingError, HostingService,
};

/// A call received by [`MemoryHosting`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostingCall {
    /// `create_model(name)`.
    CreateModel(String),
    /// `create_endpoint_config(name)`.
    CreateEndpointConfig(String),
    /// `create_endpoint(name, config)`.
    CreateEndpoint(String, String),
    /// `update_endpoint(name, config)`.
    UpdateEndpoint(String, String),
}

#[derive(Debug, Default)]
struct Resources {
    models: HashMap<String, CreateModelRequest>,
    configs: HashMap<String, Vec<ProductionVariant>>,
    endpoints: HashMap<String, String>,
    calls: Vec<HostingCall>,
    faults: HashMap<ResourceKind, HostingError>,
}

/// In-memory hosting service.
///
/// Rejects duplicate names with the same wording the real service uses, so
/// the rejections go through [`classify`] like upstream errors do.
#[derive(Debug, Default)]
pub struct MemoryHosting {
    resources: RwLock<Resources>,
    latency: Option<Duration>,
}

impl MemoryHosting {
    /// Create a new empty hosting service.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Delay every call by `latency` before it takes effect.
    #[must_use]
    pub const fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Fail every create call for `kind` with `error`.
    pub fn fail_on(&self, kind: ResourceKind, error: HostingError) -> Result<(), HostingError> {
        self.write()?.faults.insert(kind, error);
        Ok(())
    }

    /// Configuration an endpoint is currently bound to.
    pub fn endpoint_config(&self, name: &str) -> Result<Option<String>, HostingError> {
        Ok(self.read()?.endpoints.get(name).cloned())
    }

    /// Number of endpoints that exist.
    pub fn endpoint_count(&self) -> Result<usize, HostingError> {
        Ok(self.read()?.endpoints.len())
    }

    /// Registered model, if any.
    pub fn model(&self, name: &str) -> Result<Option<CreateModelRequest>, HostingError> {
        Ok(self.read()?.models.get(name).cloned())
    }

    /// Variants of a registered configuration, if any.
    pub fn config_variants(
        &self,
        name: &str,
    ) -> Result<Option<Vec<ProductionVariant>>, HostingError> {
        Ok(self.read()?.configs.get(name).cloned())
    }

    /// Every call received so far, in order.
    pub fn calls(&self) -> Result<Vec<HostingCall>, HostingError> {
        Ok(self.read()?.calls.clone())
    }

    fn read(&self) -> Result<std::sync::RwLockReadGuard<'_, Resources>, HostingError> {
        self.resources
            .read()
            .map_err(|_| HostingError::failed("lock poisoned"))
    }

    fn write(&self) -> Result<std::sync::RwLockWriteGuard<'_, Resources>, HostingError> {
        self.resources
            .write()
            .map_err(|_| HostingError::failed("lock poisoned"))
    }

    async fn delay(&self) {
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
    }
}

#[async_trait]
impl HostingService for MemoryHosting {
    async fn create_model(&self, request: &CreateModelRequest) -> Result<(), HostingError> {
        self.delay().await;
        let mut resources = self.write()?;
        resources
            .calls
            .push(HostingCall::CreateModel(request.model_name.clone()));

        if let Some(fault) = resources.faults.get(&ResourceKind::Model) {
            return Err(fault.clone());
        }
        if resources.models.contains_key(&request.model_name) {
            return Err(classify(
                ResourceKind::Model,
                Some("ValidationException"),
                &format!(
                    "Cannot create already existing model \"{}\".",
                    request.model_name
                ),
            ));
        }

        resources
            .models
            .insert(request.model_name.clone(), request.clone());
        Ok(())
    }

    async fn create_endpoint_config(
        &self,
        request: &CreateEndpointConfigRequest,
    ) -> Result<(), HostingError> {
        self.delay().await;
        let mut resources = self.write()?;
        resources
            .calls
            .push(HostingCall::CreateEndpointConfig(request.config_name.clone()));

        if let Some(fault) = resources.faults.get(&ResourceKind::EndpointConfig) {
            return Err(fault.clone());
        }
        if resources.configs.contains_key(&request.config_name) {
            return Err(classify(
                ResourceKind::EndpointConfig,
                Some("ValidationException"),
                &format!(
                    "Cannot create already existing endpoint configuration \"{}\".",
                    request.config_name
                ),
            ));
        }
        if let Some(missing) = request
            .variants
            .iter()
            .find(|v| !resources.models.contains_key(&v.model_name))
        {
            return Err(classify(
                ResourceKind::EndpointConfig,
                Some("ValidationException"),
                &format!("Could not find model \"{}\".", missing.model_name),
            ));
        }

        resources
            .configs
            .insert(request.config_name.clone(), request.variants.clone());
        Ok(())
    }

    async fn create_endpoint(&self, name: &str, config_name: &str) -> Result<(), HostingError> {
        self.delay().await;
        let mut resources = self.write()?;
        resources.calls.push(HostingCall::CreateEndpoint(
            name.to_owned(),
            config_name.to_owned(),
        ));

        if let Some(fault) = resources.faults.get(&ResourceKind::Endpoint) {
            return Err(fault.clone());
        }
        if resources.endpoints.contains_key(name) {
            return Err(classify(
                ResourceKind::Endpoint,
                Some("ValidationException"),
                &format!("Cannot create already existing endpoint \"{name}\"."),
            ));
        }
        if !resources.configs.contains_key(config_name) {
            return Err(classify(
                ResourceKind::Endpoint,
                Some("ValidationException"),
                &format!("Could not find endpoint configuration \"{config_name}\"."),
            ));
        }

        resources
            .endpoints
            .insert(name.to_owned(), config_name.to_owned());
        Ok(())
    }

    async fn update_endpoint(&self, name: &str, config_name: &str) -> Result<(), HostingError> {
        self.delay().await;
        let mut resources = self.write()?;
        resources.calls.push(HostingCall::UpdateEndpoint(
            name.to_owned(),
            config_name.to_owned(),
        ));

        if !resources.configs.contains_key(config_name) {
            return Err(classify(
                ResourceKind::Endpoint,
                Some("ValidationException"),
                &format!("Could not find endpoint configuration \"{config_name}\"."),
            ));
        }

        match resources.endpoints.get_mut(name) {
            Some(bound) => {
                config_name.clone_into(bound);
                Ok(())
            }
            None => Err(classify(
                ResourceKind::Endpoint,
                Some("ValidationException"),
                &format!("Could not find endpoint \"{name}\"."),
            )),
        }
    }
}
