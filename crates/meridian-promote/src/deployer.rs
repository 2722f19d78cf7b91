//! Provisioning of serving resources for a resolved package.
//!
//! Three steps run in a fixed order, each only after the previous one
//! succeeded:
//!
//! ```text
//! ensure_model ──▶ ensure_endpoint_config ──▶ ensure_endpoint
//!                                                   │
//!                          create ──▶ Created       │
//!                          create ──▶ already exists ──update──▶ Updated
//!                          create ──▶ other error ──▶ Failed
//! ```
//!
//! A failure aborts the remaining steps. Resources created by earlier steps
//! are left in place.

use std::sync::Arc;

use tracing::{info, warn};

use crate::config::{ExistingResourcePolicy, HostingConfig};
use crate::error::{PromoteError, PromoteResult};
use crate::hosting::{
    CreateEndpointConfigRequest, CreateModelRequest, HostingError, HostingService,
};
use crate::types::{
    DeploymentNames, DeploymentOutcome, EndpointAction, EndpointHandle, PackageArn,
    ProductionVariant, ResourceKind, Stage,
};

/// Fixed shape of the single production variant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariantSettings {
    /// Instances provisioned up front.
    pub initial_instance_count: u32,
    /// Instance class.
    pub instance_type: String,
    /// Variant label.
    pub variant_name: String,
}

impl VariantSettings {
    /// Build the variant serving `model_name`.
    #[must_use]
    pub fn variant_for(&self, model_name: &str) -> ProductionVariant {
        ProductionVariant {
            model_name: model_name.to_owned(),
            initial_instance_count: self.initial_instance_count,
            instance_type: self.instance_type.clone(),
            variant_name: self.variant_name.clone(),
        }
    }
}

impl Default for VariantSettings {
    fn default() -> Self {
        Self::from(&HostingConfig::default())
    }
}

impl From<&HostingConfig> for VariantSettings {
    fn from(config: &HostingConfig) -> Self {
        Self {
            initial_instance_count: config.initial_instance_count,
            instance_type: config.instance_type.clone(),
            variant_name: config.variant_name.clone(),
        }
    }
}

/// Creates or updates the model, endpoint configuration and endpoint.
pub struct Deployer {
    hosting: Arc<dyn HostingService>,
    execution_role_arn: String,
    variant: VariantSettings,
    existing: ExistingResourcePolicy,
}

impl Deployer {
    /// Create a deployer acting as `execution_role_arn`.
    pub fn new(hosting: Arc<dyn HostingService>, execution_role_arn: impl Into<String>) -> Self {
        Self {
            hosting,
            execution_role_arn: execution_role_arn.into(),
            variant: VariantSettings::default(),
            existing: ExistingResourcePolicy::default(),
        }
    }

    /// Create a deployer from hosting configuration.
    pub fn from_config(hosting: Arc<dyn HostingService>, config: &HostingConfig) -> Self {
        Self::new(hosting, config.execution_role_arn.clone())
            .with_variant(VariantSettings::from(config))
            .with_existing_resources(config.existing_resources)
    }

    /// Override the production variant shape.
    #[must_use]
    pub fn with_variant(mut self, variant: VariantSettings) -> Self {
        self.variant = variant;
        self
    }

    /// Choose how an existing model or endpoint configuration is handled.
    #[must_use]
    pub const fn with_existing_resources(mut self, policy: ExistingResourcePolicy) -> Self {
        self.existing = policy;
        self
    }

    /// Register the model resource backed by `package_arn`.
    pub async fn ensure_model(
        &self,
        package_arn: &PackageArn,
        model_name: &str,
    ) -> PromoteResult<()> {
        let request = CreateModelRequest {
            model_name: model_name.to_owned(),
            execution_role_arn: self.execution_role_arn.clone(),
            package_arn: package_arn.clone(),
        };

        let result = self.hosting.create_model(&request).await;
        self.settle(ResourceKind::Model, model_name, result)
    }

    /// Register the single-variant configuration serving `model_name`.
    pub async fn ensure_endpoint_config(
        &self,
        model_name: &str,
        config_name: &str,
    ) -> PromoteResult<()> {
        let request = CreateEndpointConfigRequest {
            config_name: config_name.to_owned(),
            variants: vec![self.variant.variant_for(model_name)],
        };

        let result = self.hosting.create_endpoint_config(&request).await;
        self.settle(ResourceKind::EndpointConfig, config_name, result)
    }

    /// Bind `endpoint_name` to `config_name`, creating the endpoint if it
    /// does not exist and updating it if it does.
    pub async fn ensure_endpoint(
        &self,
        endpoint_name: &str,
        config_name: &str,
    ) -> PromoteResult<EndpointHandle> {
        let action = match self.hosting.create_endpoint(endpoint_name, config_name).await {
            Ok(()) => EndpointAction::Created,
            Err(HostingError::AlreadyExists {
                resource: ResourceKind::Endpoint,
                ..
            }) => {
                warn!(endpoint_name, config_name, "endpoint exists, updating it instead");
                self.hosting
                    .update_endpoint(endpoint_name, config_name)
                    .await?;
                EndpointAction::Updated
            }
            Err(e) => return Err(e.into()),
        };

        info!(endpoint_name, config_name, action = %action, "endpoint ready");

        Ok(EndpointHandle {
            name: endpoint_name.to_owned(),
            config_name: config_name.to_owned(),
            action,
        })
    }

    /// Run all three steps for a resolved package.
    pub async fn deploy(&self, names: &DeploymentNames) -> PromoteResult<DeploymentOutcome> {
        let handle = self.provision(names).await.map_err(|(_, e)| e)?;

        Ok(DeploymentOutcome {
            endpoint_name: handle.name,
        })
    }

    /// Run all three steps, reporting the stage that failed.
    pub async fn provision(
        &self,
        names: &DeploymentNames,
    ) -> Result<EndpointHandle, (Stage, PromoteError)> {
        self.ensure_model(&names.model_package_arn, &names.model_name)
            .await
            .map_err(|e| (Stage::Model, e))?;
        self.ensure_endpoint_config(&names.model_name, &names.endpoint_config_name)
            .await
            .map_err(|e| (Stage::EndpointConfig, e))?;
        self.ensure_endpoint(&names.endpoint_name, &names.endpoint_config_name)
            .await
            .map_err(|e| (Stage::Endpoint, e))
    }

    fn settle(
        &self,
        kind: ResourceKind,
        name: &str,
        result: Result<(), HostingError>,
    ) -> PromoteResult<()> {
        match result {
            Ok(()) => {
                info!(resource = %kind, name, "resource created");
                Ok(())
            }
            Err(e)
                if self.existing == ExistingResourcePolicy::Reuse
                    && e.is_already_exists(kind) =>
            {
                warn!(resource = %kind, name, "resource already exists, reusing it");
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }
}

impl std::fmt::Debug for Deployer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Deployer")
            .field("execution_role_arn", &self.execution_role_arn)
            .field("variant", &self.variant)
            .field("existing", &self.existing)
            .finish_non_exhaustive()
    }
}
