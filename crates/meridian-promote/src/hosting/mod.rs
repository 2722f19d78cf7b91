//! Inference hosting service access.
//!
//! The hosting service owns models, endpoint configurations and endpoints.
//! Nothing here tracks their state locally; every call goes to the service
//! and the service's answer is the only source of truth.
//!
//! Raw upstream failures are turned into a [`HostingError`] exactly once, by
//! [`classify`], inside the backend adapter. Callers only ever match on the
//! variant and never inspect message text.

mod memory;

pub use memory::{HostingCall, MemoryHosting};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::types::{PackageArn, ProductionVariant, ResourceKind};

/// Classified failure from the hosting service.
///
/// Both variants display the upstream message unchanged.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HostingError {
    /// A resource with the requested name already exists.
    #[error("{message}")]
    AlreadyExists {
        /// Kind of resource that collided.
        resource: ResourceKind,
        /// Upstream error message.
        message: String,
    },

    /// Any other rejection.
    #[error("{message}")]
    Failed {
        /// Upstream error code, when reported.
        code: Option<String>,
        /// Upstream error message.
        message: String,
    },
}

impl HostingError {
    /// Create an unclassified failure.
    #[must_use]
    pub fn failed(message: impl Into<String>) -> Self {
        Self::Failed {
            code: None,
            message: message.into(),
        }
    }

    /// Returns true if this is a name collision on `kind`.
    #[must_use]
    pub fn is_already_exists(&self, kind: ResourceKind) -> bool {
        matches!(self, Self::AlreadyExists { resource, .. } if *resource == kind)
    }

    /// Upstream error message.
    #[must_use]
    pub fn message(&self) -> &str {
        match self {
            Self::AlreadyExists { message, .. } | Self::Failed { message, .. } => message,
        }
    }
}

/// Map a raw upstream error onto the [`HostingError`] taxonomy.
///
/// A failure whose message reports that the target already exists is a name
/// collision on `resource`; everything else is a plain failure carrying the
/// upstream code and message.
#[must_use]
pub fn classify(resource: ResourceKind, code: Option<&str>, message: &str) -> HostingError {
    if message.to_ascii_lowercase().contains("already exist") {
        return HostingError::AlreadyExists {
            resource,
            message: message.to_owned(),
        };
    }

    HostingError::Failed {
        code: code.map(ToOwned::to_owned),
        message: message.to_owned(),
    }
}

/// Request to register a servable model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateModelRequest {
    /// Model resource name.
    pub model_name: String,
    /// Role the hosting service assumes to run the model.
    pub execution_role_arn: String,
    /// Registry package backing the model.
    pub package_arn: PackageArn,
}

/// Request to register an endpoint configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateEndpointConfigRequest {
    /// Configuration name.
    pub config_name: String,
    /// Production variants served by the configuration.
    pub variants: Vec<ProductionVariant>,
}

/// Backend for provisioning serving resources.
#[async_trait]
pub trait HostingService: Send + Sync {
    /// Register a model resource.
    async fn create_model(&self, request: &CreateModelRequest) -> Result<(), HostingError>;

    /// Register an endpoint configuration.
    async fn create_endpoint_config(
        &self,
        request: &CreateEndpointConfigRequest,
    ) -> Result<(), HostingError>;

    /// Create an endpoint bound to a configuration.
    async fn create_endpoint(&self, name: &str, config_name: &str) -> Result<(), HostingError>;

    /// Rebind an existing endpoint to a different configuration.
    async fn update_endpoint(&self, name: &str, config_name: &str) -> Result<(), HostingError>;
}
