//! Core types for meridian-promote.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Registry identifier of one versioned model package (an ARN).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PackageArn(String);

impl PackageArn {
    /// Create a new package ARN.
    #[must_use]
    pub fn new(arn: impl Into<String>) -> Self {
        Self(arn.into())
    }

    /// Get the ARN as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PackageArn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for PackageArn {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Registry approval gate for a model package.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ApprovalStatus {
    /// Awaiting review.
    #[serde(alias = "PendingManualApproval")]
    Pending,
    /// Eligible for deployment.
    Approved,
    /// Not eligible for deployment.
    Rejected,
}

impl ApprovalStatus {
    /// Get the status name as used on the wire.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "PendingManualApproval",
            Self::Approved => "Approved",
            Self::Rejected => "Rejected",
        }
    }

    /// Returns true if packages with this status may be deployed.
    #[must_use]
    pub const fn is_deployable(&self) -> bool {
        matches!(self, Self::Approved)
    }
}

impl fmt::Display for ApprovalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A model package as listed by the registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelPackage {
    /// Unique package identifier.
    pub arn: PackageArn,
    /// Approval status at listing time.
    pub approval_status: ApprovalStatus,
    /// Creation time, used for ordering.
    pub created_at: DateTime<Utc>,
}

impl ModelPackage {
    /// Create a package summary.
    #[must_use]
    pub fn new(
        arn: impl Into<String>,
        approval_status: ApprovalStatus,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            arn: PackageArn::new(arn),
            approval_status,
            created_at,
        }
    }
}

/// Names of every serving resource derived from one package.
///
/// This is also the record handed from the resolve step to the deploy step,
/// so it serialises with the field names the workflow exchanges.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct DeploymentNames {
    /// Package the resources are backed by.
    pub model_package_arn: PackageArn,
    /// Name of the model resource.
    pub model_name: String,
    /// Name of the endpoint configuration.
    pub endpoint_config_name: String,
    /// Name of the endpoint.
    pub endpoint_name: String,
}

/// Kind of serving resource owned by the hosting service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    /// Servable model registration.
    Model,
    /// Named serving configuration.
    EndpointConfig,
    /// Network-addressable endpoint.
    Endpoint,
}

impl ResourceKind {
    /// Get the kind name as a static string.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Model => "model",
            Self::EndpointConfig => "endpoint_config",
            Self::Endpoint => "endpoint",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Stage of a promotion run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    /// Finding the newest approved package.
    Resolve,
    /// Registering the model.
    Model,
    /// Registering the endpoint configuration.
    EndpointConfig,
    /// Creating or updating the endpoint.
    Endpoint,
}

impl Stage {
    /// Get the stage name as a static string.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Resolve => "resolve",
            Self::Model => "model",
            Self::EndpointConfig => "endpoint_config",
            Self::Endpoint => "endpoint",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One production variant of an endpoint configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ProductionVariant {
    /// Model served by this variant.
    pub model_name: String,
    /// Number of instances provisioned up front.
    pub initial_instance_count: u32,
    /// Instance class.
    pub instance_type: String,
    /// Variant label.
    pub variant_name: String,
}

/// How an endpoint ended up bound to its configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EndpointAction {
    /// A new endpoint was created.
    Created,
    /// An existing endpoint was moved to the new configuration.
    Updated,
}

impl EndpointAction {
    /// Get the action name as a static string.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Updated => "updated",
        }
    }
}

impl fmt::Display for EndpointAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Result of ensuring an endpoint exists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EndpointHandle {
    /// Endpoint name.
    pub name: String,
    /// Configuration the endpoint is now bound to.
    pub config_name: String,
    /// Whether the endpoint was created or updated.
    pub action: EndpointAction,
}

/// Final result of the deploy phase.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct DeploymentOutcome {
    /// Endpoint serving the promoted model.
    pub endpoint_name: String,
}
