//! Meridian model promotion
//!
//! This crate promotes the newest approved model package of a registry group
//! into a live inference endpoint.
//!
//! # Architecture
//!
//! A promotion has two halves:
//!
//! - **Resolution**: the [`Resolver`] asks the [`ModelRegistry`] for the
//!   newest approved package in a group and derives the model, endpoint
//!   configuration and endpoint names from its ARN
//! - **Deployment**: the [`Deployer`] drives the [`HostingService`] through
//!   three ordered steps, creating the endpoint or moving an existing one to
//!   the new configuration
//!
//! The [`Pipeline`] composes both under one deadline. The [`SageMakerClient`]
//! implements both backend traits over HTTP; the in-memory fakes implement
//! them for tests.
//!
//! ```text
//! resolve ──▶ ensure_model ──▶ ensure_endpoint_config ──▶ ensure_endpoint
//!    │             │                    │                       │
//!    ▼             ▼                    ▼                       ▼
//! NotFound      Failed               Failed            Created | Updated
//! ```
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use meridian_promote::{Pipeline, PromoteConfig, SageMakerClient};
//!
//! let config = PromoteConfig::load()?;
//! let registry = SageMakerClient::for_registry(&config.registry, &config.hosting)?;
//! let hosting = SageMakerClient::for_hosting(&config.hosting)?;
//!
//! let pipeline = Pipeline::from_config(&config, Arc::new(registry), Arc::new(hosting));
//! let report = pipeline.run(&config.registry.group_name).await?;
//! println!("{}", report.endpoint.name);
//! ```

#![doc = include_str!("../README.md")]
#![forbid(unsafe_code)]

pub mod api;
pub mod config;
pub mod deployer;
pub mod error;
pub mod hosting;
pub mod naming;
pub mod pipeline;
pub mod registry;
pub mod resolver;
pub mod sagemaker;
pub mod service;
pub mod types;

// Re-export commonly used types at the crate root
pub use config::{ExistingResourcePolicy, PromoteConfig};
pub use deployer::{Deployer, VariantSettings};
pub use error::{PromoteError, PromoteResult};
pub use hosting::{HostingError, HostingService, MemoryHosting};
pub use naming::derive_names;
pub use pipeline::{Pipeline, PipelineReport};
pub use registry::{MemoryRegistry, ModelRegistry, PackageQuery, RegistryError};
pub use resolver::Resolver;
pub use sagemaker::SageMakerClient;
pub use service::PromoteService;
pub use types::{
    ApprovalStatus, DeploymentNames, DeploymentOutcome, EndpointAction, EndpointHandle,
    ModelPackage, PackageArn, ProductionVariant, ResourceKind, Stage,
};
