//! Resolution of the package to promote.

use std::sync::Arc;

use tracing::{debug, info};

use crate::error::{PromoteError, PromoteResult};
use crate::naming::derive_names;
use crate::registry::{ModelRegistry, PackageQuery};
use crate::types::{DeploymentNames, ModelPackage};

/// Finds the newest approved package in a group and names its resources.
pub struct Resolver {
    registry: Arc<dyn ModelRegistry>,
}

impl Resolver {
    /// Create a resolver over a registry backend.
    pub fn new(registry: Arc<dyn ModelRegistry>) -> Self {
        Self { registry }
    }

    /// Return the newest approved package in `group`.
    ///
    /// Packages created at the same instant come back in the registry's own
    /// order. Fails with [`PromoteError::NotFound`] when the group has no
    /// approved package; that is a terminal answer, not a transient one.
    pub async fn latest_approved(&self, group: &str) -> PromoteResult<ModelPackage> {
        let query = PackageQuery::latest_approved(group);
        let packages = self.registry.list_packages(&query).await?;

        debug!(group, listed = packages.len(), "registry listing returned");

        packages
            .into_iter()
            .find(|p| p.approval_status.is_deployable())
            .ok_or_else(|| PromoteError::not_found(group))
    }

    /// Resolve `group` to the names of the resources serving its newest
    /// approved package.
    pub async fn resolve(&self, group: &str) -> PromoteResult<DeploymentNames> {
        let package = self.latest_approved(group).await?;
        let names = derive_names(&package.arn);

        info!(
            group,
            package_arn = %package.arn,
            created_at = %package.created_at,
            model_name = %names.model_name,
            endpoint_name = %names.endpoint_name,
            "resolved approved model package"
        );

        Ok(names)
    }
}

impl std::fmt::Debug for Resolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Resolver").finish_non_exhaustive()
    }
}
