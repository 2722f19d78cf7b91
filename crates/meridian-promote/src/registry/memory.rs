//! In-memory model registry for testing.

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;

use crate::types::{ApprovalStatus, ModelPackage};

use super::{ModelRegistry, PackageQuery, RegistryError, SortBy, SortOrder};

/// In-memory model registry.
///
/// Packages keep their registration order, and sorting is stable, so ties on
/// creation time come back in registration order.
#[derive(Debug, Default)]
pub struct MemoryRegistry {
    groups: RwLock<HashMap<String, Vec<ModelPackage>>>,
}

impl MemoryRegistry {
    /// Create a new empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a package in a group.
    pub fn register(&self, group: &str, package: ModelPackage) -> Result<(), RegistryError> {
        let mut groups = self
            .groups
            .write()
            .map_err(|_| RegistryError::new("lock poisoned"))?;
        groups.entry(group.to_owned()).or_default().push(package);
        Ok(())
    }

    /// Change the approval status of a registered package.
    pub fn set_status(
        &self,
        group: &str,
        arn: &str,
        status: ApprovalStatus,
    ) -> Result<(), RegistryError> {
        let mut groups = self
            .groups
            .write()
            .map_err(|_| RegistryError::new("lock poisoned"))?;

        let package = groups
            .get_mut(group)
            .and_then(|packages| packages.iter_mut().find(|p| p.arn.as_str() == arn))
            .ok_or_else(|| RegistryError::new(format!("model package not found: {arn}")))?;

        package.approval_status = status;
        Ok(())
    }
}

#[async_trait]
impl ModelRegistry for MemoryRegistry {
    async fn list_packages(
        &self,
        query: &PackageQuery,
    ) -> Result<Vec<ModelPackage>, RegistryError> {
        let groups = self
            .groups
            .read()
            .map_err(|_| RegistryError::new("lock poisoned"))?;

        let mut results: Vec<_> = groups
            .get(&query.group)
            .map(|packages| {
                packages
                    .iter()
                    .filter(|p| query.status.is_none_or(|s| p.approval_status == s))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();

        match (query.sort_by, query.sort_order) {
            (SortBy::CreationTime, SortOrder::Ascending) => {
                results.sort_by(|a, b| a.created_at.cmp(&b.created_at));
            }
            (SortBy::CreationTime, SortOrder::Descending) => {
                results.sort_by(|a, b| b.created_at.cmp(&a.created_at));
            }
        }

        if let Some(limit) = query.limit {
            results.truncate(usize::try_from(limit).unwrap_or(usize::MAX));
        }

        Ok(results)
    }
}
