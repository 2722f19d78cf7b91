//! Model registry access.
//!
//! The registry owns model packages and their approval workflow. This module
//! only lists packages; the [`ModelRegistry`] trait is the seam between the
//! resolver and whichever registry backend is configured.

mod memory;

pub use memory::MemoryRegistry;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::types::{ApprovalStatus, ModelPackage};

/// Error reported by a registry backend.
///
/// Displays the upstream message unchanged.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct RegistryError {
    /// Upstream error code, when the backend reports one.
    pub code: Option<String>,
    /// Upstream error message.
    pub message: String,
}

impl RegistryError {
    /// Create a registry error without an upstream code.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            code: None,
            message: message.into(),
        }
    }

    /// Create a registry error with an upstream code.
    #[must_use]
    pub fn with_code(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: Some(code.into()),
            message: message.into(),
        }
    }
}

/// Field used to order package listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SortBy {
    /// Order by package creation time.
    #[default]
    CreationTime,
}

/// Direction of a package listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SortOrder {
    /// Oldest first.
    Ascending,
    /// Newest first.
    #[default]
    Descending,
}

/// Query for listing the packages of one group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageQuery {
    /// Package group to list.
    pub group: String,
    /// Only return packages with this status.
    pub status: Option<ApprovalStatus>,
    /// Ordering key.
    pub sort_by: SortBy,
    /// Ordering direction.
    pub sort_order: SortOrder,
    /// Maximum number of results.
    pub limit: Option<u32>,
}

impl PackageQuery {
    /// Create an unfiltered query for a group.
    #[must_use]
    pub fn new(group: impl Into<String>) -> Self {
        Self {
            group: group.into(),
            status: None,
            sort_by: SortBy::default(),
            sort_order: SortOrder::default(),
            limit: None,
        }
    }

    /// The query the resolver issues: newest approved package only.
    #[must_use]
    pub fn latest_approved(group: impl Into<String>) -> Self {
        Self::new(group)
            .with_status(ApprovalStatus::Approved)
            .with_sort(SortBy::CreationTime, SortOrder::Descending)
            .with_limit(1)
    }

    /// Filter by approval status.
    #[must_use]
    pub const fn with_status(mut self, status: ApprovalStatus) -> Self {
        self.status = Some(status);
        self
    }

    /// Set ordering.
    #[must_use]
    pub const fn with_sort(mut self, sort_by: SortBy, sort_order: SortOrder) -> Self {
        self.sort_by = sort_by;
        self.sort_order = sort_order;
        self
    }

    /// Set maximum results.
    #[must_use]
    pub const fn with_limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }
}

/// Backend for listing model packages.
#[async_trait]
pub trait ModelRegistry: Send + Sync {
    /// List packages matching the query.
    ///
    /// Packages with equal sort keys are returned in whatever order the
    /// backend produces; no secondary ordering is applied.
    async fn list_packages(
        &self,
        query: &PackageQuery,
    ) -> Result<Vec<ModelPackage>, RegistryError>;
}
