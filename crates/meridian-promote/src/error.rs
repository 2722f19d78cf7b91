//! Error types for meridian-promote.

use crate::hosting::HostingError;
use crate::registry::RegistryError;

/// Result type alias using [`PromoteError`].
pub type PromoteResult<T> = Result<T, PromoteError>;

/// Errors that can end a promotion run.
///
/// Upstream failures display the upstream message verbatim so callers see
/// exactly what the registry or hosting service reported.
#[derive(Debug, thiserror::Error)]
pub enum PromoteError {
    /// No approved model package exists in the group.
    #[error("no approved model found in package group {group}")]
    NotFound {
        /// Package group that was queried.
        group: String,
    },

    /// The hosting service rejected a create or update request.
    #[error(transparent)]
    Provision(#[from] HostingError),

    /// The model registry could not be queried.
    #[error(transparent)]
    Registry(#[from] RegistryError),

    /// The end-to-end deadline elapsed before the run finished.
    #[error("promotion did not finish within {secs}s")]
    DeadlineExceeded {
        /// Deadline that was applied.
        secs: u64,
    },

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// HTTP client error.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Internal error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl PromoteError {
    /// Create a not-found error for a package group.
    #[must_use]
    pub fn not_found(group: impl Into<String>) -> Self {
        Self::NotFound {
            group: group.into(),
        }
    }

    /// Create a configuration error.
    #[must_use]
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create an internal error.
    #[must_use]
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Returns true if the error is the "no approved model" terminal state.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Returns true if a caller may reasonably retry the whole run.
    ///
    /// Nothing at this layer retries; the answer only informs the
    /// orchestrating caller.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::Http(_) | Self::DeadlineExceeded { .. })
    }
}
