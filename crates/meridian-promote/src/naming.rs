//! Deterministic resource naming.
//!
//! Every serving resource is named after the trailing path segment of the
//! package ARN, so the same package always maps to the same names. Re-running
//! a promotion therefore addresses the resources a previous run created.

use crate::types::{DeploymentNames, PackageArn};

/// Suffix appended to the model resource name.
pub const MODEL_SUFFIX: &str = "-model";

/// Suffix appended to the endpoint configuration name.
pub const CONFIG_SUFFIX: &str = "-config";

/// Suffix appended to the endpoint name.
pub const ENDPOINT_SUFFIX: &str = "-endpoint";

/// Return the part of `arn` after its last `/`.
///
/// An ARN without any `/` is returned whole.
#[must_use]
pub fn trailing_segment(arn: &str) -> &str {
    arn.rsplit('/').next().unwrap_or(arn)
}

/// Derive the resource names for a package.
#[must_use]
pub fn derive_names(arn: &PackageArn) -> DeploymentNames {
    let stem = trailing_segment(arn.as_str());

    DeploymentNames {
        model_package_arn: arn.clone(),
        model_name: format!("{stem}{MODEL_SUFFIX}"),
        endpoint_config_name: format!("{stem}{CONFIG_SUFFIX}"),
        endpoint_name: format!("{stem}{ENDPOINT_SUFFIX}"),
    }
}
