//! JSON bodies exchanged with the SageMaker API.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::registry::{SortBy, SortOrder};
use crate::types::{ApprovalStatus, ModelPackage, PackageArn, ProductionVariant};

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub(super) struct ListModelPackagesInput<'a> {
    pub model_package_group_name: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model_approval_status: Option<&'static str>,
    pub sort_by: SortBy,
    pub sort_order: SortOrder,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_results: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_token: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub(super) struct ListModelPackagesOutput {
    #[serde(default)]
    pub model_package_summary_list: Vec<ModelPackageSummary>,
    pub next_token: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub(super) struct ModelPackageSummary {
    pub model_package_arn: String,
    pub model_approval_status: Option<ApprovalStatus>,
    /// Seconds since the epoch, with a fractional part.
    pub creation_time: f64,
}

impl ModelPackageSummary {
    /// Convert to the crate's package type.
    ///
    /// Listings filtered by status may omit the status on each summary; the
    /// filter value is used in that case.
    pub fn into_package(self, requested: Option<ApprovalStatus>) -> ModelPackage {
        ModelPackage {
            arn: PackageArn::new(self.model_package_arn),
            approval_status: self
                .model_approval_status
                .or(requested)
                .unwrap_or(ApprovalStatus::Pending),
            created_at: epoch_to_datetime(self.creation_time),
        }
    }
}

#[allow(clippy::as_conversions, clippy::cast_possible_truncation)]
fn epoch_to_datetime(secs: f64) -> DateTime<Utc> {
    let millis = (secs * 1000.0).round() as i64;
    DateTime::from_timestamp_millis(millis).unwrap_or_default()
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub(super) struct CreateModelInput<'a> {
    pub model_name: &'a str,
    pub execution_role_arn: &'a str,
    pub containers: Vec<ContainerDefinition<'a>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub(super) struct ContainerDefinition<'a> {
    pub model_package_name: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub(super) struct CreateEndpointConfigInput<'a> {
    pub endpoint_config_name: &'a str,
    pub production_variants: &'a [ProductionVariant],
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub(super) struct EndpointInput<'a> {
    pub endpoint_name: &'a str,
    pub endpoint_config_name: &'a str,
}

/// Any of the `*Arn` fields a create/update call returns.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub(super) struct ResourceArnOutput {
    pub model_arn: Option<String>,
    pub endpoint_config_arn: Option<String>,
    pub endpoint_arn: Option<String>,
}

impl ResourceArnOutput {
    pub fn arn(&self) -> Option<&str> {
        self.model_arn
            .as_deref()
            .or(self.endpoint_config_arn.as_deref())
            .or(self.endpoint_arn.as_deref())
    }
}

/// Error body returned with a non-success status.
#[derive(Debug, Default, Deserialize)]
pub(super) struct ErrorBody {
    #[serde(rename = "__type")]
    pub kind: Option<String>,
    #[serde(alias = "Message")]
    pub message: Option<String>,
}

impl ErrorBody {
    /// Error code without the namespace prefix some responses carry.
    pub fn code(&self) -> Option<&str> {
        self.kind
            .as_deref()
            .map(|kind| kind.rsplit('#').next().unwrap_or(kind))
    }
}
