//! SageMaker API adapter.
//!
//! Speaks the JSON 1.1 protocol (`POST /` with an `X-Amz-Target` header) and
//! implements both [`ModelRegistry`] and [`HostingService`]. Upstream errors
//! are classified here, once, through [`hosting::classify`](crate::hosting::classify).
//!
//! Requests are sent unsigned, so an endpoint URL is always required. It
//! names a signing proxy (or a compatible emulator) that holds the
//! credentials. The regional SageMaker host goes in the `Host` header, which
//! is how such proxies pick the upstream service and region.

mod wire;

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{CONTENT_TYPE, HOST};
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

use crate::config::{HostingConfig, RegistryConfig};
use crate::error::{PromoteError, PromoteResult};
use crate::hosting::{
    classify, CreateEndpointConfigRequest, CreateModelRequest, HostingError, HostingService,
};
use crate::registry::{ModelRegistry, PackageQuery, RegistryError};
use crate::types::{ModelPackage, ResourceKind};

use wire::{
    ContainerDefinition, CreateEndpointConfigInput, CreateModelInput, EndpointInput, ErrorBody,
    ListModelPackagesInput, ListModelPackagesOutput, ResourceArnOutput,
};

const JSON_CONTENT_TYPE: &str = "application/x-amz-json-1.1";
const TARGET_HEADER: &str = "X-Amz-Target";
const TARGET_PREFIX: &str = "SageMaker.";

/// Failure of one API call before classification.
#[derive(Debug)]
struct RawError {
    code: Option<String>,
    message: String,
}

impl From<reqwest::Error> for RawError {
    fn from(e: reqwest::Error) -> Self {
        Self {
            code: None,
            message: e.to_string(),
        }
    }
}

/// HTTP client for the SageMaker API.
#[derive(Debug, Clone)]
pub struct SageMakerClient {
    client: Client,
    base_url: String,
    host: Option<String>,
}

impl SageMakerClient {
    /// Create a client for `region`, sending requests to `endpoint`.
    pub fn new(region: &str, endpoint: &str, timeout: Duration) -> PromoteResult<Self> {
        let mut client = Self::build(endpoint, timeout)?;
        client.host = Some(regional_host(region));
        Ok(client)
    }

    /// Create the client used for registry listings.
    ///
    /// Uses `registry.endpoint`, falling back to `hosting.endpoint`.
    pub fn for_registry(
        registry: &RegistryConfig,
        hosting: &HostingConfig,
    ) -> PromoteResult<Self> {
        let endpoint = registry
            .endpoint
            .as_deref()
            .or(hosting.endpoint.as_deref())
            .ok_or_else(|| {
                PromoteError::config("registry.endpoint or hosting.endpoint must be set")
            })?;

        Self::new(
            hosting.registry_region(registry),
            endpoint,
            Duration::from_secs(registry.timeout_secs),
        )
    }

    /// Create the client used for provisioning.
    pub fn for_hosting(hosting: &HostingConfig) -> PromoteResult<Self> {
        let endpoint = hosting
            .endpoint
            .as_deref()
            .ok_or_else(|| PromoteError::config("hosting.endpoint must be set"))?;

        Self::new(
            &hosting.region,
            endpoint,
            Duration::from_secs(hosting.timeout_secs),
        )
    }

    /// Create a client with a custom base URL and no `Host` override.
    pub fn with_url(url: impl Into<String>) -> PromoteResult<Self> {
        Self::build(&url.into(), Duration::from_secs(10))
    }

    fn build(endpoint: &str, timeout: Duration) -> PromoteResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(PromoteError::Http)?;

        Ok(Self {
            client,
            base_url: endpoint.trim_end_matches('/').to_owned(),
            host: None,
        })
    }

    /// Base URL requests are sent to.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Upstream host named in each request, if any.
    #[must_use]
    pub fn host(&self) -> Option<&str> {
        self.host.as_deref()
    }

    async fn call<I, O>(&self, action: &str, input: &I) -> Result<O, RawError>
    where
        I: Serialize + Sync,
        O: DeserializeOwned + Send,
    {
        debug!(action, url = %self.base_url, "calling SageMaker");

        let mut request = self
            .client
            .post(format!("{}/", self.base_url))
            .header(CONTENT_TYPE, JSON_CONTENT_TYPE)
            .header(TARGET_HEADER, format!("{TARGET_PREFIX}{action}"));
        if let Some(host) = &self.host {
            request = request.header(HOST, host);
        }

        let response = request.json(input).send().await?;

        let status = response.status();
        if status.is_success() {
            return Ok(response.json().await?);
        }

        let text = response.text().await.unwrap_or_default();
        let body: ErrorBody = serde_json::from_str(&text).unwrap_or_default();
        Err(RawError {
            code: body.code().map(ToOwned::to_owned),
            message: body
                .message
                .unwrap_or_else(|| format!("{action} failed with status {status}")),
        })
    }

    async fn provision<I>(
        &self,
        action: &str,
        resource: ResourceKind,
        input: &I,
    ) -> Result<(), HostingError>
    where
        I: Serialize + Sync,
    {
        let output: ResourceArnOutput = self
            .call(action, input)
            .await
            .map_err(|e| classify(resource, e.code.as_deref(), &e.message))?;

        debug!(action, arn = ?output.arn(), "SageMaker accepted request");
        Ok(())
    }
}

#[async_trait]
impl ModelRegistry for SageMakerClient {
    async fn list_packages(
        &self,
        query: &PackageQuery,
    ) -> Result<Vec<ModelPackage>, RegistryError> {
        let mut packages = Vec::new();
        let mut next_token: Option<String> = None;

        loop {
            let remaining = query.limit.map(|limit| {
                let fetched = u32::try_from(packages.len()).unwrap_or(u32::MAX);
                limit.saturating_sub(fetched)
            });

            let input = ListModelPackagesInput {
                model_package_group_name: &query.group,
                model_approval_status: query.status.map(|s| s.as_str()),
                sort_by: query.sort_by,
                sort_order: query.sort_order,
                max_results: remaining,
                next_token: next_token.as_deref(),
            };

            let output: ListModelPackagesOutput = self
                .call("ListModelPackages", &input)
                .await
                .map_err(|e| RegistryError {
                    code: e.code,
                    message: e.message,
                })?;

            packages.extend(
                output
                    .model_package_summary_list
                    .into_iter()
                    .map(|summary| summary.into_package(query.status)),
            );

            let satisfied = query.limit.is_some_and(|limit| {
                packages.len() >= usize::try_from(limit).unwrap_or(usize::MAX)
            });

            match output.next_token {
                Some(token) if !satisfied => next_token = Some(token),
                _ => break,
            }
        }

        if let Some(limit) = query.limit {
            packages.truncate(usize::try_from(limit).unwrap_or(usize::MAX));
        }

        Ok(packages)
    }
}

#[async_trait]
impl HostingService for SageMakerClient {
    async fn create_model(&self, request: &CreateModelRequest) -> Result<(), HostingError> {
        let input = CreateModelInput {
            model_name: &request.model_name,
            execution_role_arn: &request.execution_role_arn,
            containers: vec![ContainerDefinition {
                model_package_name: request.package_arn.as_str(),
            }],
        };

        self.provision("CreateModel", ResourceKind::Model, &input)
            .await
    }

    async fn create_endpoint_config(
        &self,
        request: &CreateEndpointConfigRequest,
    ) -> Result<(), HostingError> {
        let input = CreateEndpointConfigInput {
            endpoint_config_name: &request.config_name,
            production_variants: &request.variants,
        };

        self.provision("CreateEndpointConfig", ResourceKind::EndpointConfig, &input)
            .await
    }

    async fn create_endpoint(&self, name: &str, config_name: &str) -> Result<(), HostingError> {
        let input = EndpointInput {
            endpoint_name: name,
            endpoint_config_name: config_name,
        };

        self.provision("CreateEndpoint", ResourceKind::Endpoint, &input)
            .await
    }

    async fn update_endpoint(&self, name: &str, config_name: &str) -> Result<(), HostingError> {
        let input = EndpointInput {
            endpoint_name: name,
            endpoint_config_name: config_name,
        };

        self.provision("UpdateEndpoint", ResourceKind::Endpoint, &input)
            .await
    }
}

fn regional_host(region: &str) -> String {
    format!("api.sagemaker.{region}.amazonaws.com")
}
