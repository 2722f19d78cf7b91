//! End-to-end promotion runs.
//!
//! A run is a strict sequence: resolve, then model, then endpoint
//! configuration, then endpoint. Nothing runs concurrently and nothing is
//! persisted between runs; a re-run rediscovers where it stands by asking the
//! hosting service. The whole run is bounded by one deadline.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tracing::{error, info, Instrument};

use crate::config::PromoteConfig;
use crate::deployer::Deployer;
use crate::error::{PromoteError, PromoteResult};
use crate::hosting::HostingService;
use crate::registry::ModelRegistry;
use crate::resolver::Resolver;
use crate::types::{DeploymentNames, DeploymentOutcome, EndpointHandle, Stage};

/// Summary of a successful run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PipelineReport {
    /// Package group that was promoted.
    pub group: String,
    /// Resolved package and derived names.
    pub resolved: DeploymentNames,
    /// Endpoint serving the package.
    pub endpoint: EndpointHandle,
}

impl PipelineReport {
    /// The result handed back to the caller.
    #[must_use]
    pub fn outcome(&self) -> DeploymentOutcome {
        DeploymentOutcome {
            endpoint_name: self.endpoint.name.clone(),
        }
    }
}

/// Failure tagged with the stage it happened in; `None` when the deadline hit.
type StageResult<T> = Result<T, (Option<Stage>, PromoteError)>;

/// Resolver and deployer composed under one deadline.
pub struct Pipeline {
    resolver: Resolver,
    deployer: Deployer,
    deadline: Duration,
}

impl Pipeline {
    /// Create a pipeline from its two components.
    pub fn new(resolver: Resolver, deployer: Deployer, deadline: Duration) -> Self {
        Self {
            resolver,
            deployer,
            deadline,
        }
    }

    /// Create a pipeline from configuration and backend handles.
    pub fn from_config(
        config: &PromoteConfig,
        registry: Arc<dyn ModelRegistry>,
        hosting: Arc<dyn HostingService>,
    ) -> Self {
        Self::new(
            Resolver::new(registry),
            Deployer::from_config(hosting, &config.hosting),
            config.pipeline.deadline(),
        )
    }

    /// Promote the newest approved package in `group`.
    ///
    /// A stage that fails aborts the run. Calls already issued are not
    /// cancelled by the deadline on the service side; only this run stops
    /// waiting for them.
    pub async fn run(&self, group: &str) -> PromoteResult<PipelineReport> {
        let span = tracing::info_span!("promotion", group);

        let result = tokio::time::timeout(self.deadline, self.execute(group))
            .instrument(span)
            .await
            .unwrap_or_else(|_| {
                Err((
                    None,
                    PromoteError::DeadlineExceeded {
                        secs: whole_secs(self.deadline),
                    },
                ))
            });

        match result {
            Ok(report) => {
                info!(
                    group,
                    endpoint_name = %report.endpoint.name,
                    action = %report.endpoint.action,
                    "promotion completed"
                );
                Ok(report)
            }
            Err((stage, e)) => {
                let stage = stage.map_or("deadline", |s| s.as_str());
                error!(group, stage, error = %e, "promotion failed");
                Err(e)
            }
        }
    }

    async fn execute(&self, group: &str) -> StageResult<PipelineReport> {
        let resolved = self
            .resolver
            .resolve(group)
            .await
            .map_err(|e| (Some(Stage::Resolve), e))?;

        let endpoint = self
            .deployer
            .provision(&resolved)
            .await
            .map_err(|(stage, e)| (Some(stage), e))?;

        Ok(PipelineReport {
            group: group.to_owned(),
            resolved,
            endpoint,
        })
    }
}

/// Deadline in whole seconds, rounded up.
fn whole_secs(deadline: Duration) -> u64 {
    deadline.as_secs() + u64::from(deadline.subsec_nanos() > 0)
}

impl fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pipeline")
            .field("deployer", &self.deployer)
            .field("deadline", &self.deadline)
            .finish_non_exhaustive()
    }
}
