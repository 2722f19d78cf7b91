//! Configuration for meridian-promote.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::Path;
use std::time::Duration;

use figment::providers::{Data, Env, Format, Toml};
use figment::Figment;
use serde::Deserialize;

use crate::error::{PromoteError, PromoteResult};

/// Prefix for environment variable overrides.
const ENV_PREFIX: &str = "MERIDIAN_";

/// Top-level configuration.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct PromoteConfig {
    /// Model registry configuration.
    #[serde(default)]
    pub registry: RegistryConfig,

    /// Hosting service configuration.
    #[serde(default)]
    pub hosting: HostingConfig,

    /// Pipeline behaviour configuration.
    #[serde(default)]
    pub pipeline: PipelineConfig,

    /// Trigger server configuration.
    #[serde(default)]
    pub server: ServerConfig,
}

impl PromoteConfig {
    /// Load configuration from the default sources.
    ///
    /// Configuration is loaded in the following order (later sources override earlier):
    /// 1. Default values
    /// 2. `meridian.toml` in the current directory (if present)
    /// 3. `MODEL_PACKAGE_GROUP_NAME`, `SAGEMAKER_REGION` and `SAGEMAKER_ROLE`
    /// 4. Environment variables with `MERIDIAN_` prefix
    pub fn load() -> PromoteResult<Self> {
        Self::extract(Toml::file("meridian.toml"))
    }

    /// Load configuration from a specific TOML file, which must exist.
    pub fn from_file(path: impl AsRef<Path>) -> PromoteResult<Self> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(PromoteError::config(format!(
                "config file not found: {}",
                path.display()
            )));
        }
        Self::extract(Toml::file(path))
    }

    fn extract(file: Data<Toml>) -> PromoteResult<Self> {
        Self::figment(Figment::new().merge(file))
            .extract()
            .map_err(|e| PromoteError::Config(e.to_string()))
    }

    fn figment(base: Figment) -> Figment {
        base.merge(legacy_env("MODEL_PACKAGE_GROUP_NAME", "registry.group_name"))
            .merge(legacy_env("SAGEMAKER_REGION", "registry.region"))
            .merge(legacy_env("SAGEMAKER_ROLE", "hosting.execution_role_arn"))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    /// Check that everything a deploy needs is present.
    pub fn validate_for_deploy(&self) -> PromoteResult<()> {
        if self.hosting.endpoint.as_deref().is_none_or(|e| e.trim().is_empty()) {
            return Err(PromoteError::config(
                "hosting.endpoint is required: requests go through a signing proxy",
            ));
        }
        if self.hosting.execution_role_arn.trim().is_empty() {
            return Err(PromoteError::config(
                "hosting.execution_role_arn is required to create models",
            ));
        }
        if self.hosting.initial_instance_count == 0 {
            return Err(PromoteError::config(
                "hosting.initial_instance_count must be at least 1",
            ));
        }
        Ok(())
    }
}

/// Read one unprefixed variable into a nested key.
fn legacy_env(var: &'static str, key: &'static str) -> Env {
    Env::raw().only(&[var]).map(move |_| key.into())
}

/// Model registry configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct RegistryConfig {
    /// Package group promoted when a trigger names none.
    #[serde(default = "default_group_name")]
    pub group_name: String,

    /// Region of the registry, when it differs from the hosting region.
    pub region: Option<String>,

    /// Signing proxy URL for registry calls; defaults to `hosting.endpoint`.
    pub endpoint: Option<String>,

    /// Request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_group_name() -> String {
    "MyModelGroup".to_owned()
}

const fn default_timeout_secs() -> u64 {
    30
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            group_name: default_group_name(),
            region: None,
            endpoint: None,
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// Hosting service configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct HostingConfig {
    /// Region of the hosting service.
    #[serde(default = "default_region")]
    pub region: String,

    /// Signing proxy (or emulator) URL for hosting calls. Required.
    pub endpoint: Option<String>,

    /// Role the hosting service assumes when running models.
    #[serde(default)]
    pub execution_role_arn: String,

    /// Instance class for the production variant.
    #[serde(default = "default_instance_type")]
    pub instance_type: String,

    /// Instances provisioned for the production variant.
    #[serde(default = "default_instance_count")]
    pub initial_instance_count: u32,

    /// Label of the production variant.
    #[serde(default = "default_variant_name")]
    pub variant_name: String,

    /// What to do when a model or endpoint configuration already exists.
    #[serde(default)]
    pub existing_resources: ExistingResourcePolicy,

    /// Request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_region() -> String {
    "us-east-1".to_owned()
}

fn default_instance_type() -> String {
    "ml.m5.large".to_owned()
}

const fn default_instance_count() -> u32 {
    1
}

fn default_variant_name() -> String {
    "AllTraffic".to_owned()
}

impl Default for HostingConfig {
    fn default() -> Self {
        Self {
            region: default_region(),
            endpoint: None,
            execution_role_arn: String::new(),
            instance_type: default_instance_type(),
            initial_instance_count: default_instance_count(),
            variant_name: default_variant_name(),
            existing_resources: ExistingResourcePolicy::default(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl HostingConfig {
    /// Region the registry lives in: its own override, or the hosting region.
    #[must_use]
    pub fn registry_region<'a>(&'a self, registry: &'a RegistryConfig) -> &'a str {
        registry.region.as_deref().unwrap_or(&self.region)
    }
}

/// Handling of a model or endpoint configuration that already exists.
///
/// Endpoints are unaffected: an existing endpoint is always updated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExistingResourcePolicy {
    /// Surface the hosting service's error unchanged.
    #[default]
    Fail,

    /// Treat the existing resource as the one this run would have created.
    Reuse,
}

/// Pipeline behaviour configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct PipelineConfig {
    /// End-to-end deadline for one run, in seconds.
    #[serde(default = "default_deadline_secs")]
    pub deadline_secs: u64,
}

const fn default_deadline_secs() -> u64 {
    1800 // 30 minutes
}

impl PipelineConfig {
    /// Deadline as a duration.
    #[must_use]
    pub const fn deadline(&self) -> Duration {
        Duration::from_secs(self.deadline_secs)
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            deadline_secs: default_deadline_secs(),
        }
    }
}

/// Trigger server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Address to listen on.
    #[serde(default = "default_listen")]
    pub listen: SocketAddr,
}

const fn default_listen() -> SocketAddr {
    SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), 8090)
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen: default_listen(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_workflow_values() {
        let config = PromoteConfig::default();
        assert_eq!(config.registry.group_name, "MyModelGroup");
        assert_eq!(config.hosting.instance_type, "ml.m5.large");
        assert_eq!(config.hosting.initial_instance_count, 1);
        assert_eq!(config.hosting.variant_name, "AllTraffic");
        assert_eq!(config.hosting.existing_resources, ExistingResourcePolicy::Fail);
        assert_eq!(config.pipeline.deadline(), Duration::from_secs(1800));
        assert_eq!(config.server.listen.port(), 8090);
    }

    #[test]
    fn config_from_toml() {
        let toml = r#"
            [registry]
            group_name = "fraud-detector"
            region = "eu-west-1"

            [hosting]
            region = "us-west-2"
            execution_role_arn = "arn:aws:iam::123456789012:role/exec"
            instance_type = "ml.c5.xlarge"
            existing_resources = "reuse"

            [pipeline]
            deadline_secs = 600
        "#;

        let config: PromoteConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.registry.group_name, "fraud-detector");
        assert_eq!(config.hosting.instance_type, "ml.c5.xlarge");
        assert_eq!(config.hosting.initial_instance_count, 1);
        assert_eq!(
            config.hosting.existing_resources,
            ExistingResourcePolicy::Reuse
        );
        assert_eq!(config.pipeline.deadline_secs, 600);
        assert_eq!(
            config.hosting.registry_region(&config.registry),
            "eu-west-1"
        );
    }

    #[test]
    fn registry_region_falls_back_to_hosting() {
        let config = PromoteConfig::default();
        assert_eq!(config.hosting.registry_region(&config.registry), "us-east-1");
    }

    #[test]
    fn environment_overrides() {
        figment::Jail::expect_with(|jail| {
            jail.create_file(
                "meridian.toml",
                r#"
                    [registry]
                    group_name = "from-file"
                "#,
            )?;
            jail.set_env("MODEL_PACKAGE_GROUP_NAME", "from-legacy-env");
            jail.set_env("SAGEMAKER_ROLE", "arn:aws:iam::1:role/legacy");
            jail.set_env("MERIDIAN_HOSTING__INSTANCE_TYPE", "ml.g5.xlarge");

            let config = PromoteConfig::load().map_err(|e| e.to_string())?;
            assert_eq!(config.registry.group_name, "from-legacy-env");
            assert_eq!(config.hosting.execution_role_arn, "arn:aws:iam::1:role/legacy");
            assert_eq!(config.hosting.instance_type, "ml.g5.xlarge");

            jail.set_env("MERIDIAN_REGISTRY__GROUP_NAME", "from-prefixed-env");
            let config = PromoteConfig::load().map_err(|e| e.to_string())?;
            assert_eq!(config.registry.group_name, "from-prefixed-env");
            Ok(())
        });
    }

    #[test]
    fn deploy_requires_execution_role() {
        let mut config = PromoteConfig::default();
        config.hosting.endpoint = Some("http://127.0.0.1:8080".to_owned());
        assert!(config.validate_for_deploy().is_err());

        config.hosting.execution_role_arn = "arn:aws:iam::1:role/exec".to_owned();
        assert!(config.validate_for_deploy().is_ok());

        config.hosting.initial_instance_count = 0;
        assert!(config.validate_for_deploy().is_err());
    }

    #[test]
    fn deploy_requires_endpoint() {
        let mut config = PromoteConfig::default();
        config.hosting.execution_role_arn = "arn:aws:iam::1:role/exec".to_owned();

        let err = config.validate_for_deploy().unwrap_err();
        assert!(err.to_string().contains("hosting.endpoint"));

        config.hosting.endpoint = Some("  ".to_owned());
        assert!(config.validate_for_deploy().is_err());

        config.hosting.endpoint = Some("http://127.0.0.1:8080".to_owned());
        assert!(config.validate_for_deploy().is_ok());
    }

    #[test]
    fn explicit_config_file_must_exist() {
        figment::Jail::expect_with(|_jail| {
            let err = PromoteConfig::from_file("missing.toml").unwrap_err();
            assert!(matches!(err, PromoteError::Config(_)));
            assert_eq!(
                err.to_string(),
                "configuration error: config file not found: missing.toml"
            );

            // The default file stays optional.
            let config = PromoteConfig::load().map_err(|e| e.to_string())?;
            assert_eq!(config.registry.group_name, "MyModelGroup");
            Ok(())
        });
    }

    #[test]
    fn explicit_config_file_is_read() {
        figment::Jail::expect_with(|jail| {
            jail.create_file(
                "prod.toml",
                r#"
                    [hosting]
                    endpoint = "http://127.0.0.1:8080"
                "#,
            )?;

            let config = PromoteConfig::from_file("prod.toml").map_err(|e| e.to_string())?;
            assert_eq!(config.hosting.endpoint.as_deref(), Some("http://127.0.0.1:8080"));
            Ok(())
        });
    }
}
