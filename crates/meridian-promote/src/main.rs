//! Meridian promotion binary.
//!
//! Promotes the newest approved model package of a registry group into a
//! live endpoint, either once from the command line or on request over HTTP.

use std::io::Read as _;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::info;
use tracing_subscriber::EnvFilter;

use meridian_promote::{
    Deployer, DeploymentNames, Pipeline, PromoteConfig, PromoteService, Resolver, SageMakerClient,
};

#[derive(Parser)]
#[command(name = "meridian-promote")]
#[command(about = "Promote the newest approved model package to a live endpoint")]
#[command(version)]
struct Cli {
    /// Configuration file (defaults to meridian.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the names derived from the newest approved package
    Resolve {
        /// Package group (overrides registry.group_name)
        #[arg(short, long)]
        group: Option<String>,
    },

    /// Provision the resources named by a resolved record
    Deploy {
        /// File holding the record printed by `resolve`, or `-` for stdin
        #[arg(short, long, default_value = "-")]
        input: PathBuf,
    },

    /// Resolve and deploy in one run
    Run {
        /// Package group (overrides registry.group_name)
        #[arg(short, long)]
        group: Option<String>,
    },

    /// Serve the HTTP trigger API
    Serve,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(EnvFilter::from_default_env().add_directive(
            "meridian_promote=info"
                .parse()
                .unwrap_or_else(|_| tracing::Level::INFO.into()),
        ))
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        eprintln!("{e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Resolve { group } => {
            let group = group.unwrap_or_else(|| config.registry.group_name.clone());
            let names = resolver(&config)?.resolve(&group).await?;
            print_json(&names)
        }
        Commands::Deploy { input } => {
            let names = read_names(&input)?;
            let outcome = deployer(&config)?.deploy(&names).await?;
            print_json(&outcome)
        }
        Commands::Run { group } => {
            let group = group.unwrap_or_else(|| config.registry.group_name.clone());
            let report = pipeline(&config)?.run(&group).await?;
            print_json(&report)
        }
        Commands::Serve => {
            let pipeline = Arc::new(pipeline(&config)?);
            PromoteService::new(config, pipeline).run().await?;
            Ok(())
        }
    }
}

fn load_config(path: Option<&Path>) -> anyhow::Result<PromoteConfig> {
    let config = match path {
        Some(path) => PromoteConfig::from_file(path)?,
        None => PromoteConfig::load()?,
    };

    info!(
        group = %config.registry.group_name,
        region = %config.hosting.region,
        deadline_secs = config.pipeline.deadline_secs,
        "configuration loaded"
    );

    Ok(config)
}

fn resolver(config: &PromoteConfig) -> anyhow::Result<Resolver> {
    let client = SageMakerClient::for_registry(&config.registry, &config.hosting)?;
    Ok(Resolver::new(Arc::new(client)))
}

fn deployer(config: &PromoteConfig) -> anyhow::Result<Deployer> {
    config.validate_for_deploy()?;
    let client = SageMakerClient::for_hosting(&config.hosting)?;
    Ok(Deployer::from_config(Arc::new(client), &config.hosting))
}

fn pipeline(config: &PromoteConfig) -> anyhow::Result<Pipeline> {
    config.validate_for_deploy()?;
    let registry = SageMakerClient::for_registry(&config.registry, &config.hosting)?;
    let hosting = SageMakerClient::for_hosting(&config.hosting)?;
    Ok(Pipeline::from_config(
        config,
        Arc::new(registry),
        Arc::new(hosting),
    ))
}

fn read_names(input: &Path) -> anyhow::Result<DeploymentNames> {
    let mut raw = String::new();
    if input.as_os_str() == "-" {
        std::io::stdin()
            .read_to_string(&mut raw)
            .context("failed to read record from stdin")?;
    } else {
        raw = std::fs::read_to_string(input)
            .with_context(|| format!("failed to read {}", input.display()))?;
    }

    serde_json::from_str(&raw).context("invalid deployment record")
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
