//! CLI command definitions and dispatch.

pub mod plan;
pub mod run;
pub mod status;

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use podrunner_common::config::PodRunnerConfig;

/// podctl — single-host pod lifecycle controller.
#[derive(Parser, Debug)]
#[command(name = "podctl", version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Command,

    /// Path to a JSON configuration file.
    #[arg(long, global = true, env = "PODRUNNER_CONFIG")]
    pub config: Option<PathBuf>,

    /// Path to the JSON status store.
    #[arg(long, global = true, env = "PODRUNNER_STATUS_FILE")]
    pub status_file: Option<PathBuf>,

    /// Docker Engine API endpoint (`unix://`, `tcp://` or `http://`).
    /// Defaults to the local daemon socket.
    #[arg(long, global = true, env = "PODRUNNER_DOCKER_HOST")]
    pub docker_host: Option<String>,

    /// Consul agent endpoint.
    #[arg(long, global = true, env = "PODRUNNER_CONSUL_ADDR")]
    pub consul_addr: Option<String>,

    /// Log output format.
    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,
}

/// Log line format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    /// Human-readable lines.
    Text,
    /// One JSON object per line.
    Json,
}

/// Available CLI subcommands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Start a pod and keep it running until Ctrl+C.
    Run(run::RunArgs),
    /// Show the runtime configuration a pod would get, without touching anything.
    Plan(plan::PlanArgs),
    /// Show the recorded status history of a pod.
    Status(status::StatusArgs),
}

impl Cli {
    /// Loads the configuration file, if any, and applies flag overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be loaded or the merged values
    /// are invalid.
    pub fn resolve_config(&self) -> anyhow::Result<PodRunnerConfig> {
        let mut config = match &self.config {
            Some(path) => PodRunnerConfig::load(path)?,
            None => PodRunnerConfig::default(),
        };
        if let Some(path) = &self.status_file {
            config.status_file.clone_from(path);
        }
        if let Some(host) = &self.docker_host {
            config.docker_host = Some(host.clone());
        }
        if let Some(addr) = &self.consul_addr {
            config.consul_addr.clone_from(addr);
        }
        config.validate()?;
        tracing::debug!(?config, "configuration resolved");
        Ok(config)
    }
}

/// Dispatches the parsed CLI command to its handler.
///
/// # Errors
///
/// Returns an error if the command execution fails.
pub async fn execute(cli: Cli) -> anyhow::Result<()> {
    let config = cli.resolve_config()?;
    match cli.command {
        Command::Run(args) => run::execute(args, &config).await,
        Command::Plan(args) => plan::execute(&args, &config),
        Command::Status(args) => status::execute(&args, &config).await,
    }
}
