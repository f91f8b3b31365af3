//! Global configuration model for podrunner.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::constants;
use crate::error::{PodRunnerError, Result};

const DOCKER_SCHEMES: [&str; 3] = ["unix://", "tcp://", "http://"];

/// Root configuration for the pod runner.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PodRunnerConfig {
    /// Path to the JSON status store.
    pub status_file: PathBuf,
    /// Docker Engine API endpoint (`unix:///path`, `tcp://host:port` or
    /// `http://host:port`). Unset means the platform's local default socket.
    pub docker_host: Option<String>,
    /// Consul agent endpoint (`http://host:port`).
    pub consul_addr: String,
    /// Prefix of canonical container names.
    pub name_prefix: String,
    /// Graceful-stop grace period applied on non-forced teardown.
    pub grace_period_secs: u64,
    /// Maximum characters of an error kept in a status message.
    pub message_limit: usize,
}

impl Default for PodRunnerConfig {
    fn default() -> Self {
        Self {
            status_file: constants::default_status_file(),
            docker_host: None,
            consul_addr: constants::DEFAULT_CONSUL_ADDR.to_string(),
            name_prefix: constants::DEFAULT_NAME_PREFIX.to_string(),
            grace_period_secs: constants::GRACEFUL_STOP_SECS,
            message_limit: constants::STATUS_MESSAGE_LIMIT,
        }
    }
}

impl PodRunnerConfig {
    /// Loads a configuration file. Missing keys take their defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, parsed, or holds
    /// invalid values.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| PodRunnerError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        let config: Self = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks values that would make the controller misbehave.
    ///
    /// # Errors
    ///
    /// Returns `PodRunnerError::Config` describing the first bad value.
    pub fn validate(&self) -> Result<()> {
        if self.name_prefix.is_empty() {
            return Err(PodRunnerError::Config {
                message: "name_prefix must not be empty".to_string(),
            });
        }
        if self.message_limit == 0 {
            return Err(PodRunnerError::Config {
                message: "message_limit must be positive".to_string(),
            });
        }
        if let Some(host) = &self.docker_host {
            if !DOCKER_SCHEMES.iter().any(|scheme| host.starts_with(scheme)) {
                return Err(PodRunnerError::Config {
                    message: format!(
                        "docker_host must start with one of {}, got '{host}'",
                        DOCKER_SCHEMES.join(", ")
                    ),
                });
            }
        }
        let url = &self.consul_addr;
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(PodRunnerError::Config {
                message: format!("consul_addr must be an http(s) URL, got '{url}'"),
            });
        }
        Ok(())
    }

    /// Grace period as a [`Duration`].
    #[must_use]
    pub const fn grace_period(&self) -> Duration {
        Duration::from_secs(self.grace_period_secs)
    }
}
