//! Docker Engine API backend built on `bollard`.
//!
//! Connects to the platform's local daemon socket unless an explicit
//! `unix://`, `tcp://` or `http://` endpoint is configured.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use bollard::container::{
    Config, CreateContainerOptions, ListContainersOptions, RemoveContainerOptions,
    StartContainerOptions, StopContainerOptions,
};
use bollard::errors::Error as DockerError;
use bollard::image::CreateImageOptions;
use bollard::models::{ContainerSummary, HostConfig, PortBinding};
use bollard::{API_DEFAULT_VERSION, Docker};
use futures::TryStreamExt;
use podrunner_common::error::{PodRunnerError, Result};
use podrunner_common::types::ContainerId;

use super::{ContainerInfo, PortMapping, RuntimeEngine};
use crate::translate::RuntimeConfig;

const CONNECT_TIMEOUT_SECS: u64 = 120;

/// Runtime engine backed by a Docker daemon.
#[derive(Debug, Clone)]
pub struct DockerEngine {
    docker: Docker,
}

impl From<ContainerSummary> for ContainerInfo {
    fn from(summary: ContainerSummary) -> Self {
        let name = summary
            .names
            .as_deref()
            .and_then(<[String]>::first)
            .map(|n| n.trim_start_matches('/').to_string())
            .unwrap_or_default();
        Self {
            id: ContainerId::new(summary.id.unwrap_or_default()),
            name,
            running: summary.state.as_deref() == Some("running"),
            ports: summary
                .ports
                .unwrap_or_default()
                .into_iter()
                .map(|p| PortMapping {
                    private: p.private_port,
                    public: p.public_port,
                })
                .collect(),
            labels: summary.labels.unwrap_or_default(),
        }
    }
}

impl DockerEngine {
    /// Creates a client for `host`, or for the local default socket when
    /// `host` is `None`. No request is made until first use.
    ///
    /// # Errors
    ///
    /// Returns `PodRunnerError::Config` if the endpoint cannot be used.
    pub fn connect(host: Option<&str>) -> Result<Self> {
        let docker = match host {
            None => Docker::connect_with_local_defaults(),
            Some(h) if h.starts_with("unix://") => {
                Docker::connect_with_socket(h, CONNECT_TIMEOUT_SECS, API_DEFAULT_VERSION)
            }
            Some(h) => Docker::connect_with_http(h, CONNECT_TIMEOUT_SECS, API_DEFAULT_VERSION),
        }
        .map_err(|e| PodRunnerError::Config {
            message: format!(
                "cannot use Docker endpoint {}: {e}",
                host.unwrap_or("(local default)")
            ),
        })?;
        tracing::debug!(host = host.unwrap_or("(local default)"), "docker client ready");
        Ok(Self { docker })
    }

    async fn list(&self, filter: &str, value: String) -> Result<Vec<ContainerInfo>> {
        let options = ListContainersOptions {
            all: true,
            filters: HashMap::from([(filter.to_string(), vec![value.clone()])]),
            ..Default::default()
        };
        let summaries = self
            .docker
            .list_containers(Some(options))
            .await
            .map_err(|e| runtime_error("list", &value, &e))?;
        Ok(summaries.into_iter().map(ContainerInfo::from).collect())
    }
}

#[async_trait]
impl RuntimeEngine for DockerEngine {
    async fn ensure_image(&self, image: &str) -> bool {
        tracing::debug!(image, "pulling image");
        let options = CreateImageOptions {
            from_image: image,
            ..Default::default()
        };
        // Pull failures arrive as errors inside the progress stream.
        match self
            .docker
            .create_image(Some(options), None, None)
            .try_collect::<Vec<_>>()
            .await
        {
            Ok(_) => true,
            Err(e) => {
                tracing::warn!(image, error = %e, "image pull failed");
                false
            }
        }
    }

    async fn find_by_name(&self, name: &str) -> Result<Option<ContainerInfo>> {
        let containers = self.list("name", format!("^/{name}$")).await?;
        Ok(containers.into_iter().find(|c| c.name == name))
    }

    async fn find_by_id(&self, id: &ContainerId) -> Result<Option<ContainerInfo>> {
        let containers = self.list("id", id.to_string()).await?;
        Ok(containers.into_iter().find(|c| c.id == *id))
    }

    async fn create(&self, config: &RuntimeConfig) -> Result<()> {
        tracing::debug!(name = %config.name, image = %config.image, "creating container");
        let options = CreateContainerOptions {
            name: config.name.clone(),
            platform: None,
        };
        let _ = self
            .docker
            .create_container(Some(options), container_config(config))
            .await
            .map_err(|e| runtime_error("create", &config.name, &e))?;
        Ok(())
    }

    async fn start(&self, id: &ContainerId) -> Result<()> {
        match self
            .docker
            .start_container(id.as_str(), None::<StartContainerOptions<String>>)
            .await
        {
            Ok(()) => Ok(()),
            Err(e) if status_code(&e) == Some(304) => Ok(()),
            Err(e) => Err(runtime_error("start", id.as_str(), &e)),
        }
    }

    async fn remove(&self, name: &str, grace: Duration) -> Result<()> {
        let t = i64::try_from(grace.as_secs()).unwrap_or(i64::MAX);
        match self
            .docker
            .stop_container(name, Some(StopContainerOptions { t }))
            .await
        {
            Ok(()) => {}
            Err(e) if status_code(&e) == Some(404) => {
                tracing::debug!(name, "container already gone");
                return Ok(());
            }
            Err(e) if status_code(&e) == Some(304) => {}
            Err(e) => return Err(runtime_error("stop", name, &e)),
        }

        let options = RemoveContainerOptions {
            force: true,
            ..Default::default()
        };
        match self.docker.remove_container(name, Some(options)).await {
            Ok(()) => {
                tracing::debug!(name, "container removed");
                Ok(())
            }
            Err(e) if status_code(&e) == Some(404) => Ok(()),
            Err(e) => Err(runtime_error("remove", name, &e)),
        }
    }
}

/// Builds the create request: every exposed port bound to an
/// engine-assigned host port.
fn container_config(config: &RuntimeConfig) -> Config<String> {
    let key = |port: &u16| format!("{port}/tcp");
    let exposed_ports = config
        .exposed_ports
        .iter()
        .map(|p| (key(p), HashMap::new()))
        .collect();
    let port_bindings = config
        .exposed_ports
        .iter()
        .map(|p| {
            let binding = PortBinding {
                host_ip: None,
                host_port: Some(String::new()),
            };
            (key(p), Some(vec![binding]))
        })
        .collect();

    Config {
        image: Some(config.image.clone()),
        env: Some(config.env.clone()),
        labels: Some(config.labels.clone().into_iter().collect()),
        exposed_ports: Some(exposed_ports),
        host_config: Some(HostConfig {
            port_bindings: Some(port_bindings),
            memory: config.memory_bytes.and_then(|m| i64::try_from(m).ok()),
            nano_cpus: config.nano_cpus,
            ..Default::default()
        }),
        ..Default::default()
    }
}

const fn status_code(e: &DockerError) -> Option<u16> {
    match e {
        DockerError::DockerResponseServerError { status_code, .. } => Some(*status_code),
        _ => None,
    }
}

fn runtime_error(operation: &'static str, target: &str, e: &DockerError) -> PodRunnerError {
    PodRunnerError::Runtime {
        operation,
        target: target.to_string(),
        message: e.to_string(),
    }
}
