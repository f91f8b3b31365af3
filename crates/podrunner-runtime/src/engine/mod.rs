//! Container runtime abstraction.
//!
//! The lifecycle controller drives containers exclusively through
//! [`RuntimeEngine`]. Two implementations ship with the crate:
//! [`docker::DockerEngine`] talks to a Docker daemon through `bollard` and
//! [`memory::MemoryEngine`] simulates a runtime in-process.

pub mod docker;
pub mod memory;

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use podrunner_common::constants::LABEL_CONTAINER_NAME;
use podrunner_common::error::Result;
use podrunner_common::types::ContainerId;

use crate::translate::RuntimeConfig;

/// A published port of a container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PortMapping {
    /// Port inside the container.
    pub private: u16,
    /// Host port the runtime assigned, if published.
    pub public: Option<u16>,
}

/// Snapshot of a container as the runtime reports it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerInfo {
    /// Runtime-assigned id.
    pub id: ContainerId,
    /// Resolved container name.
    pub name: String,
    /// Whether the container is running right now.
    pub running: bool,
    /// Exposed port pairs.
    pub ports: Vec<PortMapping>,
    /// Labels attached at creation.
    pub labels: HashMap<String, String>,
}

impl ContainerInfo {
    /// Returns the owning container-spec name from the container's labels.
    #[must_use]
    pub fn spec_name(&self) -> Option<&str> {
        self.labels.get(LABEL_CONTAINER_NAME).map(String::as_str)
    }

    /// Iterates `(public, private)` pairs that have a public port assigned.
    pub fn published_ports(&self) -> impl Iterator<Item = (u16, u16)> + '_ {
        self.ports
            .iter()
            .filter_map(|p| p.public.map(|public| (public, p.private)))
    }
}

/// Platform-agnostic container runtime.
///
/// Implementors must be safe to share between controllers of different
/// pods. No locking contract is assumed; callers avoid conflicts by
/// addressing containers through disjoint canonical names.
#[async_trait]
pub trait RuntimeEngine: Send + Sync {
    /// Makes sure `image` is available locally, pulling it if needed.
    ///
    /// Returns `false` when the image could not be obtained. Failures are
    /// logged by the implementation, never returned.
    async fn ensure_image(&self, image: &str) -> bool;

    /// Looks up a container by its exact name.
    ///
    /// # Errors
    ///
    /// Returns an error if the runtime cannot be queried.
    async fn find_by_name(&self, name: &str) -> Result<Option<ContainerInfo>>;

    /// Looks up a container by its runtime id.
    ///
    /// # Errors
    ///
    /// Returns an error if the runtime cannot be queried.
    async fn find_by_id(&self, id: &ContainerId) -> Result<Option<ContainerInfo>>;

    /// Creates a container from the given configuration without starting it.
    ///
    /// # Errors
    ///
    /// Returns an error if the container cannot be created.
    async fn create(&self, config: &RuntimeConfig) -> Result<()>;

    /// Starts a created container.
    ///
    /// # Errors
    ///
    /// Returns an error if the container cannot be started.
    async fn start(&self, id: &ContainerId) -> Result<()>;

    /// Stops a container, allowing it `grace` to exit, then removes it.
    /// Removing a container that does not exist succeeds.
    ///
    /// # Errors
    ///
    /// Returns an error if the container exists but cannot be removed.
    async fn remove(&self, name: &str, grace: Duration) -> Result<()>;
}
