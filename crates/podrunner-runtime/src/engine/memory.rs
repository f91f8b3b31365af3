//! In-process simulated runtime.
//!
//! Keeps containers in memory, assigns host ports from 32768 upwards and
//! journals every call. Failures can be injected per image or per
//! container name. Backs `podctl run --local` and the controller tests.

use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use podrunner_common::error::{PodRunnerError, Result};
use podrunner_common::types::ContainerId;

use super::{ContainerInfo, PortMapping, RuntimeEngine};
use crate::translate::RuntimeConfig;

const FIRST_PUBLIC_PORT: u16 = 32768;

/// One recorded call against a [`MemoryEngine`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineCall {
    /// `ensure_image(image)`
    EnsureImage(String),
    /// `find_by_name(name)`
    FindByName(String),
    /// `find_by_id(id)`
    FindById(ContainerId),
    /// `create(config)` with the config's name.
    Create(String),
    /// `start(id)`
    Start(ContainerId),
    /// `remove(name, grace)`
    Remove {
        /// Container name.
        name: String,
        /// Requested grace period.
        grace: Duration,
    },
}

#[derive(Debug, Default)]
struct Faults {
    missing_images: HashSet<String>,
    pull_delays: HashMap<String, Duration>,
    create_delays: HashMap<String, Duration>,
    failing_creates: HashSet<String>,
    failing_starts: HashSet<String>,
    failing_removes: HashSet<String>,
}

#[derive(Debug)]
struct State {
    containers: HashMap<String, ContainerInfo>,
    next_port: u16,
    journal: Vec<EngineCall>,
}

/// Simulated container runtime.
#[derive(Debug)]
pub struct MemoryEngine {
    faults: Faults,
    state: Mutex<State>,
}

impl Default for MemoryEngine {
    fn default() -> Self {
        Self {
            faults: Faults::default(),
            state: Mutex::new(State {
                containers: HashMap::new(),
                next_port: FIRST_PUBLIC_PORT,
                journal: Vec::new(),
            }),
        }
    }
}

impl MemoryEngine {
    /// Creates an engine with no containers and no injected faults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes `ensure_image` report `image` as unobtainable.
    #[must_use]
    pub fn with_missing_image(mut self, image: impl Into<String>) -> Self {
        let _ = self.faults.missing_images.insert(image.into());
        self
    }

    /// Delays `ensure_image` for `image`.
    #[must_use]
    pub fn with_pull_delay(mut self, image: impl Into<String>, delay: Duration) -> Self {
        let _ = self.faults.pull_delays.insert(image.into(), delay);
        self
    }

    /// Delays `create` for the container named `name`.
    #[must_use]
    pub fn with_create_delay(mut self, name: impl Into<String>, delay: Duration) -> Self {
        let _ = self.faults.create_delays.insert(name.into(), delay);
        self
    }

    /// Makes `create` fail for the container named `name`.
    #[must_use]
    pub fn with_failing_create(mut self, name: impl Into<String>) -> Self {
        let _ = self.faults.failing_creates.insert(name.into());
        self
    }

    /// Makes `start` fail for the container named `name`.
    #[must_use]
    pub fn with_failing_start(mut self, name: impl Into<String>) -> Self {
        let _ = self.faults.failing_starts.insert(name.into());
        self
    }

    /// Makes `remove` fail for the container named `name`.
    #[must_use]
    pub fn with_failing_remove(mut self, name: impl Into<String>) -> Self {
        let _ = self.faults.failing_removes.insert(name.into());
        self
    }

    /// Seeds a container as if an earlier process had created it.
    pub fn insert_existing(&self, config: &RuntimeConfig, running: bool) -> ContainerId {
        let mut state = self.lock();
        let info = state.build(config, running);
        let id = info.id.clone();
        let _ = state.containers.insert(config.name.clone(), info);
        id
    }

    /// Returns every call made so far, in order.
    pub fn calls(&self) -> Vec<EngineCall> {
        self.lock().journal.clone()
    }

    /// Counts recorded calls matching `predicate`.
    pub fn count(&self, predicate: impl Fn(&EngineCall) -> bool) -> usize {
        self.lock().journal.iter().filter(|c| predicate(c)).count()
    }

    /// Returns the current snapshot of a container.
    pub fn container(&self, name: &str) -> Option<ContainerInfo> {
        self.lock().containers.get(name).cloned()
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn record(&self, call: EngineCall) -> MutexGuard<'_, State> {
        let mut state = self.lock();
        state.journal.push(call);
        state
    }
}

impl State {
    fn build(&mut self, config: &RuntimeConfig, running: bool) -> ContainerInfo {
        let ports = config
            .exposed_ports
            .iter()
            .map(|&private| PortMapping {
                private,
                public: running.then(|| self.allocate_port()),
            })
            .collect();
        ContainerInfo {
            id: ContainerId::generate(),
            name: config.name.clone(),
            running,
            ports,
            labels: config.labels.clone().into_iter().collect(),
        }
    }

    fn allocate_port(&mut self) -> u16 {
        let port = self.next_port;
        self.next_port = self.next_port.wrapping_add(1).max(FIRST_PUBLIC_PORT);
        port
    }
}

#[async_trait]
impl RuntimeEngine for MemoryEngine {
    async fn ensure_image(&self, image: &str) -> bool {
        drop(self.record(EngineCall::EnsureImage(image.to_string())));
        if let Some(delay) = self.faults.pull_delays.get(image) {
            tokio::time::sleep(*delay).await;
        }
        let ok = !self.faults.missing_images.contains(image);
        if !ok {
            tracing::warn!(image, "simulated pull failure");
        }
        ok
    }

    async fn find_by_name(&self, name: &str) -> Result<Option<ContainerInfo>> {
        let state = self.record(EngineCall::FindByName(name.to_string()));
        Ok(state.containers.get(name).cloned())
    }

    async fn find_by_id(&self, id: &ContainerId) -> Result<Option<ContainerInfo>> {
        let state = self.record(EngineCall::FindById(id.clone()));
        Ok(state.containers.values().find(|c| c.id == *id).cloned())
    }

    async fn create(&self, config: &RuntimeConfig) -> Result<()> {
        drop(self.record(EngineCall::Create(config.name.clone())));
        if let Some(delay) = self.faults.create_delays.get(&config.name) {
            tokio::time::sleep(*delay).await;
        }
        let mut state = self.lock();
        if self.faults.failing_creates.contains(&config.name) {
            return Err(PodRunnerError::Runtime {
                operation: "create",
                target: config.name.clone(),
                message: "simulated create failure".to_string(),
            });
        }
        if state.containers.contains_key(&config.name) {
            return Err(PodRunnerError::Runtime {
                operation: "create",
                target: config.name.clone(),
                message: "name already in use".to_string(),
            });
        }
        let info = state.build(config, false);
        let _ = state.containers.insert(config.name.clone(), info);
        Ok(())
    }

    async fn start(&self, id: &ContainerId) -> Result<()> {
        let mut state = self.record(EngineCall::Start(id.clone()));
        let Some(name) = state
            .containers
            .values()
            .find(|c| c.id == *id)
            .map(|c| c.name.clone())
        else {
            return Err(PodRunnerError::NotFound {
                kind: "container",
                id: id.to_string(),
            });
        };
        if self.faults.failing_starts.contains(&name) {
            return Err(PodRunnerError::Runtime {
                operation: "start",
                target: name,
                message: "simulated start failure".to_string(),
            });
        }
        let mut info = state.containers.remove(&name).unwrap_or_else(|| ContainerInfo {
            id: id.clone(),
            name: name.clone(),
            running: false,
            ports: Vec::new(),
            labels: HashMap::new(),
        });
        if !info.running {
            info.running = true;
            for port in &mut info.ports {
                port.public = Some(state.allocate_port());
            }
        }
        let _ = state.containers.insert(name, info);
        Ok(())
    }

    async fn remove(&self, name: &str, grace: Duration) -> Result<()> {
        let mut state = self.record(EngineCall::Remove {
            name: name.to_string(),
            grace,
        });
        if self.faults.failing_removes.contains(name) {
            return Err(PodRunnerError::Runtime {
                operation: "remove",
                target: name.to_string(),
                message: "simulated remove failure".to_string(),
            });
        }
        let _ = state.containers.remove(name);
        Ok(())
    }
}
