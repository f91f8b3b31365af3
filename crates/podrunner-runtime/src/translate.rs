//! Translation from a pod descriptor to canonical runtime configuration.

use std::collections::BTreeMap;

use podrunner_common::constants::{DEFAULT_NAME_PREFIX, LABEL_CONTAINER_NAME, LABEL_POD_NAME};
use podrunner_common::error::Result;
use podrunner_common::types::{ContainerSpec, PodSpec};
use serde::Serialize;

/// Everything the runtime needs to create one container.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RuntimeConfig {
    /// Canonical container name, stable across process restarts.
    pub name: String,
    /// Image reference.
    pub image: String,
    /// Environment entries in `KEY=VALUE` form.
    pub env: Vec<String>,
    /// Labels identifying the owning pod and container spec.
    pub labels: BTreeMap<String, String>,
    /// Private ports to publish on engine-assigned host ports.
    pub exposed_ports: Vec<u16>,
    /// Memory limit in bytes.
    pub memory_bytes: Option<u64>,
    /// CPU quota in units of 10^-9 CPUs.
    pub nano_cpus: Option<i64>,
}

/// Deterministic pod → runtime configuration mapper.
#[derive(Debug, Clone)]
pub struct ConfigTranslator {
    name_prefix: String,
}

impl ConfigTranslator {
    /// Creates a translator producing names under `name_prefix`.
    #[must_use]
    pub fn new(name_prefix: impl Into<String>) -> Self {
        Self {
            name_prefix: name_prefix.into(),
        }
    }

    /// Returns the canonical runtime name for a container of a pod.
    #[must_use]
    pub fn canonical_name(&self, pod: &PodSpec, container: &ContainerSpec) -> String {
        format!("{}-{}-{}", self.name_prefix, pod.name, container.name)
    }

    /// Maps one container of a pod to its runtime configuration.
    ///
    /// # Errors
    ///
    /// Returns `PodRunnerError::InvalidSpec` if the container's memory
    /// limit is set but invalid.
    pub fn translate(&self, pod: &PodSpec, container: &ContainerSpec) -> Result<RuntimeConfig> {
        let mut labels = BTreeMap::new();
        let _ = labels.insert(LABEL_POD_NAME.to_string(), pod.name.clone());
        let _ = labels.insert(LABEL_CONTAINER_NAME.to_string(), container.name.clone());

        Ok(RuntimeConfig {
            name: self.canonical_name(pod, container),
            image: container.image.clone(),
            env: container.env.clone(),
            labels,
            exposed_ports: container.http_ports.keys().copied().collect(),
            memory_bytes: pod.memory_limit(container)?,
            nano_cpus: nano_cpus(container.cpus),
        })
    }
}

impl Default for ConfigTranslator {
    fn default() -> Self {
        Self::new(DEFAULT_NAME_PREFIX)
    }
}

#[allow(clippy::cast_possible_truncation)]
fn nano_cpus(cpus: f64) -> Option<i64> {
    (cpus.is_finite() && cpus > 0.0).then(|| (cpus * 1e9).round() as i64)
}
