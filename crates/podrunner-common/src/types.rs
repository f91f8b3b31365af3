//! Domain primitive types used across the podrunner workspace.

use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{PodRunnerError, Result};

/// Opaque identifier the container runtime assigns to a container instance.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ContainerId(String);

impl ContainerId {
    /// Creates a new container ID from a string value.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Generates a random container ID.
    #[must_use]
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().simple().to_string())
    }

    /// Returns the inner string representation.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ContainerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Declarative description of a pod: a named group of containers managed
/// as one unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PodSpec {
    /// Pod name, unique per host. Keys the status history.
    pub name: String,
    /// Containers in declaration order.
    #[serde(default)]
    pub containers: Vec<ContainerSpec>,
}

/// One container within a pod.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContainerSpec {
    /// Container name, unique within the pod.
    pub name: String,
    /// Image reference, e.g. `nginx:1.27`.
    pub image: String,
    /// Private container port mapped to the logical service it serves.
    #[serde(default)]
    pub http_ports: BTreeMap<u16, String>,
    /// Memory limit such as `256MiB` or `512m`. Empty means unlimited.
    #[serde(default)]
    pub mem_limit: String,
    /// CPU allotment in whole or fractional cores. Zero means unlimited.
    #[serde(default)]
    pub cpus: f64,
    /// Environment entries in `KEY=VALUE` form.
    #[serde(default)]
    pub env: Vec<String>,
}

impl PodSpec {
    /// Reads a pod descriptor from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed, or if the
    /// resulting spec does not pass [`PodSpec::validate`].
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| PodRunnerError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        let spec: Self = serde_json::from_str(&content)?;
        spec.validate()?;
        Ok(spec)
    }

    /// Checks the structural rules a controller relies on.
    ///
    /// # Errors
    ///
    /// Returns `PodRunnerError::InvalidSpec` for an empty pod name, an
    /// empty container name or image, duplicate container names, a
    /// memory limit that does not parse, or a negative or non-finite CPU
    /// quota.
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(self.invalid("pod name is empty"));
        }
        let mut seen = HashSet::new();
        for container in &self.containers {
            if container.name.trim().is_empty() {
                return Err(self.invalid("container name is empty"));
            }
            if container.image.trim().is_empty() {
                return Err(self.invalid(format!(
                    "container '{}' has no image",
                    container.name
                )));
            }
            if !seen.insert(container.name.as_str()) {
                return Err(self.invalid(format!(
                    "duplicate container name '{}'",
                    container.name
                )));
            }
            let _ = self.memory_limit(container)?;
            if !container.cpus.is_finite() || container.cpus < 0.0 {
                return Err(self.invalid(format!(
                    "container '{}' has invalid cpus {}",
                    container.name, container.cpus
                )));
            }
        }
        Ok(())
    }

    /// Looks up a container by its name within this pod.
    #[must_use]
    pub fn container(&self, name: &str) -> Option<&ContainerSpec> {
        self.containers.iter().find(|c| c.name == name)
    }

    /// Memory limit of `container` in bytes; `None` when none is declared.
    ///
    /// # Errors
    ///
    /// Returns `PodRunnerError::InvalidSpec` if `memLimit` is set but does
    /// not parse or does not fit in 64 bits.
    pub fn memory_limit(&self, container: &ContainerSpec) -> Result<Option<u64>> {
        if container.mem_limit.trim().is_empty() {
            return Ok(None);
        }
        parse_memory(&container.mem_limit).map(Some).ok_or_else(|| {
            self.invalid(format!(
                "container '{}' has invalid memLimit '{}'",
                container.name, container.mem_limit
            ))
        })
    }

    fn invalid(&self, message: impl Into<String>) -> PodRunnerError {
        PodRunnerError::InvalidSpec {
            pod: self.name.clone(),
            message: message.into(),
        }
    }
}

impl ContainerSpec {
    /// Returns the logical service declared for a private port.
    #[must_use]
    pub fn service_for_port(&self, private_port: u16) -> Option<&str> {
        self.http_ports.get(&private_port).map(String::as_str)
    }
}

/// Parses memory strings like "128MiB", "256MB", "512m", "1GiB" into bytes.
///
/// Returns `None` for empty or malformed input and for values that
/// overflow `u64`.
#[must_use]
pub fn parse_memory(s: &str) -> Option<u64> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    let (num_str, multiplier): (&str, u64) = if let Some(n) = s.strip_suffix("GiB") {
        (n, 1024 * 1024 * 1024)
    } else if let Some(n) = s.strip_suffix("GB") {
        (n, 1_000_000_000)
    } else if let Some(n) = s.strip_suffix("MiB") {
        (n, 1024 * 1024)
    } else if let Some(n) = s.strip_suffix("MB") {
        (n, 1_000_000)
    } else if let Some(n) = s.strip_suffix("KiB") {
        (n, 1024)
    } else if let Some(n) = s.strip_suffix("KB") {
        (n, 1000)
    } else if let Some(n) = s.strip_suffix(['g', 'G']) {
        (n, 1024 * 1024 * 1024)
    } else if let Some(n) = s.strip_suffix(['m', 'M']) {
        (n, 1024 * 1024)
    } else if let Some(n) = s.strip_suffix(['k', 'K']) {
        (n, 1024)
    } else {
        (s, 1)
    };
    num_str.trim().parse::<u64>().ok()?.checked_mul(multiplier)
}
