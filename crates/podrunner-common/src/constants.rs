//! System-wide constants and default paths.

use std::path::PathBuf;
use std::sync::OnceLock;

/// Default base directory for podrunner data when running as root.
pub const SYSTEM_DATA_DIR: &str = "/var/lib/podrunner";

/// Returns the data directory, preferring `$HOME/.podrunner` for non-root
/// environments, falling back to `/var/lib/podrunner`.
fn resolve_data_dir() -> PathBuf {
    if let Ok(home) = std::env::var("HOME").or_else(|_| std::env::var("USERPROFILE")) {
        let user_dir = PathBuf::from(home).join(".podrunner");
        if std::fs::create_dir_all(&user_dir).is_ok() {
            return user_dir;
        }
    }
    PathBuf::from(SYSTEM_DATA_DIR)
}

static DATA_DIR: OnceLock<PathBuf> = OnceLock::new();

/// Returns the resolved data directory for this session.
pub fn data_dir() -> &'static PathBuf {
    DATA_DIR.get_or_init(resolve_data_dir)
}

/// Returns the default status store path.
pub fn default_status_file() -> PathBuf {
    data_dir().join("pod-status.json")
}

/// Default Consul agent endpoint.
pub const DEFAULT_CONSUL_ADDR: &str = "http://127.0.0.1:8500";

/// Prefix of every canonical container name.
pub const DEFAULT_NAME_PREFIX: &str = "podrunner";

/// Seconds a container gets to exit on its own during a graceful removal.
pub const GRACEFUL_STOP_SECS: u64 = 30;

/// Maximum number of characters kept in a published status message.
pub const STATUS_MESSAGE_LIMIT: usize = 500;

/// Maximum number of entries kept in a pod's status history.
pub const MAX_STATUS_HISTORY: usize = 64;

/// Label carrying the owning pod name on every runtime container.
pub const LABEL_POD_NAME: &str = "org.podrunner.pod.name";

/// Label carrying the container-spec name on every runtime container.
pub const LABEL_CONTAINER_NAME: &str = "org.podrunner.container.name";

/// Status reason tokens published by the lifecycle controller.
pub mod reason {
    /// Image pull verification is in progress.
    pub const PULLING_CONTAINERS: &str = "PullingContainers";
    /// An image could not be pulled.
    pub const CONTAINER_FAILED_PULLING: &str = "ContainerFailedPulling";
    /// Containers are being created and started.
    pub const STARTING_CONTAINERS: &str = "StartingContainers";
    /// Container creation or start failed.
    pub const CONTAINER_FAILED_STARTING: &str = "ContainerFailedStarting";
    /// Every container is running.
    pub const STARTED: &str = "Started";
    /// Containers run but at least one service could not be registered.
    pub const SERVICE_REGISTRATION_FAILED: &str = "ServiceRegistrationFailed";
    /// Containers were removed and services deregistered.
    pub const REMOVED_OK: &str = "RemovedOk";
}
