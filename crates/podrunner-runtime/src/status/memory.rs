//! Volatile status store.

use std::collections::HashMap;

use async_trait::async_trait;
use podrunner_common::error::Result;
use podrunner_common::status::{PodStatus, StatusReport};
use tokio::sync::RwLock;

use super::StatusStore;

/// Status store that lives only as long as the process.
#[derive(Debug, Default)]
pub struct MemoryStatusStore {
    pods: RwLock<HashMap<String, PodStatus>>,
}

impl MemoryStatusStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds a pod's history with `reports`, oldest first.
    pub async fn seed(&self, pod: &str, reports: impl IntoIterator<Item = StatusReport>) {
        let mut pods = self.pods.write().await;
        let status = pods.entry(pod.to_string()).or_default();
        for report in reports {
            status.record(report);
        }
    }
}

#[async_trait]
impl StatusStore for MemoryStatusStore {
    async fn ready(&self) -> Result<()> {
        Ok(())
    }

    async fn get_latest(&self, pod: &str) -> Result<Option<PodStatus>> {
        Ok(self.pods.read().await.get(pod).cloned())
    }

    async fn report(&self, pod: &str, report: StatusReport) -> Result<()> {
        tracing::debug!(pod, status = %report, "status reported");
        self.pods
            .write()
            .await
            .entry(pod.to_string())
            .or_default()
            .record(report);
        Ok(())
    }
}
