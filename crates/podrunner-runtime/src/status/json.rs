//! Status store persisted as a single JSON document.
//!
//! The document maps pod names to their histories. It is loaded once by
//! [`StatusStore::ready`] and rewritten atomically (temp file + rename)
//! after every report. The cached copy only changes once the write landed.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use podrunner_common::error::{PodRunnerError, Result};
use podrunner_common::status::{PodStatus, StatusReport};
use tokio::sync::Mutex;

use super::StatusStore;

type Document = BTreeMap<String, PodStatus>;

/// File-backed status store.
#[derive(Debug)]
pub struct JsonStatusStore {
    path: PathBuf,
    pods: Mutex<Option<Document>>,
}

impl JsonStatusStore {
    /// Creates a store backed by `path`. Nothing is read until first use.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            pods: Mutex::new(None),
        }
    }

    /// Returns the backing file path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn load(&self) -> Result<Document> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(content) if content.trim().is_empty() => Ok(Document::new()),
            Ok(content) => Ok(serde_json::from_str(&content)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Document::new()),
            Err(e) => Err(PodRunnerError::Io {
                path: self.path.clone(),
                source: e,
            }),
        }
    }

    async fn persist(&self, pods: &Document) -> Result<()> {
        let io_err = |path: &Path, e| PodRunnerError::Io {
            path: path.to_path_buf(),
            source: e,
        };
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| io_err(parent, e))?;
        }
        let json = serde_json::to_string_pretty(pods)?;
        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, json)
            .await
            .map_err(|e| io_err(&tmp, e))?;
        tokio::fs::rename(&tmp, &self.path)
            .await
            .map_err(|e| io_err(&self.path, e))?;
        Ok(())
    }

    async fn loaded(&self) -> Result<tokio::sync::MutexGuard<'_, Option<Document>>> {
        let mut pods = self.pods.lock().await;
        if pods.is_none() {
            tracing::debug!(path = %self.path.display(), "loading status store");
            *pods = Some(self.load().await?);
        }
        Ok(pods)
    }
}

#[async_trait]
impl StatusStore for JsonStatusStore {
    async fn ready(&self) -> Result<()> {
        let _guard = self.loaded().await?;
        Ok(())
    }

    async fn get_latest(&self, pod: &str) -> Result<Option<PodStatus>> {
        let pods = self.loaded().await?;
        Ok(pods.as_ref().and_then(|p| p.get(pod).cloned()))
    }

    async fn report(&self, pod: &str, report: StatusReport) -> Result<()> {
        tracing::debug!(pod, status = %report, "status reported");
        let mut guard = self.loaded().await?;
        let mut pods = guard.clone().unwrap_or_default();
        pods.entry(pod.to_string()).or_default().record(report);
        self.persist(&pods).await?;
        *guard = Some(pods);
        Ok(())
    }
}
