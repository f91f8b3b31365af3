//! Observable pod status and its history.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::constants::MAX_STATUS_HISTORY;

/// High-level phase a pod reports to the status store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PodPhase {
    /// Containers are being pulled, created or started.
    Pending,
    /// Every container is running.
    Running,
    /// The pod failed permanently and must not be restarted automatically.
    Failed,
    /// Containers were removed.
    Removed,
}

impl fmt::Display for PodPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pending => write!(f, "Pending"),
            Self::Running => write!(f, "Running"),
            Self::Failed => write!(f, "Failed"),
            Self::Removed => write!(f, "Removed"),
        }
    }
}

/// A status publication: what the controller hands to the status store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusReport {
    /// Reported phase.
    pub status: PodPhase,
    /// Short machine-readable reason token.
    pub reason: String,
    /// Human-readable detail, possibly empty.
    pub message: String,
}

impl StatusReport {
    /// Creates a report with an empty message.
    #[must_use]
    pub fn new(status: PodPhase, reason: &str) -> Self {
        Self {
            status,
            reason: reason.to_string(),
            message: String::new(),
        }
    }

    /// Attaches a message, truncated to `limit` characters.
    #[must_use]
    pub fn with_message(mut self, message: &str, limit: usize) -> Self {
        self.message = truncate_message(message, limit);
        self
    }
}

impl fmt::Display for StatusReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.message.is_empty() {
            write!(f, "{}/{}", self.status, self.reason)
        } else {
            write!(f, "{}/{}: {}", self.status, self.reason, self.message)
        }
    }
}

/// A recorded status publication.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusEntry {
    /// The published report.
    #[serde(flatten)]
    pub report: StatusReport,
    /// When the store recorded it.
    pub reported_at: DateTime<Utc>,
}

/// Status history of one pod, most recent entry first.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PodStatus {
    /// Recorded entries, newest at index 0.
    pub history: Vec<StatusEntry>,
}

impl PodStatus {
    /// Returns the most recent entry, if any.
    #[must_use]
    pub fn latest(&self) -> Option<&StatusEntry> {
        self.history.first()
    }

    /// Returns whether the most recent entry is `Failed`.
    #[must_use]
    pub fn is_failed(&self) -> bool {
        self.latest()
            .is_some_and(|e| e.report.status == PodPhase::Failed)
    }

    /// Prepends a report stamped with the current time, dropping the oldest
    /// entries beyond [`MAX_STATUS_HISTORY`].
    pub fn record(&mut self, report: StatusReport) {
        self.history.insert(
            0,
            StatusEntry {
                report,
                reported_at: Utc::now(),
            },
        );
        self.history.truncate(MAX_STATUS_HISTORY);
    }

    /// Iterates the reports oldest first.
    pub fn chronological(&self) -> impl Iterator<Item = &StatusReport> {
        self.history.iter().rev().map(|e| &e.report)
    }
}

/// Truncates `message` to at most `limit` characters on a char boundary.
#[must_use]
pub fn truncate_message(message: &str, limit: usize) -> String {
    match message.char_indices().nth(limit) {
        Some((idx, _)) => message[..idx].to_string(),
        None => message.to_string(),
    }
}
