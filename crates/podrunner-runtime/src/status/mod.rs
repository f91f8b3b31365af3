//! Per-pod status history store.
//!
//! The store is the durable record of every pod's outcome. It is shared
//! process-wide and keyed by pod name; implementations must tolerate
//! concurrent use by controllers of different pods.

pub mod json;
pub mod memory;

use async_trait::async_trait;
use podrunner_common::error::Result;
use podrunner_common::status::{PodStatus, StatusReport};

/// Append-only status history keyed by pod name.
#[async_trait]
pub trait StatusStore: Send + Sync {
    /// Waits until the store can serve reads.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing storage cannot be loaded.
    async fn ready(&self) -> Result<()>;

    /// Returns the status history of `pod`, or `None` if it never reported.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing storage cannot be read.
    async fn get_latest(&self, pod: &str) -> Result<Option<PodStatus>>;

    /// Prepends `report` to the history of `pod`.
    ///
    /// # Errors
    ///
    /// Returns an error if the report cannot be persisted.
    async fn report(&self, pod: &str, report: StatusReport) -> Result<()>;
}
