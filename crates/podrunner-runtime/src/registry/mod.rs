//! Service registry abstraction.

pub mod consul;
pub mod memory;

use async_trait::async_trait;
use podrunner_common::error::Result;
use serde::Serialize;

/// A registration request for one published port of a runtime instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ServiceRegistration {
    /// Runtime instance id. Used again to deregister.
    #[serde(rename = "ID")]
    pub id: String,
    /// Logical service name.
    pub name: String,
    /// Public (host) port the service is reachable on.
    pub port: u16,
    /// Free-form tags.
    pub tags: Vec<String>,
}

/// Directory mapping logical service names to live endpoints.
#[async_trait]
pub trait ServiceRegistry: Send + Sync {
    /// Registers (or re-registers) a service instance.
    ///
    /// # Errors
    ///
    /// Returns an error if the registry rejects or cannot receive the request.
    async fn register(&self, registration: &ServiceRegistration) -> Result<()>;

    /// Removes a service instance by id.
    ///
    /// # Errors
    ///
    /// Returns an error if the registry rejects or cannot receive the request.
    async fn deregister(&self, id: &str) -> Result<()>;
}
