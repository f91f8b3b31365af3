//! Consul agent HTTP API backend.

use async_trait::async_trait;
use podrunner_common::error::{PodRunnerError, Result};

use super::{ServiceRegistration, ServiceRegistry};

/// Service registry backed by a local Consul agent.
#[derive(Debug, Clone)]
pub struct ConsulRegistry {
    client: reqwest::Client,
    base_url: String,
}

impl ConsulRegistry {
    /// Creates a registry client for the agent at `base_url` (e.g. `http://127.0.0.1:8500`).
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    async fn put(
        &self,
        operation: &'static str,
        id: &str,
        request: reqwest::RequestBuilder,
    ) -> Result<()> {
        let err = |message: String| PodRunnerError::Registry {
            operation,
            id: id.to_string(),
            message,
        };
        let response = request.send().await.map_err(|e| err(e.to_string()))?;
        let status = response.status();
        if status.is_success() {
            return Ok(());
        }
        let body = response.text().await.unwrap_or_default();
        Err(err(format!("{status}: {}", body.trim())))
    }
}

#[async_trait]
impl ServiceRegistry for ConsulRegistry {
    async fn register(&self, registration: &ServiceRegistration) -> Result<()> {
        tracing::debug!(
            id = %registration.id,
            service = %registration.name,
            port = registration.port,
            "registering service"
        );
        let request = self
            .client
            .put(format!("{}/v1/agent/service/register", self.base_url))
            .json(registration);
        self.put("register", &registration.id, request).await
    }

    async fn deregister(&self, id: &str) -> Result<()> {
        tracing::debug!(id, "deregistering service");
        let request = self
            .client
            .put(format!("{}/v1/agent/service/deregister/{id}", self.base_url));
        self.put("deregister", id, request).await
    }
}
