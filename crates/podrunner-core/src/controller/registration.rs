//! Service registration for newly started containers.

use std::sync::Arc;

use podrunner_common::error::Result;
use podrunner_runtime::engine::ContainerInfo;
use podrunner_runtime::registry::ServiceRegistration;

use super::{RegisteredService, Shared};

impl Shared {
    /// Registers every published port of `started` that maps to a declared
    /// service. Returns the failures that remained after one retry.
    pub(super) async fn register_services(self: Arc<Self>, started: Vec<ContainerInfo>) -> Vec<String> {
        futures::future::join_all(started.iter().map(|c| self.register_container(c)))
            .await
            .into_iter()
            .flatten()
            .collect()
    }

    async fn register_container(&self, started: &ContainerInfo) -> Vec<String> {
        let live = match self.deps.engine.find_by_name(&started.name).await {
            Ok(Some(live)) => live,
            Ok(None) => return vec![format!("container {} vanished before registration", started.name)],
            Err(e) => return vec![e.to_string()],
        };
        let Some(spec) = live.spec_name().and_then(|name| self.spec.container(name)) else {
            return vec![format!("container {} carries no known container label", live.name)];
        };

        let mut failures = Vec::new();
        for (public, private) in live.published_ports() {
            let Some(service) = spec.service_for_port(private) else {
                tracing::debug!(container = %live.name, private, "port has no declared service");
                continue;
            };
            let registration = ServiceRegistration {
                id: live.id.to_string(),
                name: service.to_string(),
                port: public,
                tags: Vec::new(),
            };
            match self.register_with_retry(&registration).await {
                Ok(()) => {
                    tracing::info!(
                        pod = %self.spec.name,
                        id = %live.id,
                        service,
                        port = public,
                        "service registered"
                    );
                    self.lock_registered().push(RegisteredService {
                        id: live.id.clone(),
                        service: service.to_string(),
                        port: public,
                        container: spec.name.clone(),
                    });
                }
                Err(e) => failures.push(e.to_string()),
            }
        }
        failures
    }

    async fn register_with_retry(&self, registration: &ServiceRegistration) -> Result<()> {
        match self.deps.registry.register(registration).await {
            Ok(()) => Ok(()),
            Err(e) => {
                tracing::warn!(id = %registration.id, service = %registration.name, error = %e, "registration failed, retrying once");
                self.deps.registry.register(registration).await
            }
        }
    }
}
