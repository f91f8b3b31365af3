//! In-process service registry.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use podrunner_common::error::{PodRunnerError, Result};

use super::{ServiceRegistration, ServiceRegistry};

/// One recorded call against a [`MemoryRegistry`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistryCall {
    /// `register(registration)`
    Register(ServiceRegistration),
    /// `deregister(id)`
    Deregister(String),
}

#[derive(Debug, Default)]
struct State {
    services: BTreeMap<String, ServiceRegistration>,
    journal: Vec<RegistryCall>,
    register_failures: HashMap<String, usize>,
}

/// Registry keeping live registrations in memory, keyed by instance id.
#[derive(Debug, Default)]
pub struct MemoryRegistry {
    state: Mutex<State>,
}

impl MemoryRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes the next `times` registrations of `service` fail.
    #[must_use]
    pub fn with_failing_register(self, service: impl Into<String>, times: usize) -> Self {
        let _ = self.lock().register_failures.insert(service.into(), times);
        self
    }

    /// Returns the currently registered services.
    pub fn services(&self) -> Vec<ServiceRegistration> {
        self.lock().services.values().cloned().collect()
    }

    /// Returns every call made so far, in order.
    pub fn calls(&self) -> Vec<RegistryCall> {
        self.lock().journal.clone()
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl ServiceRegistry for MemoryRegistry {
    async fn register(&self, registration: &ServiceRegistration) -> Result<()> {
        let mut state = self.lock();
        state
            .journal
            .push(RegistryCall::Register(registration.clone()));
        if let Some(remaining) = state.register_failures.get_mut(&registration.name) {
            if *remaining > 0 {
                *remaining -= 1;
                return Err(PodRunnerError::Registry {
                    operation: "register",
                    id: registration.id.clone(),
                    message: "simulated registry failure".to_string(),
                });
            }
        }
        let _ = state
            .services
            .insert(registration.id.clone(), registration.clone());
        Ok(())
    }

    async fn deregister(&self, id: &str) -> Result<()> {
        let mut state = self.lock();
        state.journal.push(RegistryCall::Deregister(id.to_string()));
        if state.services.remove(id).is_none() {
            return Err(PodRunnerError::NotFound {
                kind: "service",
                id: id.to_string(),
            });
        }
        Ok(())
    }
}
