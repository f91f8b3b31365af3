//! Teardown: remove containers, deregister services, publish `Removed`.

use std::collections::{BTreeSet, HashSet};
use std::time::Duration;

use super::Shared;
use crate::error::{CoreError, TeardownError, TeardownFailure, TeardownStep};
use crate::lifecycle::LifecycleEvent;

impl Shared {
    pub(super) async fn teardown(&self, force: bool) -> Result<(), CoreError> {
        let pod = self.spec.name.as_str();
        self.apply(self.step(LifecycleEvent::StopRequested)?).await?;

        let grace = if force {
            Duration::ZERO
        } else {
            self.settings.grace_period
        };
        let targets: Vec<(&str, String)> = self
            .spec
            .containers
            .iter()
            .map(|c| (c.name.as_str(), self.deps.translator.canonical_name(&self.spec, c)))
            .collect();

        let removals = futures::future::join_all(
            targets
                .iter()
                .map(|(_, name)| self.deps.engine.remove(name, grace)),
        )
        .await;

        let mut failures = Vec::new();
        let mut removed = HashSet::new();
        for ((container, name), outcome) in targets.iter().zip(removals) {
            match outcome {
                Ok(()) => {
                    tracing::debug!(pod, container = %name, "container removed");
                    let _ = removed.insert(*container);
                }
                Err(e) => {
                    tracing::warn!(pod, container = %name, error = %e, "container removal failed");
                    failures.push(TeardownFailure {
                        step: TeardownStep::Remove,
                        target: name.clone(),
                        message: e.to_string(),
                    });
                }
            }
        }

        // Services of containers that are still alive stay registered.
        let ids: BTreeSet<String> = self
            .lock_registered()
            .iter()
            .filter(|s| removed.contains(s.container.as_str()))
            .map(|s| s.id.to_string())
            .collect();
        let deregistrations =
            futures::future::join_all(ids.iter().map(|id| self.deps.registry.deregister(id)))
                .await;

        let mut deregistered = HashSet::new();
        for (id, outcome) in ids.iter().zip(deregistrations) {
            match outcome {
                Ok(()) => {
                    tracing::debug!(pod, %id, "service deregistered");
                    let _ = deregistered.insert(id.as_str());
                }
                Err(e) => {
                    tracing::warn!(pod, %id, error = %e, "service deregistration failed");
                    failures.push(TeardownFailure {
                        step: TeardownStep::Deregister,
                        target: id.clone(),
                        message: e.to_string(),
                    });
                }
            }
        }
        self.lock_registered()
            .retain(|s| !deregistered.contains(s.id.as_str()));

        if failures.is_empty() {
            if let Err(e) = self.apply(self.step(LifecycleEvent::TeardownSucceeded)?).await {
                failures.push(TeardownFailure {
                    step: TeardownStep::Publish,
                    target: pod.to_string(),
                    message: e.to_string(),
                });
            } else {
                tracing::info!(pod, "pod removed");
                return Ok(());
            }
        } else {
            self.apply(self.step(LifecycleEvent::TeardownFailed)?).await?;
        }

        Err(TeardownError {
            pod: pod.to_string(),
            failures,
        }
        .into())
    }
}
