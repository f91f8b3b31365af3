//! The staged start sequence.
//!
//! Each stage fans out over the pod's containers and is a strict barrier:
//! every per-container task settles before the next stage begins.

use std::sync::Arc;

use podrunner_common::error::{PodRunnerError, Result};
use podrunner_common::types::ContainerSpec;
use podrunner_runtime::engine::ContainerInfo;

use super::Shared;
use crate::fanout::{self, StageFailure};
use crate::lifecycle::LifecycleEvent;

impl Shared {
    pub(super) async fn run_start(self: Arc<Self>) {
        let pod = self.spec.name.as_str();
        tracing::info!(pod, containers = self.spec.containers.len(), "starting pod");

        if self.stop_pending() {
            let _ = self.advance(LifecycleEvent::StopPending).await;
            return;
        }

        match self.gate().await {
            Ok(true) => {}
            Ok(false) => {
                tracing::info!(pod, "pod failed previously, not starting");
                let _ = self.advance(LifecycleEvent::GateRefused).await;
                return;
            }
            Err(e) => {
                tracing::error!(pod, error = %e, "status store unavailable");
                let _ = self.advance(LifecycleEvent::StatusUnavailable).await;
                return;
            }
        }
        if !self.advance(LifecycleEvent::GateOpened).await {
            let _ = self.advance(LifecycleEvent::StatusUnavailable).await;
            return;
        }

        if let Some(image) = self.pull_images().await {
            tracing::warn!(pod, %image, "image pull failed");
            let _ = self.advance(LifecycleEvent::PullFailed { image }).await;
            return;
        }
        if !self.next_stage(LifecycleEvent::PullSucceeded).await {
            return;
        }

        let created = match fanout::join_settled(
            self.spec.containers.iter().map(|c| self.get_or_create(c)),
        )
        .await
        {
            Ok(created) => created,
            Err(failures) => {
                let names: Vec<&str> = self.spec.containers.iter().map(|c| c.name.as_str()).collect();
                let error = self.first_failure("creating", &failures, &names);
                let _ = self.advance(LifecycleEvent::CreateFailed { error }).await;
                return;
            }
        };
        if self.stop_pending() {
            let _ = self.advance(LifecycleEvent::StopPending).await;
            return;
        }

        let started: Vec<ContainerInfo> = created.into_iter().filter(|c| !c.running).collect();
        if let Err(failures) = fanout::join_settled(started.iter().map(|c| {
            tracing::info!(pod, container = %c.name, "starting container");
            self.deps.engine.start(&c.id)
        }))
        .await
        {
            let names: Vec<&str> = started.iter().map(|c| c.name.as_str()).collect();
            let error = self.first_failure("starting", &failures, &names);
            let _ = self.advance(LifecycleEvent::StartFailed { error }).await;
            return;
        }

        // Registration runs beside the Running publication and is joined
        // before the start sequence settles.
        let registration = tokio::spawn(self.clone().register_services(started));
        let _ = self.advance(LifecycleEvent::ContainersStarted).await;
        let failures = match registration.await {
            Ok(failures) => failures,
            Err(e) => vec![format!("registration task failed: {e}")],
        };
        for failure in &failures {
            tracing::warn!(pod, %failure, "service registration failed");
        }
        let _ = self
            .advance(LifecycleEvent::RegistrationSettled { failures })
            .await;
        tracing::info!(pod, "pod started");
    }

    /// Returns whether the pod may start: its latest status is not `Failed`.
    async fn gate(&self) -> Result<bool> {
        self.deps.status.ready().await?;
        let latest = self.deps.status.get_latest(&self.spec.name).await?;
        Ok(!latest.is_some_and(|s| s.is_failed()))
    }

    /// Verifies every image concurrently and returns the first unavailable
    /// one in declaration order.
    async fn pull_images(&self) -> Option<String> {
        let pulls = futures::future::join_all(
            self.spec
                .containers
                .iter()
                .map(|c| self.deps.engine.ensure_image(&c.image)),
        )
        .await;
        pulls
            .iter()
            .position(|ok| !ok)
            .map(|i| self.spec.containers[i].image.clone())
    }

    /// Advances to the next stage unless a stop arrived in the meantime.
    async fn next_stage(&self, event: LifecycleEvent) -> bool {
        if self.stop_pending() {
            let _ = self.advance(LifecycleEvent::StopPending).await;
            return false;
        }
        if self.advance(event).await {
            return true;
        }
        let _ = self.advance(LifecycleEvent::StatusUnavailable).await;
        false
    }

    /// Finds the container under its canonical name, creating it first if
    /// it does not exist.
    async fn get_or_create(&self, container: &ContainerSpec) -> Result<ContainerInfo> {
        let config = self.deps.translator.translate(&self.spec, container)?;
        if let Some(existing) = self.deps.engine.find_by_name(&config.name).await? {
            tracing::debug!(pod = %self.spec.name, name = %config.name, "reusing container");
            return Ok(existing);
        }
        tracing::info!(pod = %self.spec.name, name = %config.name, "creating container");
        self.deps.engine.create(&config).await?;
        self.deps
            .engine
            .find_by_name(&config.name)
            .await?
            .ok_or_else(|| PodRunnerError::NotFound {
                kind: "container",
                id: config.name,
            })
    }

    /// Logs every failure and returns the lowest-index one as text.
    fn first_failure(
        &self,
        stage: &str,
        failures: &[StageFailure<PodRunnerError>],
        names: &[&str],
    ) -> String {
        for failure in failures {
            tracing::warn!(
                pod = %self.spec.name,
                container = names.get(failure.index).copied().unwrap_or("?"),
                error = %failure.error,
                "error {stage} container"
            );
        }
        failures
            .first()
            .map(|f| f.error.to_string())
            .unwrap_or_default()
    }
}
