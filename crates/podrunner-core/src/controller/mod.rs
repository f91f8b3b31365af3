//! The pod lifecycle controller.
//!
//! A [`PodController`] owns one pod assignment on this host. Constructing
//! it launches the start sequence in the background; [`PodController::await_start`]
//! waits for that sequence to settle and [`PodController::stop`] tears the
//! pod down. The only record of the start outcome is the status store.

mod registration;
mod start;
mod teardown;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use podrunner_common::config::PodRunnerConfig;
use podrunner_common::constants::{GRACEFUL_STOP_SECS, STATUS_MESSAGE_LIMIT};
use podrunner_common::error::PodRunnerError;
use podrunner_common::types::{ContainerId, PodSpec};
use podrunner_runtime::engine::RuntimeEngine;
use podrunner_runtime::registry::ServiceRegistry;
use podrunner_runtime::status::StatusStore;
use podrunner_runtime::translate::ConfigTranslator;
use tokio::sync::watch;

use crate::error::CoreError;
use crate::lifecycle::{self, Effect, LifecycleEvent, PodLifecycle};

/// External systems the controller drives.
#[derive(Clone)]
pub struct Collaborators {
    /// Container runtime.
    pub engine: Arc<dyn RuntimeEngine>,
    /// Service registry.
    pub registry: Arc<dyn ServiceRegistry>,
    /// Status history store.
    pub status: Arc<dyn StatusStore>,
    /// Pod → runtime configuration mapper.
    pub translator: ConfigTranslator,
}

/// Tunables of a controller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControllerSettings {
    /// Grace period for non-forced removal.
    pub grace_period: Duration,
    /// Maximum characters of a published status message.
    pub message_limit: usize,
}

impl Default for ControllerSettings {
    fn default() -> Self {
        Self {
            grace_period: Duration::from_secs(GRACEFUL_STOP_SECS),
            message_limit: STATUS_MESSAGE_LIMIT,
        }
    }
}

impl From<&PodRunnerConfig> for ControllerSettings {
    fn from(config: &PodRunnerConfig) -> Self {
        Self {
            grace_period: config.grace_period(),
            message_limit: config.message_limit,
        }
    }
}

/// A service this controller registered and must deregister on stop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegisteredService {
    /// Runtime instance id used as the registry id.
    pub id: ContainerId,
    /// Logical service name.
    pub service: String,
    /// Public port registered.
    pub port: u16,
    /// Container-spec name owning the instance.
    pub container: String,
}

/// State shared between the controller handle and its background tasks.
struct Shared {
    spec: PodSpec,
    deps: Collaborators,
    settings: ControllerSettings,
    state: Mutex<PodLifecycle>,
    registered: Mutex<Vec<RegisteredService>>,
    stop_pending: AtomicBool,
    settled: watch::Sender<bool>,
}

/// Runtime controller of one pod.
pub struct PodController {
    shared: Arc<Shared>,
    settled: watch::Receiver<bool>,
    stop_latch: AtomicBool,
}

impl PodController {
    /// Creates the controller and launches the start sequence.
    ///
    /// Returns immediately; use [`Self::await_start`] to wait for the
    /// sequence to settle.
    ///
    /// # Panics
    ///
    /// Panics if called outside a Tokio runtime.
    #[must_use]
    pub fn new(spec: PodSpec, deps: Collaborators, settings: ControllerSettings) -> Self {
        let (tx, rx) = watch::channel(false);
        let shared = Arc::new(Shared {
            spec,
            deps,
            settings,
            state: Mutex::new(PodLifecycle::NotStarted),
            registered: Mutex::new(Vec::new()),
            stop_pending: AtomicBool::new(false),
            settled: tx,
        });

        let supervised = shared.clone();
        drop(tokio::spawn(async move {
            let sequence = tokio::spawn(supervised.clone().run_start());
            if let Err(e) = sequence.await {
                tracing::error!(pod = %supervised.spec.name, error = %e, "start sequence crashed");
                let crashed = LifecycleEvent::SequenceCrashed {
                    error: format!("start sequence crashed: {e}"),
                };
                let _ = supervised.advance(crashed).await;
            }
            supervised.settle();
        }));

        Self {
            shared,
            settled: rx,
            stop_latch: AtomicBool::new(false),
        }
    }

    /// Waits until the start sequence reaches a terminal point.
    ///
    /// Never fails and may be called any number of times. The outcome is
    /// whatever the sequence published to the status store.
    pub async fn await_start(&self) {
        let mut settled = self.settled.clone();
        let _ = settled.wait_for(|done| *done).await;
    }

    /// Tears the pod down: removes every container and deregisters every
    /// service registered during start, then publishes `Removed`.
    ///
    /// Only the first call does anything; later or overlapping calls return
    /// `Ok(())` at once. A start sequence still in flight is allowed to
    /// finish its current stage and then stops before the next one.
    /// `force` removes containers without a grace period.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::Teardown` listing every failed removal,
    /// deregistration, or publication.
    pub async fn stop(&self, force: bool) -> Result<(), CoreError> {
        if self.stop_latch.swap(true, Ordering::SeqCst) {
            tracing::debug!(pod = %self.shared.spec.name, "stop already requested");
            return Ok(());
        }
        tracing::info!(pod = %self.shared.spec.name, force, "stopping pod");
        self.shared.stop_pending.store(true, Ordering::SeqCst);
        self.await_start().await;
        self.shared.teardown(force).await
    }

    /// The pod this controller runs.
    #[must_use]
    pub fn spec(&self) -> &PodSpec {
        &self.shared.spec
    }

    /// Current lifecycle state.
    #[must_use]
    pub fn state(&self) -> PodLifecycle {
        *self.shared.lock_state()
    }

    /// Services registered and not yet deregistered.
    #[must_use]
    pub fn registered_services(&self) -> Vec<RegisteredService> {
        self.shared.lock_registered().clone()
    }
}

impl std::fmt::Debug for PodController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PodController")
            .field("pod", &self.shared.spec.name)
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}

impl Shared {
    fn lock_state(&self) -> MutexGuard<'_, PodLifecycle> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn lock_registered(&self) -> MutexGuard<'_, Vec<RegisteredService>> {
        self.registered.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn stop_pending(&self) -> bool {
        self.stop_pending.load(Ordering::SeqCst)
    }

    fn settle(&self) {
        let _ = self.settled.send_replace(true);
    }

    /// Applies `event` to the state machine and returns the effects to run.
    fn step(&self, event: LifecycleEvent) -> Result<Vec<Effect>, CoreError> {
        let mut state = self.lock_state();
        let from = *state;
        let name = event.name();
        let transition = lifecycle::transition(from, event, self.settings.message_limit)?;
        *state = transition.next;
        tracing::debug!(pod = %self.spec.name, %from, to = %transition.next, event = name, "lifecycle transition");
        Ok(transition.effects)
    }

    /// Runs effects in order. Every effect runs even if an earlier
    /// publication failed; the first publication error is returned.
    async fn apply(&self, effects: Vec<Effect>) -> Result<(), PodRunnerError> {
        let mut outcome = Ok(());
        for effect in effects {
            match effect {
                Effect::Publish(report) => {
                    tracing::info!(pod = %self.spec.name, status = %report, "publishing status");
                    if let Err(e) = self.deps.status.report(&self.spec.name, report).await {
                        tracing::error!(pod = %self.spec.name, error = %e, "status publication failed");
                        if outcome.is_ok() {
                            outcome = Err(e);
                        }
                    }
                }
                Effect::SettleStart => self.settle(),
            }
        }
        outcome
    }

    /// Steps and applies `event`. Returns `false` if the transition was
    /// rejected or a publication failed, both of which are logged.
    async fn advance(&self, event: LifecycleEvent) -> bool {
        match self.step(event) {
            Ok(effects) => self.apply(effects).await.is_ok(),
            Err(e) => {
                tracing::error!(pod = %self.spec.name, error = %e, "lifecycle transition rejected");
                false
            }
        }
    }
}
