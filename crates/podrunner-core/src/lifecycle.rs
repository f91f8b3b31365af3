//! Pod lifecycle state machine.
//!
//! Every state change of a [`crate::PodController`] goes through
//! [`transition`], a pure function from `(state, event)` to the next state
//! plus the side effects the controller must perform. Start and stop are
//! serialised through the same machine, so "stop while starting" is a
//! defined transition ([`LifecycleEvent::StopPending`]) rather than a race.
//!
//! ```text
//! NotStarted ──GateOpened──▶ Pulling ──PullSucceeded──▶ Starting ──ContainersStarted──▶ Running
//!     │                         │                          │                            │
//!     ├─GateRefused─▶ Refused   ├─PullFailed──▶ Failed ◀───┤ Create/StartFailed         │
//!     └─StopPending─▶ Aborted ◀─┴─StopPending──────────────┘                            │
//!                                                                                       │
//! {Running, Refused, Failed, Aborted} ──StopRequested──▶ Stopping ──▶ Removed | StopFailed
//! ```
//!
//! A start sequence that dies unexpectedly ([`LifecycleEvent::SequenceCrashed`])
//! is recorded as a start failure. `StopRequested` is also accepted from the
//! start states so a pod whose sequence never reached a terminal state can
//! still be torn down.

use std::fmt;

use podrunner_common::constants::reason;
use podrunner_common::status::{PodPhase, StatusReport};

use crate::error::CoreError;

/// Controller-side lifecycle state of one pod.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PodLifecycle {
    /// Constructed; the start sequence has not passed the gate yet.
    NotStarted,
    /// Verifying images.
    Pulling,
    /// Creating and starting containers.
    Starting,
    /// Containers started. Registration may still be in flight.
    Running,
    /// The gate refused to start a pod whose last status was `Failed`.
    Refused,
    /// A start stage failed and the failure was published.
    Failed,
    /// The start sequence stopped early: a stop was pending or the status
    /// store was unavailable.
    Aborted,
    /// Teardown in progress.
    Stopping,
    /// Teardown completed and `Removed` was published.
    Removed,
    /// Teardown finished with failures.
    StopFailed,
}

impl PodLifecycle {
    /// Whether the start sequence has reached a point where it no longer acts.
    #[must_use]
    pub const fn is_start_settled(self) -> bool {
        !matches!(self, Self::NotStarted | Self::Pulling | Self::Starting)
    }
}

impl fmt::Display for PodLifecycle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::NotStarted => "not-started",
            Self::Pulling => "pulling",
            Self::Starting => "starting",
            Self::Running => "running",
            Self::Refused => "refused",
            Self::Failed => "failed",
            Self::Aborted => "aborted",
            Self::Stopping => "stopping",
            Self::Removed => "removed",
            Self::StopFailed => "stop-failed",
        };
        f.write_str(name)
    }
}

/// Inputs to the state machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LifecycleEvent {
    /// The latest stored status does not forbid starting.
    GateOpened,
    /// The latest stored status is `Failed`.
    GateRefused,
    /// Every image is available.
    PullSucceeded,
    /// The first image, in declaration order, that could not be pulled.
    PullFailed {
        /// Image reference.
        image: String,
    },
    /// Container creation failed.
    CreateFailed {
        /// Error of the lowest-index failing container.
        error: String,
    },
    /// Container start failed.
    StartFailed {
        /// Error of the lowest-index failing container.
        error: String,
    },
    /// Every container is running.
    ContainersStarted,
    /// The registration task finished.
    RegistrationSettled {
        /// Registrations that failed even after a retry.
        failures: Vec<String>,
    },
    /// A stop was requested while the start sequence was still running.
    StopPending,
    /// The status store could not be read or written during start.
    StatusUnavailable,
    /// The start sequence task ended without settling (it panicked or was
    /// cancelled).
    SequenceCrashed {
        /// Description of the crash.
        error: String,
    },
    /// Teardown begins.
    StopRequested,
    /// Every removal and deregistration succeeded.
    TeardownSucceeded,
    /// At least one removal or deregistration failed.
    TeardownFailed,
}

impl LifecycleEvent {
    /// Short event name used in logs and errors.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::GateOpened => "gate-opened",
            Self::GateRefused => "gate-refused",
            Self::PullSucceeded => "pull-succeeded",
            Self::PullFailed { .. } => "pull-failed",
            Self::CreateFailed { .. } => "create-failed",
            Self::StartFailed { .. } => "start-failed",
            Self::ContainersStarted => "containers-started",
            Self::RegistrationSettled { .. } => "registration-settled",
            Self::StopPending => "stop-pending",
            Self::StatusUnavailable => "status-unavailable",
            Self::SequenceCrashed { .. } => "sequence-crashed",
            Self::StopRequested => "stop-requested",
            Self::TeardownSucceeded => "teardown-succeeded",
            Self::TeardownFailed => "teardown-failed",
        }
    }
}

/// A side effect the controller performs after a transition, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Append a report to the pod's status history.
    Publish(StatusReport),
    /// Release everyone waiting in `await_start`.
    SettleStart,
}

/// Result of a successful transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    /// State after the event.
    pub next: PodLifecycle,
    /// Effects to perform, in order.
    pub effects: Vec<Effect>,
}

impl Transition {
    fn to(next: PodLifecycle) -> Self {
        Self {
            next,
            effects: Vec::new(),
        }
    }

    fn publish(mut self, report: StatusReport) -> Self {
        self.effects.push(Effect::Publish(report));
        self
    }

    fn settle(mut self) -> Self {
        self.effects.push(Effect::SettleStart);
        self
    }
}

/// Computes the next state and effects for `event` in `state`.
///
/// Messages are truncated to `message_limit` characters.
///
/// # Errors
///
/// Returns `CoreError::InvalidTransition` if `state` does not accept `event`.
pub fn transition(
    state: PodLifecycle,
    event: LifecycleEvent,
    message_limit: usize,
) -> Result<Transition, CoreError> {
    use LifecycleEvent as E;
    use PodLifecycle as S;

    let failed_starting = |error: &str| {
        StatusReport::new(PodPhase::Failed, reason::CONTAINER_FAILED_STARTING)
            .with_message(&format!("Failed starting containers {error}"), message_limit)
    };

    let next = match (state, event) {
        (S::NotStarted, E::GateOpened) => Transition::to(S::Pulling)
            .publish(StatusReport::new(PodPhase::Pending, reason::PULLING_CONTAINERS)),
        (S::NotStarted, E::GateRefused) => Transition::to(S::Refused).settle(),
        (S::Pulling, E::PullSucceeded) => Transition::to(S::Starting)
            .publish(StatusReport::new(PodPhase::Pending, reason::STARTING_CONTAINERS)),
        (S::Pulling, E::PullFailed { image }) => Transition::to(S::Failed)
            .publish(
                StatusReport::new(PodPhase::Failed, reason::CONTAINER_FAILED_PULLING)
                    .with_message(&format!("Failed pulling image {image}"), message_limit),
            )
            .settle(),
        (
            S::NotStarted | S::Pulling | S::Starting,
            E::SequenceCrashed { error },
        )
        | (S::Starting, E::CreateFailed { error } | E::StartFailed { error }) => {
            Transition::to(S::Failed)
                .publish(failed_starting(&error))
                .settle()
        }
        (S::Starting, E::ContainersStarted) => Transition::to(S::Running)
            .publish(StatusReport::new(PodPhase::Running, reason::STARTED)),
        (S::Running, E::RegistrationSettled { failures }) => {
            let t = Transition::to(S::Running);
            if failures.is_empty() {
                t.settle()
            } else {
                t.publish(
                    StatusReport::new(PodPhase::Running, reason::SERVICE_REGISTRATION_FAILED)
                        .with_message(&failures.join("; "), message_limit),
                )
                .settle()
            }
        }
        (S::Running, E::SequenceCrashed { .. }) => Transition::to(S::Running).settle(),
        (S::NotStarted | S::Pulling | S::Starting, E::StopPending | E::StatusUnavailable) => {
            Transition::to(S::Aborted).settle()
        }
        (
            S::NotStarted
            | S::Pulling
            | S::Starting
            | S::Running
            | S::Refused
            | S::Failed
            | S::Aborted,
            E::StopRequested,
        ) => {
            Transition::to(S::Stopping)
        }
        (S::Stopping, E::TeardownSucceeded) => Transition::to(S::Removed)
            .publish(StatusReport::new(PodPhase::Removed, reason::REMOVED_OK)),
        (S::Stopping, E::TeardownFailed) => Transition::to(S::StopFailed),
        (from, event) => {
            return Err(CoreError::InvalidTransition {
                from,
                event: event.name(),
            });
        }
    };
    Ok(next)
}
