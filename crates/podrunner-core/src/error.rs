//! Error types of the lifecycle controller.

use std::fmt;

use podrunner_common::error::PodRunnerError;
use thiserror::Error;

use crate::lifecycle::PodLifecycle;

/// Errors surfaced by [`crate::PodController`].
#[derive(Debug, Error)]
pub enum CoreError {
    /// An event arrived that the current lifecycle state does not accept.
    #[error("lifecycle event '{event}' is not valid in state {from}")]
    InvalidTransition {
        /// State the controller was in.
        from: PodLifecycle,
        /// Name of the rejected event.
        event: &'static str,
    },

    /// Teardown finished with at least one failure.
    #[error(transparent)]
    Teardown(#[from] TeardownError),

    /// A collaborator call failed outside any aggregated step.
    #[error(transparent)]
    Collaborator(#[from] PodRunnerError),
}

/// Which part of teardown a failure belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TeardownStep {
    /// Removing a container from the runtime.
    Remove,
    /// Deregistering a service instance.
    Deregister,
    /// Publishing the final `Removed` status.
    Publish,
}

impl fmt::Display for TeardownStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Remove => write!(f, "remove"),
            Self::Deregister => write!(f, "deregister"),
            Self::Publish => write!(f, "publish"),
        }
    }
}

/// One failed teardown operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TeardownFailure {
    /// Step that failed.
    pub step: TeardownStep,
    /// Container name or service id the step targeted.
    pub target: String,
    /// Error text.
    pub message: String,
}

impl fmt::Display for TeardownFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}: {}", self.step, self.target, self.message)
    }
}

/// Aggregate of every failure of one teardown.
#[derive(Debug, Clone, Error)]
#[error("teardown of pod '{pod}' failed: {}", join(.failures))]
pub struct TeardownError {
    /// Pod being torn down.
    pub pod: String,
    /// Every failed operation, removals first.
    pub failures: Vec<TeardownFailure>,
}

fn join(failures: &[TeardownFailure]) -> String {
    failures
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}
