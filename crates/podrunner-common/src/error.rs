//! Unified error types for the podrunner workspace.
//!
//! Collaborator implementations report through [`PodRunnerError`]; the
//! lifecycle controller defines its own error enum on top of it.

use std::path::PathBuf;

use thiserror::Error;

/// Top-level error type shared across the workspace.
#[derive(Debug, Error)]
pub enum PodRunnerError {
    /// An I/O operation failed.
    #[error("I/O error at {path}: {source}")]
    Io {
        /// Path where the I/O error occurred.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// A configuration value is invalid.
    #[error("invalid configuration: {message}")]
    Config {
        /// Description of the invalid configuration.
        message: String,
    },

    /// A pod descriptor failed validation.
    #[error("invalid pod spec '{pod}': {message}")]
    InvalidSpec {
        /// Name of the offending pod.
        pod: String,
        /// What is wrong with it.
        message: String,
    },

    /// A required resource was not found.
    #[error("{kind} not found: {id}")]
    NotFound {
        /// Type of the missing resource.
        kind: &'static str,
        /// Identifier of the missing resource.
        id: String,
    },

    /// The container runtime rejected or failed an operation.
    #[error("runtime {operation} failed for {target}: {message}")]
    Runtime {
        /// Operation that failed (`create`, `start`, `remove`, ...).
        operation: &'static str,
        /// Container name or id the operation targeted.
        target: String,
        /// Error reported by the runtime.
        message: String,
    },

    /// The service registry rejected or failed an operation.
    #[error("registry {operation} failed for {id}: {message}")]
    Registry {
        /// Operation that failed (`register` or `deregister`).
        operation: &'static str,
        /// Service instance id.
        id: String,
        /// Error reported by the registry.
        message: String,
    },

    /// Serialization or deserialization failed.
    #[error("serialization error: {source}")]
    Serialization {
        /// Underlying serialization error.
        #[from]
        source: serde_json::Error,
    },
}

/// Convenience alias used throughout the workspace.
pub type Result<T> = std::result::Result<T, PodRunnerError>;
