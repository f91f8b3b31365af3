//! Runtime collaborators of the pod lifecycle controller.
//!
//! - [`translate`]: pure pod → runtime configuration mapping.
//! - [`engine`]: container runtime access (Docker Engine API, in-memory).
//! - [`registry`]: service registry access (Consul agent API, in-memory).
//! - [`status`]: per-pod status history (JSON file, in-memory).

#![cfg_attr(test, allow(clippy::expect_used, clippy::unwrap_used))]

pub mod engine;
pub mod registry;
pub mod status;
pub mod translate;
