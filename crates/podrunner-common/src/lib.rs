//! # podrunner-common
//!
//! Shared pod types, status model, error definitions, configuration, and
//! constants used across the entire podrunner workspace.
//!
//! This crate is the leaf of the dependency graph. It depends on no other
//! internal crate and provides the primitives the runtime collaborators and
//! the lifecycle controller build upon.

#![cfg_attr(test, allow(clippy::expect_used, clippy::unwrap_used))]

pub mod config;
pub mod constants;
pub mod error;
pub mod status;
pub mod types;
