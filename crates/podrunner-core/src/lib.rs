//! # podrunner-core
//!
//! The pod lifecycle controller: drives one pod from "not started" to a
//! terminal observable status and later from "running" to "removed".
//!
//! - [`controller::PodController`]: construct-to-start, await, stop.
//! - [`lifecycle`]: the explicit state machine behind the controller.
//! - [`fanout`]: join-all-collect-errors combinator used at every stage barrier.

#![cfg_attr(test, allow(clippy::expect_used, clippy::unwrap_used))]

pub mod controller;
pub mod error;
pub mod fanout;
pub mod lifecycle;

pub use controller::{Collaborators, ControllerSettings, PodController, RegisteredService};
pub use error::{CoreError, TeardownError, TeardownFailure};
