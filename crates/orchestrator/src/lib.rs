//! Rollout Orchestrator - dispatch scheduling and status aggregation
//!
//! Owns the installation-task registry, enforces the global concurrency
//! limit, dispatches eligible units to a [`RemoteInstallator`], and folds
//! completions back into per-task aggregate statuses.
//!
//! [`RemoteInstallator`]: rollout_common::RemoteInstallator

mod orchestrator;
mod sim;

pub use orchestrator::{Orchestrator, DEFAULT_CONCURRENCY_LIMIT};
pub use sim::SimulatedInstallator;
