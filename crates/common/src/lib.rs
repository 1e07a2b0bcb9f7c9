//! Rollout Common - Shared types and traits
//!
//! This crate provides the core data model, error types, and the
//! collaborator contract used across the Rollout installation engine:
//!
//! - per-machine installation units and their lifecycle
//! - installation tasks with a derived aggregate status
//! - the [`RemoteInstallator`] trait the orchestrator dispatches through

pub mod error;
pub mod traits;
pub mod types;

// Re-export commonly used types
pub use error::{RolloutError, RolloutResult};
pub use traits::{FinishedCallback, RemoteInstallator};
pub use types::{
    InstallOutcome, InstallStats, InstallationTask, InstallationUnit, TaskStatus, UnitStatus,
};

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
