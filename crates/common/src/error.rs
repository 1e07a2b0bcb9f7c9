//! Error types for the Rollout installation engine.

use thiserror::Error;
use uuid::Uuid;

use crate::types::UnitStatus;

#[derive(Error, Debug)]
pub enum RolloutError {
    /// `create_task` was called with an empty machine list; no task is
    /// registered in that case.
    #[error("installation task requires at least one target machine")]
    EmptyMachines,

    #[error("no installation task registered with id {0}")]
    UnknownTask(Uuid),

    /// The installator reported completion for a unit that is not in
    /// progress. This indicates a contract bug in the installator; the
    /// unit state is left untouched.
    #[error("unexpected completion for {installation} on {machine}: unit is {status}")]
    UnexpectedCompletion {
        installation: String,
        machine: String,
        status: UnitStatus,
    },
}

/// Result type alias for Rollout operations
pub type RolloutResult<T> = Result<T, RolloutError>;
