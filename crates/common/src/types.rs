//! Core data types for the Rollout installation engine.
//!
//! The model is deliberately small: an [`InstallationUnit`] is one
//! (installation, machine) work item, an [`InstallationTask`] is a named
//! group of units created together, and [`TaskStatus`] is always derived
//! from the unit statuses via [`TaskStatus::from_units`]. Only the
//! orchestrator mutates these; observers work with cloned snapshots.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::SystemTime;
use uuid::Uuid;

/// Lifecycle states of a single installation unit.
///
/// Transitions are monotonic: `Pending -> InProgress -> {Succeeded | Failed}`.
/// A unit never leaves a terminal state and never re-enters `Pending`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UnitStatus {
    Pending,
    InProgress,
    Succeeded,
    Failed,
}

impl UnitStatus {
    #[inline]
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            UnitStatus::Pending => "pending",
            UnitStatus::InProgress => "in-progress",
            UnitStatus::Succeeded => "succeeded",
            UnitStatus::Failed => "failed",
        }
    }

    /// Whether the unit has reached `Succeeded` or `Failed`.
    #[inline]
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, UnitStatus::Succeeded | UnitStatus::Failed)
    }
}

impl fmt::Display for UnitStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Terminal outcome reported by the installator for one dispatched unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InstallOutcome {
    Succeeded,
    Failed,
}

impl From<InstallOutcome> for UnitStatus {
    #[inline]
    fn from(outcome: InstallOutcome) -> Self {
        match outcome {
            InstallOutcome::Succeeded => UnitStatus::Succeeded,
            InstallOutcome::Failed => UnitStatus::Failed,
        }
    }
}

/// Composite status of an installation task, derived from its units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TaskStatus {
    Standby,
    Installing,
    Success,
    Failed,
    PartialSuccess,
}

impl TaskStatus {
    /// Compute the aggregate status from the current unit statuses.
    ///
    /// Precedence: all units pending -> `Standby`; any unit pending or in
    /// progress -> `Installing`; otherwise all units are terminal and the
    /// result is `Success`, `Failed`, or `PartialSuccess` for a mix.
    #[must_use]
    pub fn from_units(units: &[InstallationUnit]) -> Self {
        if units.iter().all(|u| u.status == UnitStatus::Pending) {
            return TaskStatus::Standby;
        }
        if units.iter().any(|u| !u.status.is_terminal()) {
            return TaskStatus::Installing;
        }
        let succeeded = units
            .iter()
            .filter(|u| u.status == UnitStatus::Succeeded)
            .count();
        if succeeded == units.len() {
            TaskStatus::Success
        } else if succeeded == 0 {
            TaskStatus::Failed
        } else {
            TaskStatus::PartialSuccess
        }
    }

    #[inline]
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Standby => "standby",
            TaskStatus::Installing => "installing",
            TaskStatus::Success => "success",
            TaskStatus::Failed => "failed",
            TaskStatus::PartialSuccess => "partial-success",
        }
    }

    /// Whether every unit of the task has settled.
    #[inline]
    #[must_use]
    pub const fn is_settled(&self) -> bool {
        matches!(
            self,
            TaskStatus::Success | TaskStatus::Failed | TaskStatus::PartialSuccess
        )
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One (installation, machine) work item with its own lifecycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstallationUnit {
    pub installation: String,
    pub machine: String,
    pub status: UnitStatus,
}

impl InstallationUnit {
    #[inline]
    #[must_use]
    pub fn new(installation: &str, machine: &str) -> Self {
        Self {
            installation: installation.to_string(),
            machine: machine.to_string(),
            status: UnitStatus::Pending,
        }
    }
}

impl fmt::Display for InstallationUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} on {} ({})",
            self.installation,
            self.machine,
            self.status.as_str()
        )
    }
}

/// A named group of installation units created together.
///
/// Units keep their creation order; that order is also the dispatch order
/// within the task. `status` is maintained by the orchestrator and always
/// equals `TaskStatus::from_units(&units)`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InstallationTask {
    pub id: Uuid,
    pub installation: String,
    pub units: Vec<InstallationUnit>,
    pub status: TaskStatus,
    pub created_at: SystemTime,
}

impl InstallationTask {
    /// Build a task with one pending unit per machine, in the given order.
    #[must_use]
    pub fn new(installation: &str, machines: &[&str]) -> Self {
        let units = machines
            .iter()
            .map(|machine| InstallationUnit::new(installation, machine))
            .collect();
        Self {
            id: Uuid::new_v4(),
            installation: installation.to_string(),
            units,
            status: TaskStatus::Standby,
            created_at: SystemTime::now(),
        }
    }

    #[inline]
    #[must_use]
    pub fn unit_count(&self) -> usize {
        self.units.len()
    }

    /// Re-derive the aggregate status from the current unit statuses.
    #[inline]
    pub fn recompute_status(&mut self) {
        self.status = TaskStatus::from_units(&self.units);
    }
}

/// Aggregate counters over every unit known to the orchestrator.
///
/// Derived on demand from the task registry; never stored.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstallStats {
    pub total_units: usize,
    pub pending: usize,
    pub in_progress: usize,
    pub succeeded: usize,
    pub failed: usize,
}

impl InstallStats {
    #[inline]
    pub fn record(&mut self, status: UnitStatus) {
        self.total_units += 1;
        match status {
            UnitStatus::Pending => self.pending += 1,
            UnitStatus::InProgress => self.in_progress += 1,
            UnitStatus::Succeeded => self.succeeded += 1,
            UnitStatus::Failed => self.failed += 1,
        }
    }

    #[must_use]
    pub fn from_tasks<'a, I>(tasks: I) -> Self
    where
        I: IntoIterator<Item = &'a InstallationTask>,
    {
        let mut stats = Self::default();
        for task in tasks {
            for unit in &task.units {
                stats.record(unit.status);
            }
        }
        stats
    }

    /// Units that have reached a terminal state.
    #[inline]
    #[must_use]
    pub const fn settled(&self) -> usize {
        self.succeeded + self.failed
    }

    /// Completion percentage in [0.0, 100.0].
    #[inline]
    #[must_use]
    pub fn progress(&self) -> f32 {
        if self.total_units == 0 {
            0.0
        } else {
            (self.settled() as f32 / self.total_units as f32) * 100.0
        }
    }
}
