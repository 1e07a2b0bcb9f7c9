//! Orchestrator - unit dispatch and task status rollup
//!
//! All mutable state lives behind one mutex. Every entry point (task
//! creation, limit changes, completion callbacks) runs its mutation and the
//! dispatch selection as a single critical section; installator calls are
//! issued only after the lock is released, so no lock is ever held across
//! the asynchronous gap between dispatch and completion.

use std::sync::{Arc, Mutex, MutexGuard};

use tracing::{debug, error, info};
use uuid::Uuid;

use rollout_common::{
    FinishedCallback, InstallOutcome, InstallStats, InstallationTask, RemoteInstallator,
    RolloutError, RolloutResult, UnitStatus,
};

/// Default global ceiling on concurrently in-progress units.
pub const DEFAULT_CONCURRENCY_LIMIT: usize = 4;

/// Coordinates remote installations: owns all installation tasks, enforces
/// the global concurrency limit, and keeps every task's aggregate status
/// current as completions arrive.
///
/// Cheap to clone handles are not provided on purpose; share the
/// orchestrator itself via [`Arc`] when observers on other threads need it.
pub struct Orchestrator {
    shared: Arc<Shared>,
}

struct Shared {
    installator: Arc<dyn RemoteInstallator>,
    state: Mutex<State>,
}

struct State {
    /// Append-only registry; index order is creation order and fixes
    /// dispatch priority between tasks.
    tasks: Vec<InstallationTask>,
    concurrency_limit: usize,
    /// Number of units currently in progress across all tasks.
    in_flight: usize,
}

/// Dispatch order collected under the lock and executed after release.
struct DispatchOrder {
    task_index: usize,
    unit_index: usize,
    installation: String,
    machine: String,
}

impl Orchestrator {
    /// Create an orchestrator with [`DEFAULT_CONCURRENCY_LIMIT`].
    #[must_use]
    pub fn new(installator: Arc<dyn RemoteInstallator>) -> Self {
        Self::with_limit(installator, DEFAULT_CONCURRENCY_LIMIT)
    }

    /// Create an orchestrator with an explicit concurrency limit.
    #[must_use]
    pub fn with_limit(installator: Arc<dyn RemoteInstallator>, concurrency_limit: usize) -> Self {
        Self {
            shared: Arc::new(Shared {
                installator,
                state: Mutex::new(State {
                    tasks: Vec::new(),
                    concurrency_limit,
                    in_flight: 0,
                }),
            }),
        }
    }

    /// Register a new installation task targeting `machines` in order and
    /// immediately dispatch as many of its units as capacity allows.
    ///
    /// Returns the id of the new task. Rejects an empty machine list
    /// without registering anything.
    pub fn create_task(&self, installation: &str, machines: &[&str]) -> RolloutResult<Uuid> {
        if machines.is_empty() {
            return Err(RolloutError::EmptyMachines);
        }

        let task = InstallationTask::new(installation, machines);
        let id = task.id;
        info!(
            id = %id,
            installation,
            machines = machines.len(),
            "created installation task"
        );

        let orders = {
            let mut state = self.shared.lock();
            state.tasks.push(task);
            state.dispatch()
        };
        Arc::clone(&self.shared).execute(orders);
        Ok(id)
    }

    /// Convenience for a task that targets a single machine.
    pub fn create_single_task(&self, installation: &str, machine: &str) -> RolloutResult<Uuid> {
        self.create_task(installation, &[machine])
    }

    /// Change the global concurrency limit.
    ///
    /// Raising the limit back-fills pending units immediately, oldest
    /// first. Lowering it never cancels in-progress units; the new limit
    /// only gates future dispatch.
    pub fn set_concurrency_limit(&self, concurrency_limit: usize) {
        let orders = {
            let mut state = self.shared.lock();
            let previous = state.concurrency_limit;
            state.concurrency_limit = concurrency_limit;
            debug!(previous, concurrency_limit, "concurrency limit changed");
            state.dispatch()
        };
        Arc::clone(&self.shared).execute(orders);
    }

    /// Current global concurrency limit.
    #[must_use]
    pub fn concurrency_limit(&self) -> usize {
        self.shared.lock().concurrency_limit
    }

    /// Number of units currently in progress across all tasks.
    #[must_use]
    pub fn in_flight(&self) -> usize {
        self.shared.lock().in_flight
    }

    /// Snapshot of all tasks in creation order.
    ///
    /// The returned tasks are clones; mutating them has no effect on the
    /// registry.
    #[must_use]
    pub fn tasks(&self) -> Vec<InstallationTask> {
        self.shared.lock().tasks.clone()
    }

    /// Snapshot of a single task by id.
    pub fn task(&self, id: Uuid) -> RolloutResult<InstallationTask> {
        self.shared
            .lock()
            .tasks
            .iter()
            .find(|task| task.id == id)
            .cloned()
            .ok_or(RolloutError::UnknownTask(id))
    }

    /// Aggregate unit counters over the whole registry.
    #[must_use]
    pub fn stats(&self) -> InstallStats {
        InstallStats::from_tasks(self.shared.lock().tasks.iter())
    }
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, State> {
        // Critical sections never panic, so a poisoned lock can only come
        // from a panicking observer; the state itself is still consistent.
        match self.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Invoke the installator for every order collected under the lock.
    ///
    /// Runs lock-free, so even an installator that (incorrectly) completes
    /// synchronously cannot deadlock the orchestrator.
    fn execute(self: Arc<Self>, orders: Vec<DispatchOrder>) {
        for order in orders {
            info!(
                installation = %order.installation,
                machine = %order.machine,
                "dispatching installation"
            );
            let shared = Arc::clone(&self);
            let on_finished: FinishedCallback = Box::new(move |outcome| {
                shared.complete(order.task_index, order.unit_index, outcome);
            });
            self.installator
                .install_on_machine(&order.installation, &order.machine, on_finished);
        }
    }

    /// Completion entry point; marshals the installator's report into the
    /// serialized critical section and refills freed capacity.
    fn complete(self: Arc<Self>, task_index: usize, unit_index: usize, outcome: InstallOutcome) {
        let orders = {
            let mut state = self.lock();
            match state.finish_unit(task_index, unit_index, outcome) {
                Ok(()) => state.dispatch(),
                Err(err) => {
                    error!(%err, "ignoring completion that violates the installator contract");
                    return;
                }
            }
        };
        self.execute(orders);
    }
}

impl State {
    /// The dispatch step: start pending units in registry order, oldest
    /// task first and units in creation order within a task, until
    /// capacity runs out. Stops entirely at the first unit that does not
    /// fit; younger units are never started ahead of older ones.
    ///
    /// Re-running this with unchanged state produces no orders: units
    /// leave `Pending` the moment they are selected.
    fn dispatch(&mut self) -> Vec<DispatchOrder> {
        let mut orders = Vec::new();
        'registry: for (task_index, task) in self.tasks.iter_mut().enumerate() {
            for (unit_index, unit) in task.units.iter_mut().enumerate() {
                if unit.status != UnitStatus::Pending {
                    continue;
                }
                if self.in_flight >= self.concurrency_limit {
                    break 'registry;
                }
                unit.status = UnitStatus::InProgress;
                self.in_flight += 1;
                orders.push(DispatchOrder {
                    task_index,
                    unit_index,
                    installation: unit.installation.clone(),
                    machine: unit.machine.clone(),
                });
            }
        }

        // Aggregate statuses are a pure function of unit statuses; refresh
        // every task before the lock is released.
        for task in &mut self.tasks {
            task.recompute_status();
        }
        orders
    }

    /// Record a terminal outcome for one unit and refresh its task.
    ///
    /// A completion for a unit that is not in progress is a contract
    /// violation: nothing is mutated and the error is surfaced to the
    /// caller.
    fn finish_unit(
        &mut self,
        task_index: usize,
        unit_index: usize,
        outcome: InstallOutcome,
    ) -> RolloutResult<()> {
        // Indices were minted at dispatch time and the registry is
        // append-only, so they are always in bounds.
        let task = &mut self.tasks[task_index];
        let unit = &mut task.units[unit_index];

        if unit.status != UnitStatus::InProgress {
            return Err(RolloutError::UnexpectedCompletion {
                installation: unit.installation.clone(),
                machine: unit.machine.clone(),
                status: unit.status,
            });
        }

        unit.status = outcome.into();
        self.in_flight -= 1;
        task.recompute_status();
        debug!(
            installation = %task.installation,
            machine = %task.units[unit_index].machine,
            outcome = %task.units[unit_index].status,
            task_status = %task.status,
            in_flight = self.in_flight,
            "installation finished"
        );
        Ok(())
    }
}
