//! Simulated remote installator.
//!
//! Stands in for a real transport during demos and async tests: each
//! install sleeps on the tokio runtime and then reports its outcome from
//! the spawned task, never synchronously.

use std::collections::HashSet;
use std::time::Duration;

use tracing::debug;

use rollout_common::{FinishedCallback, InstallOutcome, RemoteInstallator};

/// Installator that pretends to install by sleeping.
///
/// Machines registered via [`failing_machine`](Self::failing_machine)
/// report [`InstallOutcome::Failed`]; everything else succeeds. Must be
/// driven from within a tokio runtime.
pub struct SimulatedInstallator {
    latency: Duration,
    failing: HashSet<String>,
}

impl SimulatedInstallator {
    #[must_use]
    pub fn new(latency: Duration) -> Self {
        Self {
            latency,
            failing: HashSet::new(),
        }
    }

    /// Builder: make installs on `machine` report failure.
    #[must_use]
    pub fn failing_machine(mut self, machine: &str) -> Self {
        self.failing.insert(machine.to_string());
        self
    }
}

impl RemoteInstallator for SimulatedInstallator {
    fn install_on_machine(&self, installation: &str, machine: &str, on_finished: FinishedCallback) {
        let outcome = if self.failing.contains(machine) {
            InstallOutcome::Failed
        } else {
            InstallOutcome::Succeeded
        };
        let latency = self.latency;
        let installation = installation.to_string();
        let machine = machine.to_string();
        tokio::spawn(async move {
            tokio::time::sleep(latency).await;
            debug!(
                installation = %installation,
                machine = %machine,
                outcome = ?outcome,
                "simulated install finished"
            );
            on_finished(outcome);
        });
    }
}
