//! Shared test support: a deterministic fake installator.

// Each test binary compiles this module separately and uses a subset of it.
#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use rollout_common::{FinishedCallback, InstallOutcome, RemoteInstallator};

pub struct ActiveInstallation {
    pub installation: String,
    pub machine: String,
    callback: FinishedCallback,
}

/// Installator double that records every dispatch and lets the test finish
/// installations explicitly, in any order.
#[derive(Default)]
pub struct FakeInstallator {
    active: Mutex<Vec<ActiveInstallation>>,
    started: Mutex<Vec<(String, String)>>,
}

impl FakeInstallator {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// (installation, machine) pairs currently awaiting completion.
    pub fn active(&self) -> Vec<(String, String)> {
        self.active
            .lock()
            .unwrap()
            .iter()
            .map(|a| (a.installation.clone(), a.machine.clone()))
            .collect()
    }

    pub fn active_count(&self) -> usize {
        self.active.lock().unwrap().len()
    }

    /// Every dispatch ever seen, in order.
    pub fn started(&self) -> Vec<(String, String)> {
        self.started.lock().unwrap().clone()
    }

    pub fn started_count(&self) -> usize {
        self.started.lock().unwrap().len()
    }

    /// Report completion for one active installation.
    ///
    /// Panics if no matching installation is active; that is a test bug.
    pub fn finish(&self, installation: &str, machine: &str, outcome: InstallOutcome) {
        let callback = {
            let mut active = self.active.lock().unwrap();
            let position = active
                .iter()
                .position(|a| a.installation == installation && a.machine == machine)
                .unwrap_or_else(|| panic!("no active installation of {installation} on {machine}"));
            active.remove(position).callback
        };
        // Invoked outside the fake's own lock: the completion re-enters the
        // orchestrator, which may dispatch back into install_on_machine.
        callback(outcome);
    }
}

impl RemoteInstallator for FakeInstallator {
    fn install_on_machine(&self, installation: &str, machine: &str, on_finished: FinishedCallback) {
        self.started
            .lock()
            .unwrap()
            .push((installation.to_string(), machine.to_string()));
        self.active.lock().unwrap().push(ActiveInstallation {
            installation: installation.to_string(),
            machine: machine.to_string(),
            callback: on_finished,
        });
    }
}

/// Install a subscriber so failing tests print orchestrator traces.
#[allow(dead_code)]
pub fn init_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("debug")),
        )
        .with_test_writer()
        .try_init();
}
