//! Collaborator contract consumed by the orchestrator.

use crate::types::InstallOutcome;

/// Completion callback bound to one dispatched unit.
///
/// `FnOnce` makes reporting twice for the same unit unrepresentable; the
/// orchestrator additionally validates the unit state when the callback
/// lands.
pub type FinishedCallback = Box<dyn FnOnce(InstallOutcome) + Send + 'static>;

/// A remote-installation backend.
///
/// Contract:
/// - `install_on_machine` must return promptly; the actual install runs
///   asynchronously (spawned task, worker thread, network call, ...).
/// - `on_finished` must be invoked exactly once per call, eventually, from
///   any thread. It must not be invoked before `install_on_machine`
///   returns.
/// - A failed install is reported through the callback as
///   [`InstallOutcome::Failed`], never by panicking or swallowing the
///   callback.
pub trait RemoteInstallator: Send + Sync {
    /// Start installing `installation` on `machine`.
    fn install_on_machine(&self, installation: &str, machine: &str, on_finished: FinishedCallback);
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    /// Minimal installator that completes synchronously after returning
    /// would be a contract violation, so the mock stores the callback and
    /// the test drives it explicitly.
    struct MockInstallator {
        callbacks: std::sync::Mutex<Vec<FinishedCallback>>,
    }

    impl RemoteInstallator for MockInstallator {
        fn install_on_machine(
            &self,
            _installation: &str,
            _machine: &str,
            on_finished: FinishedCallback,
        ) {
            self.callbacks.lock().unwrap().push(on_finished);
        }
    }

    #[test]
    fn callback_fires_once_with_outcome() {
        let fired = Arc::new(AtomicUsize::new(0));
        let mock = MockInstallator {
            callbacks: std::sync::Mutex::new(Vec::new()),
        };

        let counter = Arc::clone(&fired);
        mock.install_on_machine(
            "WorkX",
            "ComputerX",
            Box::new(move |outcome| {
                assert_eq!(outcome, InstallOutcome::Succeeded);
                counter.fetch_add(1, Ordering::SeqCst);
            }),
        );
        assert_eq!(fired.load(Ordering::SeqCst), 0);

        let callback = mock.callbacks.lock().unwrap().pop().unwrap();
        callback(InstallOutcome::Succeeded);
        assert_eq!(fired.load(Ordering::SeqCst), 1);
    }
}
