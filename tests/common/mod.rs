//! Shared utilities for shutdown integration tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use grace_shutdown::lifecycle::{ExitRecorder, ProcessEvents};
use tokio::sync::Notify;
use grace_shutdown::{Cleanup, Registration, ShutdownConfig, ShutdownHandle};

/// A registration wired to a private bus and a recording terminator.
#[allow(dead_code)]
pub struct Harness {
    pub handle: ShutdownHandle,
    pub events: ProcessEvents,
    pub exits: ExitRecorder,
    pub logs: Arc<Mutex<Vec<String>>>,
}

#[allow(dead_code)]
impl Harness {
    pub fn install(config: ShutdownConfig, cleanup: Cleanup) -> Self {
        let events = ProcessEvents::new();
        let exits = ExitRecorder::new();
        let logs = Arc::new(Mutex::new(Vec::new()));
        let sink = logs.clone();

        let handle = Registration::new(config.with_logger(Arc::new(move |msg: &str| {
            sink.lock().unwrap().push(msg.to_string());
        })))
        .events(events.clone())
        .terminator(Arc::new(exits.clone()))
        .install(cleanup)
        .expect("registration inside a runtime");

        Self {
            handle,
            events,
            exits,
            logs,
        }
    }

    /// Wait for the exit code, failing the test if none arrives in time.
    pub async fn exit_code(&self, within: Duration) -> i32 {
        tokio::time::timeout(within, self.exits.wait())
            .await
            .expect("process should have exited")
    }

    pub fn logs(&self) -> Vec<String> {
        self.logs.lock().unwrap().clone()
    }
}

/// Counts cleanup invocations.
#[derive(Clone, Default)]
pub struct Calls(Arc<AtomicUsize>);

#[allow(dead_code)]
impl Calls {
    pub fn hit(&self) {
        self.0.fetch_add(1, Ordering::SeqCst);
    }

    pub fn count(&self) -> usize {
        self.0.load(Ordering::SeqCst)
    }
}

/// Lets a test wait until the cleanup routine is actually running.
#[derive(Clone, Default)]
pub struct Started(Arc<Notify>);

#[allow(dead_code)]
impl Started {
    pub fn mark(&self) {
        self.0.notify_one();
    }

    pub async fn wait(&self) {
        tokio::time::timeout(Duration::from_secs(1), self.0.notified())
            .await
            .expect("cleanup should have started");
    }
}
