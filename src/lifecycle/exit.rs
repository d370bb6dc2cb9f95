//! Process termination.

use std::sync::{Arc, Mutex};
use tokio::sync::watch;

/// Ends the process with an exit code.
pub trait Terminator: Send + Sync + 'static {
    fn exit(&self, code: i32);
}

/// Calls `std::process::exit`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessExit;

impl Terminator for ProcessExit {
    fn exit(&self, code: i32) {
        tracing::debug!(code, "Exiting process");
        std::process::exit(code);
    }
}

/// Records exit codes instead of exiting. Used by tests and embedders that
/// want to own the final exit themselves.
#[derive(Clone)]
pub struct ExitRecorder {
    codes: Arc<Mutex<Vec<i32>>>,
    first: watch::Sender<Option<i32>>,
}

impl ExitRecorder {
    pub fn new() -> Self {
        let (first, _) = watch::channel(None);
        Self {
            codes: Arc::new(Mutex::new(Vec::new())),
            first,
        }
    }

    /// Every code passed to `exit`, in order.
    pub fn codes(&self) -> Vec<i32> {
        self.codes
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// First recorded exit code, if any.
    pub fn code(&self) -> Option<i32> {
        *self.first.borrow()
    }

    /// Wait for the first exit code.
    pub async fn wait(&self) -> i32 {
        let mut rx = self.first.subscribe();
        // The sender lives in `self`, so the channel cannot close while we wait.
        rx.wait_for(Option::is_some)
            .await
            .ok()
            .and_then(|code| *code)
            .unwrap_or_default()
    }
}

impl Default for ExitRecorder {
    fn default() -> Self {
        Self::new()
    }
}

impl Terminator for ExitRecorder {
    fn exit(&self, code: i32) {
        self.codes
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(code);
        self.first.send_if_modified(|first| {
            if first.is_none() {
                *first = Some(code);
                true
            } else {
                false
            }
        });
    }
}
