//! Error types for shutdown orchestration.
//!
//! # Design Decisions
//! - `ShutdownError` is terminal: every variant ends the process with code 1
//! - `RegisterError` is the only error a caller ever receives

use std::time::Duration;
use thiserror::Error;

use crate::lifecycle::trigger::Fault;

/// Why a shutdown sequence ended abnormally.
#[derive(Debug, Error)]
pub enum ShutdownError {
    /// The cleanup routine did not finish before the delay elapsed.
    #[error("cleanup did not complete within {}ms", .0.as_millis())]
    TimeoutExceeded(Duration),

    /// The cleanup routine reported an error or panicked.
    #[error("cleanup failed: {0}")]
    CleanupFailed(Fault),

    /// Cleanup succeeded but shutdown was started by a fault.
    #[error("shutdown triggered by fault: {0}")]
    TriggerWasFault(Fault),

    /// A second signal or fault arrived while already shutting down.
    #[error("repeated trigger while shutting down: {0}")]
    RepeatedTrigger(String),
}

impl ShutdownError {
    /// Process exit code for this failure.
    pub fn exit_code(&self) -> i32 {
        1
    }

    /// Short label used for metrics.
    pub fn reason(&self) -> &'static str {
        match self {
            ShutdownError::TimeoutExceeded(_) => "timeout",
            ShutdownError::CleanupFailed(_) => "cleanup_failed",
            ShutdownError::TriggerWasFault(_) => "fault",
            ShutdownError::RepeatedTrigger(_) => "repeated",
        }
    }
}

/// Failure while installing shutdown instrumentation.
#[derive(Debug, Error)]
pub enum RegisterError {
    #[error("no tokio runtime is running; register from within a runtime")]
    NoRuntime,

    #[error("failed to install {signal} handler: {source}")]
    Signal {
        signal: &'static str,
        #[source]
        source: std::io::Error,
    },
}
