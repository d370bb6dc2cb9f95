//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Sources (signals.rs, reporting.rs):
//!     SIGINT/SIGTERM, panics, unobserved task errors, "work done"
//!     → events.rs (process-wide notification bus)
//!
//! Trigger listener (shutdown.rs):
//!     five subscriptions per registration → Trigger (trigger.rs)
//!
//! Orchestrator (shutdown.rs):
//!     first Trigger  → escalate policy → state.rs closing flag
//!                    → cleanup.rs (user routine) raced against
//!                      resilience::timeouts → exit.rs (code 0 or 1)
//!     later Trigger  → log → exit.rs (code 1)
//! ```
//!
//! # Design Decisions
//! - Cleanup runs at most once per registration
//! - Shutdown has timeout: forced exit after deadline
//! - Multiple SIGTERM/SIGINT triggers forced shutdown
//! - Every abnormal path is fatal; errors are logged, never returned

pub mod cleanup;
pub mod events;
pub mod exit;
pub mod reporting;
pub mod shutdown;
pub mod signals;
pub mod state;
pub mod trigger;

pub use cleanup::{Cleanup, Done, Outcome};
pub use events::{Notification, NotificationKind, ProcessEvents};
pub use exit::{ExitRecorder, ProcessExit, Terminator};
pub use reporting::{before_exit, report_rejection, run_until_idle, spawn_supervised};
pub use shutdown::{register, register_default, Registration, ShutdownConfig, ShutdownHandle, ShutdownState};
pub use state::is_closing;
pub use trigger::{Fault, SignalName, Trigger};
