//! Graceful shutdown orchestration for a single long-running process.
//!
//! Register one cleanup routine; the first SIGINT, SIGTERM, uncaught fault,
//! unobserved task failure, normal exit, or manual `close()` runs it once,
//! bounded by a timeout. A second trigger forces an immediate exit.
//!
//! ```no_run
//! use grace_shutdown::{register_default, Cleanup};
//!
//! # async fn demo() -> Result<(), Box<dyn std::error::Error>> {
//! let handle = register_default(Cleanup::from_async(|trigger| async move {
//!     tracing::info!(%trigger, "closing sockets");
//!     Ok(())
//! }))?;
//! # handle.uninstall();
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod lifecycle;
pub mod observability;
pub mod resilience;

pub use error::{RegisterError, ShutdownError};
pub use lifecycle::{
    before_exit, is_closing, register, register_default, report_rejection, run_until_idle,
    spawn_supervised, Cleanup, Done, Fault, Outcome, Registration, ShutdownConfig, ShutdownHandle,
    ShutdownState, SignalName, Trigger,
};
pub use observability::logging::{Logger, TracingLogger};
