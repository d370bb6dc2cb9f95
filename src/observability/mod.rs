//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Shutdown orchestrator produces:
//!     → logging.rs (Logger sink for user-visible errors, tracing events)
//!     → metrics.rs (trigger / exit counters)
//! ```
//!
//! # Design Decisions
//! - Structured logging (JSON) for machine parsing
//! - The orchestrator logs through a `Logger` trait object so callers can
//!   redirect or silence error reports without touching tracing
//! - Metrics are cheap (atomic increments)

pub mod logging;
pub mod metrics;
