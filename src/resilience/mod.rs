//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Shutdown cleanup:
//!     → timeouts.rs (race cleanup against the configured delay)
//! ```
//!
//! # Design Decisions
//! - Timeouts are non-negotiable unless explicitly disabled
//! - A lost race is final; nothing is retried

pub mod timeouts;
