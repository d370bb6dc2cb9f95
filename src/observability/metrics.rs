//! Shutdown metrics.
//!
//! # Metrics
//! - `shutdown_triggers_total` (counter): accepted first triggers by cause
//! - `shutdown_exits_total` (counter): exits by reason (`clean`, `timeout`, ...)
//! - `shutdown_forced_exits_total` (counter): exits caused by a repeated trigger
//!
//! # Design Decisions
//! - Facade only; the embedding process installs a recorder if it wants one
//! - Without a recorder every call is a no-op

use metrics::counter;

use crate::lifecycle::trigger::Trigger;

/// Record the trigger that started shutdown.
pub fn record_trigger(trigger: &Trigger) {
    counter!("shutdown_triggers_total", "cause" => trigger.kind()).increment(1);
}

/// Record the final exit.
pub fn record_exit(reason: &'static str, code: i32) {
    counter!("shutdown_exits_total", "reason" => reason, "code" => code.to_string()).increment(1);
}

/// Record a forced exit on a repeated trigger.
pub fn record_forced_exit() {
    counter!("shutdown_forced_exits_total").increment(1);
}
