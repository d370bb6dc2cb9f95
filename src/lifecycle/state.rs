//! Process-wide "shutdown in progress" flag.
//! Written only by the orchestrator; any code may read it to stop taking new work.
//!
//! Notes:
//! - One-way flag: it never goes back to false in a running process.
//! - SeqCst so a reader that sees `true` also sees the escalated policy.

use std::sync::atomic::{AtomicBool, Ordering};

static CLOSING: AtomicBool = AtomicBool::new(false);

/// Whether any registration has begun shutting down.
#[inline]
pub fn is_closing() -> bool {
    CLOSING.load(Ordering::SeqCst)
}

#[inline]
pub(crate) fn mark_closing() {
    CLOSING.store(true, Ordering::SeqCst);
}
