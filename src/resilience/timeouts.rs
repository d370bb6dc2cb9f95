//! Timeout enforcement.
//!
//! # Responsibilities
//! - Race a future against an optional deadline
//! - Report which side won
//!
//! # Design Decisions
//! - Uses Tokio's timeout facilities
//! - Losing the race does not cancel work the future has already spawned
//! - No deadline means the future alone is awaited

use std::future::Future;
use std::time::Duration;

/// Which side of a deadline race finished first.
#[derive(Debug, PartialEq, Eq)]
pub enum RaceOutcome<T> {
    Completed(T),
    TimedOut(Duration),
}

/// Await `fut`, giving up after `deadline` if one is set.
pub async fn race_deadline<F>(fut: F, deadline: Option<Duration>) -> RaceOutcome<F::Output>
where
    F: Future,
{
    match deadline {
        Some(limit) => match tokio::time::timeout(limit, fut).await {
            Ok(value) => RaceOutcome::Completed(value),
            Err(_) => RaceOutcome::TimedOut(limit),
        },
        None => RaceOutcome::Completed(fut.await),
    }
}
