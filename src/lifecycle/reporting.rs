//! Application-side notification sources.
//!
//! Rust has no runtime-level "unhandled rejection" or "event loop drained"
//! notifications, so the application reports them explicitly:
//! - `report_rejection` / `spawn_supervised` for failures nobody awaited
//! - `before_exit` / `run_until_idle` when the main work is done

use std::error::Error as StdError;
use std::future::Future;

use tokio::task::JoinHandle;

use crate::lifecycle::events::{Notification, ProcessEvents};
use crate::lifecycle::shutdown::panic_message;
use crate::lifecycle::state;
use crate::lifecycle::trigger::Fault;

/// Report an asynchronous failure that no caller will observe.
/// Returns the number of listeners notified.
pub fn report_rejection<E>(err: E) -> usize
where
    E: StdError + Send + Sync + 'static,
{
    report_rejection_on(ProcessEvents::global(), Fault::new(err))
}

pub fn report_rejection_on(events: &ProcessEvents, fault: Fault) -> usize {
    tracing::debug!(error = %fault, "Unobserved task failure");
    events.emit(Notification::UnhandledRejection(fault))
}

/// Spawn a detached task whose error or panic is reported as an unobserved rejection.
pub fn spawn_supervised<F, E>(fut: F) -> JoinHandle<()>
where
    F: Future<Output = Result<(), E>> + Send + 'static,
    E: StdError + Send + Sync + 'static,
{
    spawn_supervised_on(ProcessEvents::global().clone(), fut)
}

pub fn spawn_supervised_on<F, E>(events: ProcessEvents, fut: F) -> JoinHandle<()>
where
    F: Future<Output = Result<(), E>> + Send + 'static,
    E: StdError + Send + Sync + 'static,
{
    let inner = tokio::spawn(fut);
    tokio::spawn(async move {
        let fault = match inner.await {
            Ok(Ok(())) => return,
            Ok(Err(err)) => Fault::new(err),
            Err(join_err) => match join_err.try_into_panic() {
                Ok(payload) => Fault::msg(format!("task panicked: {}", panic_message(&*payload))),
                // Cancelled tasks were observed by whoever aborted them.
                Err(_) => return,
            },
        };
        report_rejection_on(&events, fault);
    })
}

/// Announce that the application has no more work pending.
///
/// Skipped while a shutdown is already in progress: the running cleanup is
/// itself pending work. Returns true if a listener took over the exit.
pub fn before_exit() -> bool {
    if state::is_closing() {
        return false;
    }
    ProcessEvents::global().emit(Notification::BeforeExit) > 0
}

/// Await the application's main future, then hand the exit to the registered
/// orchestrator.
///
/// Returns the future's output only when nothing is listening; otherwise it
/// waits for the orchestrator to end the process.
pub async fn run_until_idle<F: Future>(fut: F) -> F::Output {
    let output = fut.await;
    if state::is_closing() || before_exit() {
        std::future::pending::<()>().await;
    }
    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lifecycle::events::NotificationKind;
    use std::io;
    use std::sync::{Arc, Mutex};

    fn capture(events: &ProcessEvents) -> Arc<Mutex<Vec<String>>> {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        events.subscribe(
            NotificationKind::UnhandledRejection,
            Arc::new(move |n: &Notification| {
                if let Notification::UnhandledRejection(fault) = n {
                    sink.lock().unwrap().push(fault.to_string());
                }
            }),
        );
        seen
    }

    #[tokio::test]
    async fn test_supervised_error_is_reported() {
        let events = ProcessEvents::new();
        let seen = capture(&events);

        spawn_supervised_on(events.clone(), async {
            Err::<(), _>(io::Error::new(io::ErrorKind::Other, "socket reset"))
        })
        .await
        .unwrap();

        assert_eq!(*seen.lock().unwrap(), vec!["socket reset".to_string()]);
    }

    #[tokio::test]
    async fn test_supervised_success_is_silent() {
        let events = ProcessEvents::new();
        let seen = capture(&events);

        spawn_supervised_on(events.clone(), async { Ok::<(), io::Error>(()) })
            .await
            .unwrap();

        assert!(seen.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_supervised_panic_is_reported() {
        let events = ProcessEvents::new();
        let seen = capture(&events);

        spawn_supervised_on(events.clone(), async {
            if true {
                panic!("worker died");
            }
            Ok::<(), io::Error>(())
        })
        .await
        .unwrap();

        assert_eq!(*seen.lock().unwrap(), vec!["task panicked: worker died".to_string()]);
    }

    #[test]
    fn test_report_without_listeners() {
        let events = ProcessEvents::new();
        assert_eq!(report_rejection_on(&events, Fault::msg("nobody cares")), 0);
    }
}
