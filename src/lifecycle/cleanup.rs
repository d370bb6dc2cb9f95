//! User cleanup routine and its completion protocol.
//!
//! A cleanup routine receives the [`Trigger`] and a single-use [`Done`] handle.
//! It may signal completion by resolving the future it returns, by calling
//! `Done`, or both. The first resolution wins; if both are already available
//! when polled, the explicit `Done` is preferred.

use std::future::Future;
use std::sync::{Arc, Mutex};

use futures_util::future::{BoxFuture, FutureExt};
use tokio::sync::oneshot;

use crate::lifecycle::trigger::{Fault, Trigger};

/// Result of a cleanup routine.
pub type Outcome = Result<(), Fault>;

type CleanupFn = Box<dyn FnOnce(Trigger, Done) -> BoxFuture<'static, Outcome> + Send>;

tokio::task_local! {
    static CLEANUP_SCOPE: ();
}

/// Whether the current task is the running cleanup routine.
/// Panics raised there are reported as cleanup failures, not uncaught faults.
pub(crate) fn in_cleanup() -> bool {
    CLEANUP_SCOPE.try_with(|_| ()).is_ok()
}

/// Run a future with the cleanup marker set.
pub(crate) async fn scoped<F: Future>(fut: F) -> F::Output {
    CLEANUP_SCOPE.scope((), fut).await
}

/// Explicit completion handle. Only the first call across all clones counts.
#[derive(Clone)]
pub struct Done {
    tx: Arc<Mutex<Option<oneshot::Sender<Outcome>>>>,
}

impl Done {
    fn new(tx: oneshot::Sender<Outcome>) -> Self {
        Self {
            tx: Arc::new(Mutex::new(Some(tx))),
        }
    }

    /// Report completion. Returns false if completion was already reported.
    pub fn complete(&self, outcome: Outcome) -> bool {
        let sender = self
            .tx
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .take();
        match sender {
            // The receiver may be gone if the race already ended; that is still the first call.
            Some(tx) => {
                let _ = tx.send(outcome);
                true
            }
            None => false,
        }
    }

    /// Report success.
    pub fn ok(&self) -> bool {
        self.complete(Ok(()))
    }

    /// Report failure.
    pub fn fail<E>(&self, err: E) -> bool
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        self.complete(Err(Fault::new(err)))
    }
}

/// A cleanup routine, invoked at most once.
pub struct Cleanup {
    f: CleanupFn,
}

impl Cleanup {
    /// Dual convention: the routine gets a `Done` handle and returns a future.
    pub fn new<F, Fut>(f: F) -> Self
    where
        F: FnOnce(Trigger, Done) -> Fut + Send + 'static,
        Fut: Future<Output = Outcome> + Send + 'static,
    {
        Self {
            f: Box::new(move |trigger, done| f(trigger, done).boxed()),
        }
    }

    /// Completion is the resolution of the returned future.
    pub fn from_async<F, Fut>(f: F) -> Self
    where
        F: FnOnce(Trigger) -> Fut + Send + 'static,
        Fut: Future<Output = Outcome> + Send + 'static,
    {
        Self::new(move |trigger, _done| f(trigger))
    }

    /// Completion is reported only through `Done`.
    pub fn from_callback<F>(f: F) -> Self
    where
        F: FnOnce(Trigger, Done) + Send + 'static,
    {
        Self::new(move |trigger, done| {
            f(trigger, done);
            std::future::pending::<Outcome>()
        })
    }

    /// Invoke the routine lazily and resolve with the first completion signal.
    ///
    /// A `Done` that is dropped without being called never resolves; only the
    /// returned future (or a timeout) can end the wait in that case.
    pub(crate) fn invoke(self, trigger: Trigger) -> BoxFuture<'static, Outcome> {
        let f = self.f;
        async move {
            let (tx, rx) = oneshot::channel();
            let returned = f(trigger, Done::new(tx));
            let explicit = async move {
                match rx.await {
                    Ok(outcome) => outcome,
                    Err(_) => std::future::pending().await,
                }
            };
            tokio::select! {
                biased;
                outcome = explicit => outcome,
                outcome = returned => outcome,
            }
        }
        .boxed()
    }
}

impl std::fmt::Debug for Cleanup {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Cleanup").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;
    use std::time::Duration;

    fn boom() -> io::Error {
        io::Error::new(io::ErrorKind::Other, "boom")
    }

    #[tokio::test]
    async fn test_async_outcome() {
        let cleanup = Cleanup::from_async(|_| async { Ok(()) });
        assert!(cleanup.invoke(Trigger::Manual).await.is_ok());

        let cleanup = Cleanup::from_async(|_| async { Err(Fault::new(boom())) });
        let err = cleanup.invoke(Trigger::Manual).await.unwrap_err();
        assert_eq!(err.to_string(), "boom");
    }

    #[tokio::test]
    async fn test_callback_outcome_after_delay() {
        let cleanup = Cleanup::from_callback(|_, done| {
            tokio::spawn(async move {
                tokio::time::sleep(Duration::from_millis(10)).await;
                done.ok();
            });
        });
        assert!(cleanup.invoke(Trigger::NormalExit).await.is_ok());
    }

    #[tokio::test]
    async fn test_only_first_done_counts() {
        let cleanup = Cleanup::from_callback(|_, done| {
            let second = done.clone();
            assert!(done.fail(boom()));
            assert!(!second.ok());
        });
        assert!(cleanup.invoke(Trigger::Manual).await.is_err());
    }

    #[tokio::test]
    async fn test_explicit_done_wins_tie() {
        let cleanup = Cleanup::new(|_, done| {
            done.fail(boom());
            async { Ok(()) }
        });
        assert!(cleanup.invoke(Trigger::Manual).await.is_err());
    }

    #[tokio::test]
    async fn test_returned_future_wins_when_first() {
        let cleanup = Cleanup::new(|_, done| async move {
            tokio::spawn(async move {
                tokio::time::sleep(Duration::from_millis(50)).await;
                done.fail(io::Error::new(io::ErrorKind::Other, "late"));
            });
            Ok(())
        });
        assert!(cleanup.invoke(Trigger::Manual).await.is_ok());
    }

    #[tokio::test]
    async fn test_dropped_done_never_resolves() {
        let cleanup = Cleanup::from_callback(|_, done| drop(done));
        let res = tokio::time::timeout(Duration::from_millis(20), cleanup.invoke(Trigger::Manual)).await;
        assert!(res.is_err());
    }

    #[tokio::test]
    async fn test_trigger_is_passed_through() {
        let cleanup = Cleanup::from_async(|trigger| async move {
            assert!(trigger.is_fault());
            Ok(())
        });
        assert!(cleanup.invoke(Trigger::Fault(Fault::msg("x"))).await.is_ok());
    }

    #[tokio::test]
    async fn test_scope_marker() {
        assert!(!in_cleanup());
        assert!(scoped(async { in_cleanup() }).await);
    }
}
