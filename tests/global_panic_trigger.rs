//! A panic outside the cleanup reaches the process-wide bus as a fault.
//!
//! Uses the real signal and panic sources, so it lives in its own binary.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use grace_shutdown::lifecycle::{ExitRecorder, NotificationKind, ProcessEvents};
use grace_shutdown::{Cleanup, Registration, ShutdownConfig, Trigger};

#[tokio::test(flavor = "multi_thread")]
async fn test_task_panic_triggers_fault_shutdown() {
    let exits = ExitRecorder::new();
    let cause: Arc<Mutex<Option<Trigger>>> = Arc::new(Mutex::new(None));
    let seen = cause.clone();

    let handle = Registration::new(ShutdownConfig::default().with_delay(Duration::from_millis(500)))
        .terminator(Arc::new(exits.clone()))
        .install(Cleanup::from_async(move |trigger| async move {
            *seen.lock().unwrap() = Some(trigger);
            Ok(())
        }))
        .expect("registration inside a runtime");
    assert_eq!(ProcessEvents::global().listener_count(NotificationKind::UncaughtFault), 1);

    let worker = tokio::spawn(async {
        if true {
            panic!("worker blew up");
        }
    });
    assert!(worker.await.unwrap_err().is_panic());

    let code = tokio::time::timeout(Duration::from_secs(2), exits.wait())
        .await
        .expect("process should have exited");
    assert_eq!(code, 1);
    assert_eq!(exits.codes(), vec![1]);

    let cause = cause.lock().unwrap().clone().expect("cleanup should have run");
    let fault = cause.fault().expect("cause should be a fault").to_string();
    assert!(fault.starts_with("panicked at "), "{}", fault);
    assert!(fault.ends_with(": worker blew up"), "{}", fault);

    handle.uninstall();
}
