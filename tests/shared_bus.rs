//! Several registrations on one bus.

use std::sync::Arc;
use std::time::Duration;

use grace_shutdown::lifecycle::reporting::spawn_supervised_on;
use grace_shutdown::lifecycle::{ExitRecorder, Notification, NotificationKind, ProcessEvents};
use grace_shutdown::{Cleanup, Registration, ShutdownConfig, SignalName};

mod common;
use common::Calls;

fn register(events: &ProcessEvents, calls: &Calls) -> (grace_shutdown::ShutdownHandle, ExitRecorder) {
    let exits = ExitRecorder::new();
    let c = calls.clone();
    let handle = Registration::new(ShutdownConfig::default().without_logger())
        .events(events.clone())
        .terminator(Arc::new(exits.clone()))
        .install(Cleanup::from_async(move |_| async move {
            c.hit();
            Ok(())
        }))
        .unwrap();
    (handle, exits)
}

#[tokio::test]
async fn test_every_registration_sees_the_trigger() {
    let events = ProcessEvents::new();
    let calls = Calls::default();
    let (_a, exits_a) = register(&events, &calls);
    let (_b, exits_b) = register(&events, &calls);

    assert_eq!(events.listener_count(NotificationKind::Interrupt), 2);
    assert_eq!(events.emit(Notification::Signal(SignalName::Interrupt)), 2);

    assert_eq!(exits_a.wait().await, 0);
    assert_eq!(exits_b.wait().await, 0);
    assert_eq!(calls.count(), 2);
}

#[tokio::test]
async fn test_uninstall_leaves_other_registration() {
    let events = ProcessEvents::new();
    let calls = Calls::default();
    let (a, exits_a) = register(&events, &calls);
    let (_b, exits_b) = register(&events, &calls);

    a.uninstall();
    for kind in NotificationKind::ALL {
        assert_eq!(events.listener_count(kind), 1);
    }

    events.emit(Notification::Signal(SignalName::Terminate));
    assert_eq!(exits_b.wait().await, 0);
    tokio::time::sleep(Duration::from_millis(20)).await;
    assert_eq!(exits_a.code(), None);
    assert_eq!(calls.count(), 1);
}

#[tokio::test]
async fn test_supervised_task_failure_triggers_shutdown() {
    let events = ProcessEvents::new();
    let calls = Calls::default();
    let (_handle, exits) = register(&events, &calls);

    spawn_supervised_on(events.clone(), async {
        Err::<(), _>(std::io::Error::new(std::io::ErrorKind::Other, "upstream hung up"))
    });

    assert_eq!(
        tokio::time::timeout(Duration::from_secs(1), exits.wait()).await.unwrap(),
        1
    );
    assert_eq!(calls.count(), 1);
}
