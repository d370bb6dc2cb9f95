//! Process-wide notification bus.
//!
//! # Responsibilities
//! - Hold the subscriber list for each process notification
//! - Deliver every emitted notification to every current subscriber
//! - Let a subscriber remove exactly its own subscriptions
//!
//! # Design Decisions
//! - Handlers are invoked synchronously on the emitting thread; emitters
//!   include the panic hook, so handlers must not block
//! - The subscriber list is snapshotted before delivery; handlers may
//!   subscribe or unsubscribe while being invoked
//! - A private bus can be built for tests; `ProcessEvents::global()` is the
//!   one fed by OS signals and the panic hook

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, OnceLock};

use crate::lifecycle::trigger::{Fault, SignalName};

/// Kinds of process notification a subscriber can listen for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NotificationKind {
    Interrupt,
    Terminate,
    UncaughtFault,
    UnhandledRejection,
    BeforeExit,
}

impl NotificationKind {
    /// All kinds, in subscription order.
    pub const ALL: [NotificationKind; 5] = [
        NotificationKind::Terminate,
        NotificationKind::Interrupt,
        NotificationKind::UncaughtFault,
        NotificationKind::UnhandledRejection,
        NotificationKind::BeforeExit,
    ];
}

/// A single process notification.
#[derive(Debug, Clone)]
pub enum Notification {
    Signal(SignalName),
    UncaughtFault(Fault),
    UnhandledRejection(Fault),
    BeforeExit,
}

impl Notification {
    pub fn kind(&self) -> NotificationKind {
        match self {
            Notification::Signal(SignalName::Interrupt) => NotificationKind::Interrupt,
            Notification::Signal(SignalName::Terminate) => NotificationKind::Terminate,
            Notification::UncaughtFault(_) => NotificationKind::UncaughtFault,
            Notification::UnhandledRejection(_) => NotificationKind::UnhandledRejection,
            Notification::BeforeExit => NotificationKind::BeforeExit,
        }
    }
}

/// Identifies one subscription on one bus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

pub type Handler = Arc<dyn Fn(&Notification) + Send + Sync + 'static>;

struct Subscriber {
    id: SubscriptionId,
    kind: NotificationKind,
    handler: Handler,
}

struct Inner {
    next_id: AtomicU64,
    subscribers: Mutex<Vec<Subscriber>>,
}

/// Cheaply cloneable handle to a notification bus.
#[derive(Clone)]
pub struct ProcessEvents {
    inner: Arc<Inner>,
}

static GLOBAL: OnceLock<ProcessEvents> = OnceLock::new();

impl ProcessEvents {
    /// Create a new, isolated bus.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Inner {
                next_id: AtomicU64::new(1),
                subscribers: Mutex::new(Vec::new()),
            }),
        }
    }

    /// The bus fed by real OS signals, the panic hook and `before_exit`.
    pub fn global() -> &'static ProcessEvents {
        GLOBAL.get_or_init(ProcessEvents::new)
    }

    /// Whether two handles refer to the same bus.
    pub fn same_bus(&self, other: &ProcessEvents) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// Subscribe a handler to one notification kind.
    pub fn subscribe(&self, kind: NotificationKind, handler: Handler) -> SubscriptionId {
        let id = SubscriptionId(self.inner.next_id.fetch_add(1, Ordering::Relaxed));
        self.lock().push(Subscriber { id, kind, handler });
        id
    }

    /// Remove one subscription. Returns false if it was already gone.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut subs = self.lock();
        let before = subs.len();
        subs.retain(|s| s.id != id);
        subs.len() != before
    }

    /// Number of subscribers for a kind.
    pub fn listener_count(&self, kind: NotificationKind) -> usize {
        self.lock().iter().filter(|s| s.kind == kind).count()
    }

    /// Deliver a notification to its subscribers. Returns how many were invoked.
    pub fn emit(&self, notification: Notification) -> usize {
        let kind = notification.kind();
        let handlers: Vec<Handler> = self
            .lock()
            .iter()
            .filter(|s| s.kind == kind)
            .map(|s| s.handler.clone())
            .collect();

        tracing::trace!(?kind, listeners = handlers.len(), "Emitting process notification");
        for handler in &handlers {
            handler(&notification);
        }
        handlers.len()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<Subscriber>> {
        // A handler that panicked mid-emit must not disable the bus.
        self.inner
            .subscribers
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Default for ProcessEvents {
    fn default() -> Self {
        Self::new()
    }
}
