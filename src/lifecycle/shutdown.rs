//! Shutdown orchestration.
//!
//! # State Machine
//! ```text
//! Idle --[first trigger]--> ShuttingDown --[cleanup race ends]--> exit(0|1)
//! ShuttingDown --[any further trigger]--> exit(1), cleanup not re-run
//! ```
//!
//! The transition is a single compare-and-swap on the registration's state
//! cell. The handlers subscribed at registration never change; they read the
//! cell to decide between "start shutdown" and "escalate". Because the swap
//! happens before cleanup is invoked, a trigger arriving during cleanup always
//! sees the escalation policy.

use std::any::Any;
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::runtime::Handle;

use crate::error::{RegisterError, ShutdownError};
use crate::lifecycle::cleanup::{self, Cleanup};
use crate::lifecycle::events::{Notification, NotificationKind, ProcessEvents, SubscriptionId};
use crate::lifecycle::exit::{ProcessExit, Terminator};
use crate::lifecycle::signals;
use crate::lifecycle::state;
use crate::lifecycle::trigger::{Fault, Trigger};
use crate::observability::logging::{default_logger, Logger};
use crate::observability::metrics;
use crate::resilience::timeouts::{race_deadline, RaceOutcome};

/// Default time allowed for cleanup.
pub const DEFAULT_DELAY: Duration = Duration::from_millis(10_000);

const IDLE: u8 = 0;
const SHUTTING_DOWN: u8 = 1;

/// Orchestrator configuration. Immutable once registered.
#[derive(Clone)]
pub struct ShutdownConfig {
    delay: Option<Duration>,
    logger: Option<Arc<dyn Logger>>,
}

impl Default for ShutdownConfig {
    fn default() -> Self {
        Self {
            delay: Some(DEFAULT_DELAY),
            logger: Some(default_logger()),
        }
    }
}

impl ShutdownConfig {
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Await cleanup without a deadline.
    pub fn without_timeout(mut self) -> Self {
        self.delay = None;
        self
    }

    pub fn with_logger(mut self, logger: Arc<dyn Logger>) -> Self {
        self.logger = Some(logger);
        self
    }

    /// Disable error reporting.
    pub fn without_logger(mut self) -> Self {
        self.logger = None;
        self
    }

    pub fn delay(&self) -> Option<Duration> {
        self.delay
    }

    pub fn logger(&self) -> Option<&Arc<dyn Logger>> {
        self.logger.as_ref()
    }
}

impl fmt::Debug for ShutdownConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ShutdownConfig")
            .field("delay", &self.delay)
            .field("logger", &self.logger.is_some())
            .finish()
    }
}

/// Per-registration shutdown state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownState {
    Idle,
    ShuttingDown,
}

struct Orchestrator {
    config: ShutdownConfig,
    cleanup: Mutex<Option<Cleanup>>,
    state: AtomicU8,
    exited: AtomicBool,
    terminator: Arc<dyn Terminator>,
    runtime: Handle,
}

impl Orchestrator {
    fn state(&self) -> ShutdownState {
        match self.state.load(Ordering::SeqCst) {
            IDLE => ShutdownState::Idle,
            _ => ShutdownState::ShuttingDown,
        }
    }

    fn on_notification(self: &Arc<Self>, notification: &Notification) {
        let trigger = match notification {
            Notification::Signal(name) => Trigger::Signal(*name),
            Notification::UncaughtFault(err) | Notification::UnhandledRejection(err) => {
                Trigger::Fault(err.clone())
            }
            Notification::BeforeExit => Trigger::NormalExit,
        };
        self.dispatch(trigger);
    }

    fn dispatch(self: &Arc<Self>, trigger: Trigger) {
        match self
            .state
            .compare_exchange(IDLE, SHUTTING_DOWN, Ordering::SeqCst, Ordering::SeqCst)
        {
            Ok(_) => self.begin(trigger),
            Err(_) => self.escalate(trigger),
        }
    }

    fn begin(self: &Arc<Self>, trigger: Trigger) {
        state::mark_closing();
        metrics::record_trigger(&trigger);
        tracing::info!(
            cause = %trigger,
            delay_ms = self.config.delay.map(|d| d.as_millis() as u64),
            "Shutdown triggered, running cleanup"
        );

        let cleanup = self
            .cleanup
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .take();
        let Some(cleanup) = cleanup else {
            // Only reachable if the state cell was bypassed; never run cleanup twice.
            tracing::warn!("Cleanup already consumed");
            return;
        };

        let this = self.clone();
        self.runtime.spawn(async move {
            let result = this.run(cleanup, trigger).await;
            this.terminate(result);
        });
    }

    async fn run(&self, cleanup: Cleanup, trigger: Trigger) -> Result<(), ShutdownError> {
        let task = tokio::spawn(cleanup::scoped(cleanup.invoke(trigger.clone())));

        let fault = match race_deadline(task, self.config.delay).await {
            RaceOutcome::TimedOut(limit) => {
                tracing::warn!(delay_ms = limit.as_millis() as u64, "Cleanup timed out");
                return Err(ShutdownError::TimeoutExceeded(limit));
            }
            RaceOutcome::Completed(Ok(Ok(()))) => None,
            RaceOutcome::Completed(Ok(Err(fault))) => Some(fault),
            RaceOutcome::Completed(Err(join_err)) => Some(match join_err.try_into_panic() {
                Ok(payload) => Fault::msg(format!("cleanup panicked: {}", panic_message(&*payload))),
                Err(join_err) => Fault::msg(join_err.to_string()),
            }),
        };

        if let Some(fault) = fault {
            if let Some(logger) = &self.config.logger {
                logger.error_value(fault.as_error());
            }
            return Err(ShutdownError::CleanupFailed(fault));
        }

        match trigger {
            Trigger::Fault(fault) => Err(ShutdownError::TriggerWasFault(fault)),
            _ => Ok(()),
        }
    }

    fn escalate(&self, trigger: Trigger) {
        if let Some(logger) = &self.config.logger {
            match &trigger {
                Trigger::Fault(fault) => {
                    logger.error("second error, exiting");
                    logger.error_value(fault.as_error());
                }
                Trigger::Signal(name) => logger.error(&format!("second {}, exiting", name)),
                other => logger.error(&format!("second {}, exiting", other.kind())),
            }
        }
        metrics::record_forced_exit();
        self.terminate(Err(ShutdownError::RepeatedTrigger(trigger.to_string())));
    }

    /// Exit once. Later calls are dropped; with a real process exit they never happen.
    fn terminate(&self, result: Result<(), ShutdownError>) {
        if self.exited.swap(true, Ordering::SeqCst) {
            return;
        }
        let (reason, code) = match &result {
            Ok(()) => ("clean", 0),
            Err(err) => (err.reason(), err.exit_code()),
        };
        match &result {
            Ok(()) => tracing::info!(code, "Shutdown complete"),
            Err(err) => tracing::warn!(code, reason, error = %err, "Shutdown ended abnormally"),
        }
        metrics::record_exit(reason, code);
        self.terminator.exit(code);
    }
}

/// Extract a readable message from a panic payload.
pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "Box<dyn Any>".to_string()
    }
}

/// Handle returned by registration. Dropping it does not uninstall.
pub struct ShutdownHandle {
    orchestrator: Arc<Orchestrator>,
    events: ProcessEvents,
    subscriptions: Mutex<Vec<SubscriptionId>>,
}

impl ShutdownHandle {
    /// Start shutdown as if a trigger had arrived. A second call escalates.
    pub fn close(&self) {
        self.orchestrator.dispatch(Trigger::Manual);
    }

    /// Remove this registration's subscriptions. Safe to call at any time.
    ///
    /// The OS signal streams stay open after the last registration is gone,
    /// because tokio cannot hand a signal back to its default disposition. A
    /// SIGINT or SIGTERM arriving with no subscriber is then ignored by this
    /// crate, leaving any `tokio::signal::ctrl_c()` handler of the application
    /// in charge. Opt into [`Registration::default_signal_action`] to have it
    /// exit with 128 + signo instead.
    pub fn uninstall(&self) {
        let ids: Vec<SubscriptionId> = self
            .subscriptions
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .drain(..)
            .collect();
        for id in ids {
            self.events.unsubscribe(id);
        }
        tracing::debug!("Shutdown listeners uninstalled");
    }

    pub fn state(&self) -> ShutdownState {
        self.orchestrator.state()
    }
}

impl fmt::Debug for ShutdownHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ShutdownHandle")
            .field("state", &self.state())
            .field("config", &self.orchestrator.config)
            .finish()
    }
}

/// Builder for a registration against a chosen bus and terminator.
pub struct Registration {
    config: ShutdownConfig,
    events: Option<ProcessEvents>,
    terminator: Arc<dyn Terminator>,
    default_signal_action: bool,
}

impl Registration {
    pub fn new(config: ShutdownConfig) -> Self {
        Self {
            config,
            events: None,
            terminator: Arc::new(ProcessExit),
            default_signal_action: false,
        }
    }

    /// Exit with 128 + signo when SIGINT/SIGTERM arrives after every
    /// registration has been uninstalled. Off by default.
    ///
    /// Applies process-wide and cannot be switched off again. Has no effect on
    /// a private bus.
    pub fn default_signal_action(mut self, enabled: bool) -> Self {
        self.default_signal_action = enabled;
        self
    }

    /// Subscribe on this bus instead of the process-wide one.
    pub fn events(mut self, events: ProcessEvents) -> Self {
        self.events = Some(events);
        self
    }

    /// End the process through this terminator instead of `std::process::exit`.
    pub fn terminator(mut self, terminator: Arc<dyn Terminator>) -> Self {
        self.terminator = terminator;
        self
    }

    /// Install the five subscriptions and return the handle.
    ///
    /// Must be called from within a tokio runtime. On the process-wide bus this
    /// also installs the OS signal and panic sources once per process.
    pub fn install(self, cleanup: Cleanup) -> Result<ShutdownHandle, RegisterError> {
        let runtime = Handle::try_current().map_err(|_| RegisterError::NoRuntime)?;

        let events = match self.events {
            Some(events) => events,
            None => ProcessEvents::global().clone(),
        };
        if events.same_bus(ProcessEvents::global()) {
            signals::install_process_sources(&runtime)?;
            if self.default_signal_action {
                signals::enable_default_action();
            }
        }

        let orchestrator = Arc::new(Orchestrator {
            config: self.config,
            cleanup: Mutex::new(Some(cleanup)),
            state: AtomicU8::new(IDLE),
            exited: AtomicBool::new(false),
            terminator: self.terminator,
            runtime,
        });

        let subscriptions = NotificationKind::ALL
            .iter()
            .map(|kind| {
                let orchestrator = orchestrator.clone();
                events.subscribe(
                    *kind,
                    Arc::new(move |n: &Notification| orchestrator.on_notification(n)),
                )
            })
            .collect();

        tracing::debug!(config = ?orchestrator.config, "Shutdown listeners installed");
        Ok(ShutdownHandle {
            orchestrator,
            events,
            subscriptions: Mutex::new(subscriptions),
        })
    }
}

/// Register a cleanup routine on the process-wide bus.
pub fn register(config: ShutdownConfig, cleanup: Cleanup) -> Result<ShutdownHandle, RegisterError> {
    Registration::new(config).install(cleanup)
}

/// Register with the default configuration.
pub fn register_default(cleanup: Cleanup) -> Result<ShutdownHandle, RegisterError> {
    register(ShutdownConfig::default(), cleanup)
}
