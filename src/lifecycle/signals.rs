//! OS signal and panic sources for the process-wide bus.
//!
//! # Responsibilities
//! - Forward SIGINT/SIGTERM into `ProcessEvents::global()`
//! - Forward panics outside the running cleanup as uncaught faults
//!
//! # Design Decisions
//! - Uses Tokio's signal handling (async-safe)
//! - Installed once per process, on first registration against the global bus
//! - Both signal streams are opened before any pump is spawned, so a failed
//!   install leaves nothing running
//! - Tokio never restores a signal's default disposition. A signal that
//!   arrives with no subscriber is ignored unless a registration opted into
//!   the default action (exit with 128 + signo)
//! - The panic hook chains to the hook that was installed before it

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use tokio::runtime::Handle;

use crate::error::RegisterError;
use crate::lifecycle::cleanup;
use crate::lifecycle::events::{Notification, ProcessEvents};
use crate::lifecycle::shutdown::panic_message;
use crate::lifecycle::trigger::{Fault, SignalName};

static INSTALLED: Mutex<bool> = Mutex::new(false);
static DEFAULT_ACTION: AtomicBool = AtomicBool::new(false);

/// Install signal pumps and the panic hook, once per process.
pub(crate) fn install_process_sources(runtime: &Handle) -> Result<(), RegisterError> {
    let mut installed = INSTALLED.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
    if *installed {
        return Ok(());
    }

    install_signal_pumps(runtime)?;
    install_panic_hook();
    *installed = true;

    tracing::debug!("Process shutdown sources installed");
    Ok(())
}

/// Exit with 128 + signo when a signal finds no subscriber. Sticky once enabled.
pub(crate) fn enable_default_action() {
    DEFAULT_ACTION.store(true, Ordering::SeqCst);
}

pub(crate) fn default_action_enabled() -> bool {
    DEFAULT_ACTION.load(Ordering::SeqCst)
}

#[cfg(unix)]
fn install_signal_pumps(runtime: &Handle) -> Result<(), RegisterError> {
    use tokio::signal::unix::signal;

    let _guard = runtime.enter();
    for (name, mut stream) in open_streams(signal)? {
        runtime.spawn(async move {
            while stream.recv().await.is_some() {
                deliver(name);
            }
        });
    }
    Ok(())
}

/// Open every stream or none.
#[cfg(unix)]
fn open_streams<S, F>(mut open: F) -> Result<Vec<(SignalName, S)>, RegisterError>
where
    F: FnMut(tokio::signal::unix::SignalKind) -> std::io::Result<S>,
{
    use tokio::signal::unix::SignalKind;

    [
        (SignalName::Interrupt, SignalKind::interrupt()),
        (SignalName::Terminate, SignalKind::terminate()),
    ]
    .into_iter()
    .map(|(name, kind)| {
        open(kind)
            .map(|stream| (name, stream))
            .map_err(|source| RegisterError::Signal {
                signal: name.as_str(),
                source,
            })
    })
    .collect()
}

#[cfg(not(unix))]
fn install_signal_pumps(runtime: &Handle) -> Result<(), RegisterError> {
    runtime.spawn(async {
        loop {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "Ctrl+C listener failed");
                return;
            }
            deliver(SignalName::Interrupt);
        }
    });
    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Disposition {
    Delivered(usize),
    Ignored,
    Exit(i32),
}

fn dispose(name: SignalName, listeners: usize, default_action: bool) -> Disposition {
    match (listeners, default_action) {
        (0, true) => Disposition::Exit(name.default_exit_code()),
        (0, false) => Disposition::Ignored,
        (n, _) => Disposition::Delivered(n),
    }
}

fn deliver(name: SignalName) {
    tracing::info!(signal = %name, "Signal received");
    let listeners = ProcessEvents::global().emit(Notification::Signal(name));
    match dispose(name, listeners, default_action_enabled()) {
        Disposition::Delivered(listeners) => {
            tracing::trace!(signal = %name, listeners, "Signal delivered");
        }
        Disposition::Ignored => {
            tracing::debug!(signal = %name, "No shutdown listener installed, signal ignored");
        }
        Disposition::Exit(code) => {
            tracing::warn!(signal = %name, code, "No shutdown listener installed, applying default action");
            std::process::exit(code);
        }
    }
}

fn install_panic_hook() {
    let previous = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        previous(info);
        if cleanup::in_cleanup() {
            return;
        }
        let message = panic_message(info.payload());
        let fault = match info.location() {
            Some(loc) => Fault::msg(format!("panicked at {}:{}: {}", loc.file(), loc.line(), message)),
            None => Fault::msg(format!("panicked: {}", message)),
        };
        ProcessEvents::global().emit(Notification::UncaughtFault(fault));
    }));
}
