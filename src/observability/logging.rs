//! Structured logging.
//!
//! # Responsibilities
//! - Initialize the tracing subscriber
//! - Provide the error sink handed to the shutdown orchestrator
//!
//! # Design Decisions
//! - Uses tracing crate for structured logging
//! - JSON format for production, compact format for development
//! - RUST_LOG overrides the configured level

use std::error::Error as StdError;
use std::sync::Arc;

use tracing_subscriber::util::{SubscriberInitExt, TryInitError};
use tracing_subscriber::{fmt, layer::SubscriberExt, EnvFilter};

use crate::config::schema::{LogFormat, LoggingSettings};

/// Sink for errors reported during shutdown.
pub trait Logger: Send + Sync {
    fn error(&self, message: &str);

    fn error_value(&self, err: &(dyn StdError + 'static)) {
        self.error(&err.to_string());
    }
}

/// Default sink: forwards to `tracing::error!`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingLogger;

impl Logger for TracingLogger {
    fn error(&self, message: &str) {
        tracing::error!(target: "grace_shutdown", "{}", message);
    }

    fn error_value(&self, err: &(dyn StdError + 'static)) {
        tracing::error!(target: "grace_shutdown", error = %err, "{:?}", err);
    }
}

impl<F> Logger for F
where
    F: Fn(&str) + Send + Sync,
{
    fn error(&self, message: &str) {
        self(message)
    }
}

/// The sink used when a config does not name one.
pub fn default_logger() -> Arc<dyn Logger> {
    Arc::new(TracingLogger)
}

/// Install the global tracing subscriber.
pub fn init_logging(settings: &LoggingSettings) -> Result<(), TryInitError> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(settings.level.as_str()));

    let registry = tracing_subscriber::registry().with(filter);
    match settings.format {
        LogFormat::Json => registry.with(fmt::layer().json()).try_init(),
        LogFormat::Compact => registry.with(fmt::layer().compact()).try_init(),
    }
}
