//! Configuration schema definitions.
//!
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::lifecycle::shutdown::ShutdownConfig;

/// Root configuration file.
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq)]
#[serde(default)]
pub struct Settings {
    /// Shutdown orchestration settings.
    pub shutdown: ShutdownSettings,

    /// Logging settings.
    pub logging: LoggingSettings,
}

/// Shutdown orchestration settings.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ShutdownSettings {
    /// Time allowed for cleanup before the process is forced out.
    pub delay_ms: u64,

    /// Race cleanup against `delay_ms`. When false, cleanup alone is awaited.
    pub timeout: bool,

    /// Report cleanup and escalation errors through the logger.
    pub log_errors: bool,
}

impl Default for ShutdownSettings {
    fn default() -> Self {
        Self {
            delay_ms: 10_000,
            timeout: true,
            log_errors: true,
        }
    }
}

impl ShutdownSettings {
    /// Runtime configuration for the orchestrator.
    pub fn to_shutdown_config(&self) -> ShutdownConfig {
        let config = ShutdownConfig::default();
        let config = if self.timeout {
            config.with_delay(Duration::from_millis(self.delay_ms))
        } else {
            config.without_timeout()
        };
        if self.log_errors {
            config
        } else {
            config.without_logger()
        }
    }
}

/// Output format for log lines.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Compact,
    Json,
}

/// Logging settings.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct LoggingSettings {
    /// Default filter directive (e.g. "info"); RUST_LOG takes precedence.
    pub level: String,

    /// Output format.
    pub format: LogFormat,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Compact,
        }
    }
}
