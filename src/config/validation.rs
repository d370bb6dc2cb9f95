//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (delay > 0 when the timeout is on)
//! - Validate the log filter directive
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: Settings → Result<(), Vec<ValidationError>>

use thiserror::Error;
use tracing_subscriber::EnvFilter;

use crate::config::schema::Settings;

/// A single semantic problem in a config file.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("shutdown.delay_ms must be greater than 0 when shutdown.timeout is enabled")]
    ZeroDelay,

    #[error("logging.level {0:?} is not a valid filter directive")]
    InvalidLevel(String),
}

/// Check a parsed config, collecting every problem.
pub fn validate_config(settings: &Settings) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if settings.shutdown.timeout && settings.shutdown.delay_ms == 0 {
        errors.push(ValidationError::ZeroDelay);
    }

    let level = settings.logging.level.trim();
    if level.is_empty() || EnvFilter::try_new(level).is_err() {
        errors.push(ValidationError::InvalidLevel(settings.logging.level.clone()));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        assert!(validate_config(&Settings::default()).is_ok());
    }

    #[test]
    fn test_collects_all_errors() {
        let mut settings = Settings::default();
        settings.shutdown.delay_ms = 0;
        settings.logging.level = "  ".to_string();

        let errors = validate_config(&settings).unwrap_err();
        assert_eq!(errors.len(), 2);
        assert_eq!(errors[0], ValidationError::ZeroDelay);
    }

    #[test]
    fn test_zero_delay_allowed_without_timeout() {
        let mut settings = Settings::default();
        settings.shutdown.delay_ms = 0;
        settings.shutdown.timeout = false;
        assert!(validate_config(&settings).is_ok());
    }
}
