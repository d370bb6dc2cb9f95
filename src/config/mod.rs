//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → Settings (validated, immutable)
//!     → ShutdownSettings::to_shutdown_config() → orchestrator
//!     → LoggingSettings → observability::logging::init_logging
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; the orchestrator keeps its own copy
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, ConfigError};
pub use schema::{LogFormat, LoggingSettings, Settings, ShutdownSettings};
