//! Configuration module for the console runtime.
//!
//! Layered loading (defaults, files, `CONSOLEBOT_*` environment) and
//! validation for logging and console adapter settings.

pub mod error;
pub mod loader;
pub mod schema;
pub mod validation;

pub use error::{ConfigError, ConfigResult};
pub use loader::{ConfigLoader, ENV_PREFIX, Profile, load_config, load_config_from_file};
pub use schema::{LogFormat, LogLevel, LogOutput, LoggingConfig, RuntimeConfig, SpanEventConfig};
pub use validation::validate_config;
