//! Consolebot Runtime - process orchestration for the console adapter.
//!
//! This crate provides:
//! - Layered configuration loading and validation (`config`)
//! - Logging setup that routes output through the console's log sink (`logging`)
//! - Runtime orchestration with signal handling (`ConsoleRuntime`)
//!
//! ```ignore
//! use consolebot_runtime::ConsoleRuntime;
//! use consolebot_adapter::dispatcher_fn;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let runtime = ConsoleRuntime::new(dispatcher_fn(|bot, event| async move {
//!         if event.is_tome() {
//!             let _ = bot.send(&event, event.get_plain_text()).await;
//!         }
//!     }));
//!
//!     // Until `:exit`, end of input or Ctrl+C
//!     runtime.run().await?;
//!     Ok(())
//! }
//! ```
//!
//! # Feature Flags
//!
//! - `toml-config`: TOML configuration files
//! - `yaml-config`: YAML configuration files
//! - `json-log`: JSON log output (`logging.format = "json"`)

pub mod config;
pub mod error;
pub mod logging;
pub mod runtime;

// Re-exports
pub use config::{ConfigError, ConfigLoader, ConfigResult, LoggingConfig, RuntimeConfig};
pub use error::{RuntimeError, RuntimeResult};
pub use logging::{LoggingBuilder, SpanEvents};
pub use runtime::{ConsoleRuntime, RuntimeBuilder};

// Re-export tracing for use by other crates
pub use tracing;
pub use tracing_subscriber;

/// Logging macros and span helpers.
pub mod prelude {
    pub use tracing::{Level, debug, error, info, instrument, span, trace, warn};
}
