//! # Consolebot
//!
//! Talk to a chat bot from the terminal, with no chat platform involved.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐  input   ┌───────────┐  classified events  ┌────────────┐
//! │  Front-end  │─────────▶│  Adapter  │────────────────────▶│ Dispatcher │
//! │  (terminal) │◀─────────│ + Backend │◀────────────────────│ (your bot) │
//! └─────────────┘  render  └───────────┘   send_msg, bell    └────────────┘
//! ```
//!
//! - **Core**: messages, events, identities and the log sink
//! - **Adapter**: bot connections, event classification, outbound API
//! - **Runtime**: configuration, logging, signals
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use consolebot::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let runtime = ConsoleRuntime::new(dispatcher_fn(|bot, event| async move {
//!         if event.is_tome() {
//!             let _ = bot.send(&event, event.get_plain_text()).await;
//!         }
//!     }));
//!     runtime.run().await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - `toml-config`: TOML configuration files (default)
//! - `yaml-config`: YAML configuration files
//! - `json-log`: JSON log output

pub use consolebot_adapter as adapter;
pub use consolebot_core as core;
pub use consolebot_runtime as runtime;

/// Commonly used types for writing a console bot.
pub mod prelude {
    pub use consolebot_runtime::ConsoleRuntime;

    pub use consolebot_adapter::{ConsoleBot, Dispatcher, dispatcher_fn};

    pub use consolebot_core::{
        Channel, ConsoleEvent, Message, MessageEvent, MessageSegment, Robot, User,
    };
}
