//! # Console Adapter
//!
//! Connects a bot framework to a terminal front-end.
//!
//! ## Overview
//!
//! The adapter handles:
//!
//! - Bot identity connect/disconnect
//! - Translating front-end input into classified events
//! - Outbound API calls (`send_msg`, `bell`, directory queries)
//! - The front-end task and log capture while it runs
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use consolebot_adapter::{ConsoleAdapter, ConsoleConfig, StdioFrontend, dispatcher_fn};
//!
//! let config = ConsoleConfig::default();
//! let adapter = ConsoleAdapter::new(
//!     config.clone(),
//!     dispatcher_fn(|bot, event| async move {
//!         if event.get_plain_text() == "ping" {
//!             let _ = bot.send(&event, "pong").await;
//!         }
//!     }),
//! );
//! adapter.start(Arc::new(StdioFrontend::new(config.frontend)))?;
//! adapter.closed().await;
//! adapter.shutdown().await;
//! ```
//!
//! ## Architecture
//!
//! ```text
//! Frontend ──FrontendEvent──▶ ConsoleBackend ──InboundEvent──▶ ConsoleAdapter
//!    ▲                                                         │ classify
//!    │                                                         ▼
//!    └──────── call_api (send_msg, ...) ◀──── ConsoleBot ◀── Dispatcher
//! ```

mod adapter;
pub mod api;
mod backend;
mod bot;
pub mod config;
mod dispatch;
pub mod frontend;

pub use adapter::ConsoleAdapter;
pub use api::{
    ApiRequest, ApiResponse, ChannelParams, EditMsgParams, MessageIdParams, MessageInfo,
    SendMsgParams, UserParams,
};
pub use backend::{Backend, ConsoleBackend};
pub use bot::ConsoleBot;
pub use config::{BotInfo, ConsoleConfig, FrontendConfig, UserInfo};
pub use dispatch::{BoxedDispatcher, Dispatcher, dispatcher_fn};
pub use frontend::{
    BoxedFrontend, ChatRecord, Frontend, FrontendError, FrontendEvent, FrontendResult,
    StdioFrontend, Storage,
};

