//! Consolebot Core - message model, events and addressing.
//!
//! This crate holds everything about the console adapter that does not need a
//! runtime:
//!
//! - **Message model**: [`MessageSegment`], [`Message`] and the codec to and
//!   from the front-end's [`ConsoleMessage`]
//! - **Identities**: [`User`], [`Robot`], [`Channel`]
//! - **Events**: [`Event`], [`MessageEvent`], and the classified
//!   [`ConsoleEvent`] produced by [`Addressing`]
//! - **Log sink**: the swappable process-wide log target ([`LogSink`])
//! - **Errors**: [`CodecError`], [`ApiError`], [`AdapterError`], [`SinkError`]
//!
//! # Data Flow
//!
//! ```text
//! ConsoleMessage ──▶ Message ──▶ MessageEvent ──▶ Addressing ──▶ ConsoleEvent
//!   (front-end)       (codec)      (bridge)        (to-me)        (dispatch)
//! ```

pub mod error;
pub mod event;
pub mod log_sink;
pub mod message;
pub mod types;

/// Adapter name reported in errors and logs.
pub const ADAPTER_NAME: &str = "Console";

pub use error::{
    AdapterError, AdapterResult, ApiError, ApiResult, CodecError, CodecResult, SinkError,
};
pub use event::{
    Addressing, ConsoleEvent, Event, InboundEvent, MessageEvent, POST_TYPE_MESSAGE,
    PrivateMessageEvent, PublicMessageEvent,
};
pub use log_sink::{BoxedWriter, LogSink, SinkRedirect, SinkWriter};
pub use message::{
    ConsoleElement, ConsoleMessage, EmojiVariant, Justify, MarkdownData, MarkupData, Message,
    MessageSegment,
};
pub use types::{Channel, DIRECT_CHANNEL_ID, Robot, User};
