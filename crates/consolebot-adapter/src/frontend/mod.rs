//! Front-end interface.
//!
//! A front-end owns the terminal. It renders chat messages, collects user
//! input and keeps the directory of users, channels and past messages in its
//! [`Storage`]. The adapter talks to it only through [`Frontend`]; the
//! front-end talks back only through a [`Backend`].
//!
//! ```text
//!            ┌──────────── Frontend::run(backend) ────────────┐
//!            │ on_console_load → on_console_mount → … input … │
//!            │   → backend.post_event(FrontendEvent)          │
//!            │ … exit() → on_console_unmount                  │
//!            └────────────────────────────────────────────────┘
//! ```
//!
//! Directory operations have default implementations on top of [`Storage`].

mod stdio;
mod storage;

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use time::OffsetDateTime;

use consolebot_core::{
    ApiError, ApiResult, BoxedWriter, Channel, ConsoleMessage, SinkError, User,
};

use crate::backend::Backend;

pub use stdio::StdioFrontend;
pub use storage::{ChatRecord, ChatWatcher, LogWatcher, LogWriter, Storage, WatcherId};

// =============================================================================
// Front-end Events
// =============================================================================

/// Raw event emitted by a front-end.
#[derive(Debug, Clone, PartialEq)]
pub enum FrontendEvent {
    /// The user sent a message.
    Message {
        time: OffsetDateTime,
        self_id: String,
        user: User,
        channel: Channel,
        message: ConsoleMessage,
    },
    /// Anything else, named by `kind`.
    Notice {
        time: OffsetDateTime,
        self_id: String,
        user: User,
        channel: Channel,
        kind: String,
    },
}

// =============================================================================
// Front-end Errors
// =============================================================================

/// Errors that end a front-end's run loop.
#[derive(Debug, Clone, Error)]
pub enum FrontendError {
    /// Terminal I/O failed.
    #[error("I/O error: {0}")]
    Io(String),

    /// The log sink is held by someone else.
    #[error(transparent)]
    Sink(#[from] SinkError),

    /// The front-end was already run once.
    #[error("frontend is closed")]
    Closed,
}

impl From<std::io::Error> for FrontendError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

/// Result type for front-end run loops.
pub type FrontendResult<T> = Result<T, FrontendError>;

// =============================================================================
// Frontend
// =============================================================================

/// A terminal front-end.
#[async_trait]
pub trait Frontend: Send + Sync {
    /// The front-end's storage.
    fn storage(&self) -> &Arc<Storage>;

    /// Runs the UI until it exits.
    ///
    /// Calls `on_console_load` and `on_console_mount` before reading input
    /// and `on_console_unmount` on the way out, including on error.
    async fn run(&self, backend: Arc<dyn Backend>) -> FrontendResult<()>;

    /// Asks the run loop to return. Safe to call more than once.
    fn exit(&self);

    /// Triggers an audible or visual alert.
    async fn bell(&self) -> ApiResult<()>;

    /// Renders a message and stores it in the chat history.
    async fn send_message(
        &self,
        sender: User,
        channel: Channel,
        content: ConsoleMessage,
    ) -> ApiResult<ChatRecord>;

    /// Writer that captures log output while the console is loaded.
    fn log_writer(&self) -> BoxedWriter {
        Box::new(self.storage().log_writer())
    }

    async fn get_user(&self, user_id: &str) -> ApiResult<User> {
        self.storage()
            .find_user(user_id)
            .ok_or_else(|| not_found("user", user_id))
    }

    async fn get_channel(&self, channel_id: &str) -> ApiResult<Channel> {
        self.storage()
            .find_channel(channel_id)
            .ok_or_else(|| not_found("channel", channel_id))
    }

    async fn list_users(&self) -> ApiResult<Vec<User>> {
        Ok(self.storage().users())
    }

    async fn list_channels(&self) -> ApiResult<Vec<Channel>> {
        Ok(self.storage().channels())
    }

    /// Opens (or reuses) the private channel with a user.
    async fn create_dm(&self, user_id: &str) -> ApiResult<Channel> {
        let user = self.get_user(user_id).await?;
        let channel = Channel::private_with(&user);
        self.storage().add_channel(channel.clone());
        Ok(channel)
    }

    async fn get_msg(&self, message_id: &str) -> ApiResult<ChatRecord> {
        self.storage()
            .find_message(message_id)
            .ok_or_else(|| not_found("message", message_id))
    }

    async fn recall_msg(&self, message_id: &str) -> ApiResult<()> {
        self.storage()
            .remove_message(message_id)
            .map(|_| ())
            .ok_or_else(|| not_found("message", message_id))
    }

    async fn edit_msg(&self, message_id: &str, content: ConsoleMessage) -> ApiResult<ChatRecord> {
        self.storage()
            .edit_message(message_id, content)
            .ok_or_else(|| not_found("message", message_id))
    }
}

fn not_found(kind: &'static str, id: &str) -> ApiError {
    ApiError::NotFound {
        kind,
        id: id.to_string(),
    }
}

/// Boxed front-end trait object.
pub type BoxedFrontend = Arc<dyn Frontend>;
