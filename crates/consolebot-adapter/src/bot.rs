//! Console bot implementation.
//!
//! A [`ConsoleBot`] is a connected bot identity. It holds a weak link to its
//! adapter: once the adapter is gone every call fails with
//! [`ApiError::NotConnected`].

use std::fmt;
use std::sync::{Arc, Weak};

use serde_json::Value;
use tracing::{debug, warn};

use consolebot_core::{
    Addressing, ApiError, ApiResult, Channel, ConsoleEvent, Message, Robot, User,
};

use crate::adapter::{AdapterInner, ConsoleAdapter};
use crate::api::{
    ApiRequest, ApiResponse, ChannelParams, EditMsgParams, MessageIdParams, MessageInfo,
    SendMsgParams, UserParams,
};

struct BotInner {
    robot: Robot,
    addressing: Addressing,
    adapter: Weak<AdapterInner>,
}

/// A bot identity connected to a [`ConsoleAdapter`].
#[derive(Clone)]
pub struct ConsoleBot {
    inner: Arc<BotInner>,
}

impl ConsoleBot {
    pub(crate) fn new(robot: Robot, addressing: Addressing, adapter: Weak<AdapterInner>) -> Self {
        Self {
            inner: Arc::new(BotInner {
                robot,
                addressing,
                adapter,
            }),
        }
    }

    pub fn id(&self) -> &str {
        &self.inner.robot.id
    }

    pub fn robot(&self) -> &Robot {
        &self.inner.robot
    }

    /// Addressing rules applied to events for this bot.
    pub fn addressing(&self) -> &Addressing {
        &self.inner.addressing
    }

    /// Returns `true` if this exact bot is still in the adapter's table.
    pub fn is_connected(&self) -> bool {
        self.adapter()
            .ok()
            .and_then(|adapter| adapter.bot(self.id()))
            .is_some_and(|bot| Arc::ptr_eq(&bot.inner, &self.inner))
    }

    fn adapter(&self) -> ApiResult<ConsoleAdapter> {
        self.inner
            .adapter
            .upgrade()
            .map(ConsoleAdapter::from_inner)
            .ok_or(ApiError::NotConnected)
    }

    /// Calls an API by name with JSON parameters.
    pub async fn call_api(&self, api: &str, params: Value) -> ApiResult<Value> {
        self.adapter()?.call_api(self, api, params).await
    }

    /// Hands an event to the dispatcher.
    pub async fn handle_event(&self, event: ConsoleEvent) {
        match self.adapter() {
            Ok(adapter) => adapter.dispatcher().dispatch(self.clone(), event).await,
            Err(_) => warn!(bot_id = %self.id(), "Adapter dropped, event discarded"),
        }
    }

    /// Replies in the channel the event came from.
    pub async fn send(&self, event: &ConsoleEvent, message: impl Into<Message>) -> ApiResult<String> {
        let channel = event.base().channel.clone();
        debug!(bot_id = %self.id(), channel = %channel.id, "Sending reply");
        self.send_msg(message.into(), channel).await
    }

    /// The robot as a chat participant.
    pub fn as_user(&self) -> User {
        self.inner.robot.as_user()
    }
}

impl fmt::Debug for ConsoleBot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConsoleBot")
            .field("robot", &self.inner.robot)
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Typed API wrappers
// ============================================================================

/// Generates a typed method that builds an [`ApiRequest`] and unpacks the
/// matching [`ApiResponse`] variant. Any other variant is a
/// [`ApiError::Serialization`] naming the API.
macro_rules! console_api {
    (
        $(#[$meta:meta])*
        $name:ident($($arg:ident: $typ:ty),*) -> $ret:ty = $request:expr;
        $response:pat => $value:expr
    ) => {
        $(#[$meta])*
        pub async fn $name(&self, $($arg: $typ),*) -> ApiResult<$ret> {
            match self.request($request).await? {
                $response => Ok($value),
                other => Err(ApiError::Serialization(format!(
                    "unexpected response to '{}': {other:?}",
                    stringify!($name)
                ))),
            }
        }
    };
}

impl ConsoleBot {
    async fn request(&self, request: ApiRequest) -> ApiResult<ApiResponse> {
        self.adapter()?.request(self, request).await
    }

    console_api!(
        /// Sends a message to a channel. Returns the message ID.
        send_msg(message: Message, channel: Channel) -> String =
            ApiRequest::SendMsg(SendMsgParams { message, channel });
        ApiResponse::MessageId { message_id } => message_id
    );

    console_api!(
        /// Rings the terminal bell.
        bell() -> () = ApiRequest::Bell;
        ApiResponse::None => ()
    );

    console_api!(
        get_user(user_id: &str) -> User = ApiRequest::GetUser(user_params(user_id));
        ApiResponse::User(user) => user
    );

    console_api!(
        get_channel(channel_id: &str) -> Channel = ApiRequest::GetChannel(ChannelParams {
            channel_id: channel_id.to_string(),
        });
        ApiResponse::Channel(channel) => channel
    );

    console_api!(
        list_users() -> Vec<User> = ApiRequest::ListUsers;
        ApiResponse::Users(users) => users
    );

    console_api!(
        list_channels() -> Vec<Channel> = ApiRequest::ListChannels;
        ApiResponse::Channels(channels) => channels
    );

    console_api!(
        /// Opens the private channel with a user.
        create_dm(user_id: &str) -> Channel = ApiRequest::CreateDm(user_params(user_id));
        ApiResponse::Channel(channel) => channel
    );

    console_api!(
        get_msg(message_id: &str) -> MessageInfo = ApiRequest::GetMsg(message_params(message_id));
        ApiResponse::Message(info) => info
    );

    console_api!(
        /// Removes a sent message from the chat history.
        recall_msg(message_id: &str) -> () = ApiRequest::RecallMsg(message_params(message_id));
        ApiResponse::None => ()
    );

    console_api!(
        /// Replaces the content of a sent message.
        edit_msg(message_id: &str, message: Message) -> MessageInfo =
            ApiRequest::EditMsg(EditMsgParams {
                message_id: message_id.to_string(),
                message,
            });
        ApiResponse::Message(info) => info
    );
}

fn user_params(user_id: &str) -> UserParams {
    UserParams {
        user_id: user_id.to_string(),
    }
}

fn message_params(message_id: &str) -> MessageIdParams {
    MessageIdParams {
        message_id: message_id.to_string(),
    }
}
