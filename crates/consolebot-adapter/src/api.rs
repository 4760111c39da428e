//! The console adapter's API table.
//!
//! Raw calls arrive as a name plus JSON parameters. [`ApiRequest::parse`]
//! turns them into a closed set of requests; anything outside that set is
//! [`ApiError::NotAvailable`]. The adapter then matches exhaustively on the
//! request, so every modeled API has a handler.
//!
//! | API | Parameters | Result |
//! |---|---|---|
//! | `send_msg` | `message`, `channel` | `{ "message_id": … }` |
//! | `bell` | — | `null` |
//! | `get_user` | `user_id` | user |
//! | `get_channel` | `channel_id` | channel |
//! | `list_users` | — | users |
//! | `list_channels` | — | channels |
//! | `create_dm` | `user_id` | channel |
//! | `get_msg` | `message_id` | message info |
//! | `recall_msg` | `message_id` | `null` |
//! | `edit_msg` | `message_id`, `message` | message info |

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use time::OffsetDateTime;

use consolebot_core::{ApiError, ApiResult, Channel, Message, User};

// ============================================================================
// Requests
// ============================================================================

/// A parsed API call.
#[derive(Debug, Clone, PartialEq)]
pub enum ApiRequest {
    SendMsg(SendMsgParams),
    Bell,
    GetUser(UserParams),
    GetChannel(ChannelParams),
    ListUsers,
    ListChannels,
    CreateDm(UserParams),
    GetMsg(MessageIdParams),
    RecallMsg(MessageIdParams),
    EditMsg(EditMsgParams),
}

impl ApiRequest {
    /// Parses a raw call. Unknown names fail with [`ApiError::NotAvailable`].
    pub fn parse(api: &str, params: Value) -> ApiResult<Self> {
        Ok(match api {
            "send_msg" => Self::SendMsg(decode(api, params)?),
            "bell" => Self::Bell,
            "get_user" => Self::GetUser(decode(api, params)?),
            "get_channel" => Self::GetChannel(decode(api, params)?),
            "list_users" => Self::ListUsers,
            "list_channels" => Self::ListChannels,
            "create_dm" => Self::CreateDm(decode(api, params)?),
            "get_msg" => Self::GetMsg(decode(api, params)?),
            "recall_msg" => Self::RecallMsg(decode(api, params)?),
            "edit_msg" => Self::EditMsg(decode(api, params)?),
            other => return Err(ApiError::not_available(other)),
        })
    }

    /// The API name this request was parsed from.
    pub fn name(&self) -> &'static str {
        match self {
            Self::SendMsg(_) => "send_msg",
            Self::Bell => "bell",
            Self::GetUser(_) => "get_user",
            Self::GetChannel(_) => "get_channel",
            Self::ListUsers => "list_users",
            Self::ListChannels => "list_channels",
            Self::CreateDm(_) => "create_dm",
            Self::GetMsg(_) => "get_msg",
            Self::RecallMsg(_) => "recall_msg",
            Self::EditMsg(_) => "edit_msg",
        }
    }
}

fn decode<T: DeserializeOwned>(api: &str, params: Value) -> ApiResult<T> {
    serde_json::from_value(params).map_err(|e| ApiError::invalid_params(api, e.to_string()))
}

/// Parameters of `send_msg`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SendMsgParams {
    pub message: Message,
    pub channel: Channel,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserParams {
    pub user_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelParams {
    pub channel_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageIdParams {
    pub message_id: String,
}

/// Parameters of `edit_msg`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EditMsgParams {
    pub message_id: String,
    pub message: Message,
}

// ============================================================================
// Responses
// ============================================================================

/// Result of an API call, serialized into the raw call's return value.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ApiResponse {
    None,
    MessageId { message_id: String },
    User(User),
    Channel(Channel),
    Users(Vec<User>),
    Channels(Vec<Channel>),
    Message(MessageInfo),
}

impl ApiResponse {
    pub fn into_value(self) -> ApiResult<Value> {
        Ok(serde_json::to_value(self)?)
    }
}

/// A stored chat message, decoded into a [`Message`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageInfo {
    pub message_id: String,
    #[serde(with = "time::serde::rfc3339")]
    pub time: OffsetDateTime,
    pub user: User,
    pub channel: Channel,
    pub message: Message,
    pub edited: bool,
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_parse_known_apis() {
        let req = ApiRequest::parse(
            "send_msg",
            json!({
                "message": [{"type": "text", "data": {"text": "hi"}}],
                "channel": {"id": "_direct", "name": "Direct"},
            }),
        )
        .unwrap();
        assert_eq!(req.name(), "send_msg");
        let ApiRequest::SendMsg(params) = req else {
            panic!("expected send_msg");
        };
        assert_eq!(params.message, Message::from("hi"));
        assert!(params.channel.is_direct());

        assert_eq!(ApiRequest::parse("bell", Value::Null).unwrap(), ApiRequest::Bell);
        assert_eq!(
            ApiRequest::parse("list_users", json!({})).unwrap(),
            ApiRequest::ListUsers
        );
        assert_eq!(
            ApiRequest::parse("recall_msg", json!({"message_id": "m1"})).unwrap(),
            ApiRequest::RecallMsg(MessageIdParams {
                message_id: "m1".into()
            })
        );
    }

    #[test]
    fn test_unknown_api_not_available() {
        let err = ApiRequest::parse("nonexistent", json!({})).unwrap_err();
        assert!(matches!(
            err,
            ApiError::NotAvailable { adapter: "Console", ref api } if api == "nonexistent"
        ));
    }

    #[test]
    fn test_invalid_params() {
        let err = ApiRequest::parse("get_user", json!({"id": 1})).unwrap_err();
        assert!(matches!(err, ApiError::InvalidParams { ref api, .. } if api == "get_user"));
    }

    #[test]
    fn test_response_shapes() {
        let value = ApiResponse::MessageId {
            message_id: "m1".into(),
        }
        .into_value()
        .unwrap();
        assert_eq!(value, json!({"message_id": "m1"}));
        assert_eq!(ApiResponse::None.into_value().unwrap(), Value::Null);
    }
}
