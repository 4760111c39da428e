//! Console events.
//!
//! # Hierarchy
//!
//! ```text
//! Event { time, self_id, post_type, user, channel }
//! └── MessageEvent { message, to_me, original_message }
//!     ├── PrivateMessageEvent   (DIRECT / private: channels, always to-me)
//!     └── PublicMessageEvent    (group channels)
//! ```
//!
//! Children `Deref` to their parent. The bridge builds an [`InboundEvent`];
//! the adapter runs [`Addressing::classify`] on it exactly once and hands the
//! resulting [`ConsoleEvent`] to the dispatcher, giving up ownership.

mod addressing;
mod message;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::message::Message;
use crate::types::{Channel, User};

pub use addressing::Addressing;
pub use message::{MessageEvent, PrivateMessageEvent, PublicMessageEvent};

/// `post_type` of message events.
pub const POST_TYPE_MESSAGE: &str = "message";

// ============================================================================
// Event
// ============================================================================

/// Base event record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    #[serde(with = "time::serde::rfc3339")]
    pub time: OffsetDateTime,
    /// ID of the bot identity this event is addressed to.
    pub self_id: String,
    pub post_type: String,
    pub user: User,
    pub channel: Channel,
}

impl Event {
    /// Creates an event stamped with the current time.
    pub fn new(
        self_id: impl Into<String>,
        post_type: impl Into<String>,
        user: User,
        channel: Channel,
    ) -> Self {
        Self {
            time: OffsetDateTime::now_utc(),
            self_id: self_id.into(),
            post_type: post_type.into(),
            user,
            channel,
        }
    }

    pub fn with_time(mut self, time: OffsetDateTime) -> Self {
        self.time = time;
        self
    }

    pub fn get_type(&self) -> &str {
        &self.post_type
    }

    pub fn user_id(&self) -> &str {
        &self.user.id
    }

    /// The user ID in private channels, `<channel>_<user>` elsewhere.
    pub fn session_id(&self) -> String {
        if self.channel.is_direct() {
            self.user.id.clone()
        } else {
            format!("{}_{}", self.channel.id, self.user.id)
        }
    }

    pub fn is_private(&self) -> bool {
        self.channel.is_direct()
    }

    fn origin(&self) -> String {
        if self.is_private() {
            format!("{}({})", self.user.nickname, self.user.id)
        } else {
            format!(
                "{}({}) @ {}",
                self.user.nickname, self.user.id, self.channel.name
            )
        }
    }

    /// One-line human readable summary for logs.
    pub fn description(&self) -> String {
        format!("Event '{}' from {}", self.post_type, self.origin())
    }
}

// ============================================================================
// InboundEvent
// ============================================================================

/// An event as produced by the bridge, before addressing.
#[derive(Debug, Clone, PartialEq)]
pub enum InboundEvent {
    /// Any non-message event from the front-end.
    Notice(Event),
    Message(MessageEvent),
}

impl InboundEvent {
    pub fn self_id(&self) -> &str {
        match self {
            Self::Notice(event) => &event.self_id,
            Self::Message(event) => &event.self_id,
        }
    }
}

impl From<Event> for InboundEvent {
    fn from(event: Event) -> Self {
        Self::Notice(event)
    }
}

impl From<MessageEvent> for InboundEvent {
    fn from(event: MessageEvent) -> Self {
        Self::Message(event)
    }
}

// ============================================================================
// ConsoleEvent
// ============================================================================

/// A classified event, ready for dispatch.
#[derive(Debug, Clone, PartialEq)]
pub enum ConsoleEvent {
    Notice(Event),
    Private(PrivateMessageEvent),
    Public(PublicMessageEvent),
}

impl ConsoleEvent {
    /// The base record.
    pub fn base(&self) -> &Event {
        match self {
            Self::Notice(event) => event,
            Self::Private(event) => &event.parent.parent,
            Self::Public(event) => &event.parent.parent,
        }
    }

    /// The message part, if this is a message event.
    pub fn message_event(&self) -> Option<&MessageEvent> {
        match self {
            Self::Notice(_) => None,
            Self::Private(event) => Some(&event.parent),
            Self::Public(event) => Some(&event.parent),
        }
    }

    pub fn get_type(&self) -> &str {
        self.base().get_type()
    }

    /// `message.private`, `message.public`, or the notice's `post_type`.
    pub fn event_name(&self) -> &str {
        match self {
            Self::Notice(event) => &event.post_type,
            Self::Private(_) => "message.private",
            Self::Public(_) => "message.public",
        }
    }

    pub fn self_id(&self) -> &str {
        &self.base().self_id
    }

    pub fn user_id(&self) -> &str {
        self.base().user_id()
    }

    pub fn session_id(&self) -> String {
        self.base().session_id()
    }

    pub fn get_message(&self) -> Option<&Message> {
        self.message_event().map(|event| &event.message)
    }

    pub fn get_plain_text(&self) -> String {
        self.get_message()
            .map(Message::extract_plain_text)
            .unwrap_or_default()
    }

    /// Whether the event is addressed to the bot.
    ///
    /// Notices concern the bot by definition.
    pub fn is_tome(&self) -> bool {
        match self {
            Self::Notice(_) => true,
            Self::Private(event) => event.is_tome(),
            Self::Public(event) => event.is_tome(),
        }
    }

    pub fn description(&self) -> String {
        match self.message_event() {
            Some(event) => event.description(),
            None => self.base().description(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(channel: Channel) -> Event {
        Event::new("robot", "notice", User::new("user", "User"), channel)
    }

    #[test]
    fn test_session_id() {
        assert_eq!(event(Channel::direct()).session_id(), "user");
        assert_eq!(
            event(Channel::new("general", "General")).session_id(),
            "general_user"
        );
        let dm = Channel::private_with(&User::new("alice", "Alice"));
        assert_eq!(event(dm).session_id(), "user");
    }

    #[test]
    fn test_notice_accessors() {
        let notice = ConsoleEvent::Notice(event(Channel::new("general", "General")));
        assert_eq!(notice.event_name(), "notice");
        assert_eq!(notice.get_type(), "notice");
        assert!(notice.is_tome());
        assert!(notice.get_message().is_none());
        assert_eq!(notice.get_plain_text(), "");
        assert_eq!(
            notice.description(),
            "Event 'notice' from User(user) @ General"
        );
    }

    #[test]
    fn test_event_serializes_time_as_rfc3339() {
        let ev = event(Channel::direct()).with_time(time::macros::datetime!(2024-01-02 03:04:05 UTC));
        let json = serde_json::to_value(&ev).unwrap();
        assert_eq!(json["time"], "2024-01-02T03:04:05Z");
        let back: Event = serde_json::from_value(json).unwrap();
        assert_eq!(back, ev);
    }
}
