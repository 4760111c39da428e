//! Message events, in a parent-in-child design.

use std::ops::{Deref, DerefMut};

use serde::Serialize;

use super::{ConsoleEvent, Event, POST_TYPE_MESSAGE};
use crate::message::Message;
use crate::types::{Channel, User};

// ============================================================================
// MessageEvent
// ============================================================================

/// A message typed by a console user.
///
/// `Deref` → [`Event`], so `msg.user` and `msg.channel` work directly.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MessageEvent {
    #[serde(flatten)]
    pub parent: Event,

    pub message: Message,
    /// Set by addressing when the message names the bot.
    pub to_me: bool,
    /// Snapshot of `message` taken at construction.
    original_message: Message,
    #[serde(skip)]
    pub(super) addressed: bool,
}

impl MessageEvent {
    /// Creates a message event stamped with the current time.
    pub fn new(self_id: impl Into<String>, user: User, channel: Channel, message: Message) -> Self {
        Self::from_event(Event::new(self_id, POST_TYPE_MESSAGE, user, channel), message)
    }

    /// Wraps an existing base record.
    pub fn from_event(mut parent: Event, message: Message) -> Self {
        parent.post_type = POST_TYPE_MESSAGE.to_string();
        Self {
            parent,
            original_message: message.clone(),
            message,
            to_me: false,
            addressed: false,
        }
    }

    /// The message exactly as the user typed it.
    pub fn original_message(&self) -> &Message {
        &self.original_message
    }

    pub fn get_message(&self) -> &Message {
        &self.message
    }

    pub fn get_plain_text(&self) -> String {
        self.message.extract_plain_text()
    }

    /// Whether addressing has already run on this event.
    pub fn is_addressed(&self) -> bool {
        self.addressed
    }

    /// `Message from <nick>(<id>)[ @ <channel>]: "<message>"`.
    pub fn description(&self) -> String {
        format!(
            "Message from {}: {:?}",
            self.parent.origin(),
            self.message.to_string()
        )
    }

    /// Specializes by channel identity. Consumes the generic event.
    pub fn convert(self) -> ConsoleEvent {
        if self.channel.is_direct() {
            ConsoleEvent::Private(PrivateMessageEvent { parent: self })
        } else {
            ConsoleEvent::Public(PublicMessageEvent { parent: self })
        }
    }
}

impl Deref for MessageEvent {
    type Target = Event;

    fn deref(&self) -> &Self::Target {
        &self.parent
    }
}

impl DerefMut for MessageEvent {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.parent
    }
}

// ============================================================================
// PrivateMessageEvent
// ============================================================================

/// Message in the DIRECT channel or a `private:` channel.
///
/// `Deref` chain: `PrivateMessageEvent` → [`MessageEvent`] → [`Event`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct PrivateMessageEvent {
    pub parent: MessageEvent,
}

impl PrivateMessageEvent {
    /// Private messages are always addressed to the bot.
    pub fn is_tome(&self) -> bool {
        true
    }
}

impl Deref for PrivateMessageEvent {
    type Target = MessageEvent;

    fn deref(&self) -> &Self::Target {
        &self.parent
    }
}

// ============================================================================
// PublicMessageEvent
// ============================================================================

/// Message in a group channel.
///
/// `Deref` chain: `PublicMessageEvent` → [`MessageEvent`] → [`Event`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct PublicMessageEvent {
    pub parent: MessageEvent,
}

impl PublicMessageEvent {
    pub fn is_tome(&self) -> bool {
        self.parent.to_me
    }
}

impl Deref for PublicMessageEvent {
    type Target = MessageEvent;

    fn deref(&self) -> &Self::Target {
        &self.parent
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::MessageSegment;

    fn user() -> User {
        User::new("user", "User")
    }

    #[test]
    fn test_original_message_is_snapshot() {
        let mut event = MessageEvent::new("robot", user(), Channel::direct(), "hi".into());
        event.message.clear();
        assert_eq!(event.original_message(), &Message::from("hi"));
        assert!(event.message.is_empty());
        assert_eq!(event.post_type, "message");
    }

    #[test]
    fn test_convert_by_channel() {
        let event = MessageEvent::new("robot", user(), Channel::direct(), "hi".into());
        let ConsoleEvent::Private(private) = event.convert() else {
            panic!("expected private event");
        };
        assert!(!private.to_me);
        assert!(private.is_tome());

        let dm = Channel::private_with(&User::new("alice", "Alice"));
        let event = MessageEvent::new("robot", user(), dm, "hi".into());
        assert!(matches!(event.convert(), ConsoleEvent::Private(_)));

        let mut event =
            MessageEvent::new("robot", user(), Channel::new("g", "General"), "hi".into());
        let ConsoleEvent::Public(public) = event.clone().convert() else {
            panic!("expected public event");
        };
        assert!(!public.is_tome());

        event.to_me = true;
        let converted = event.convert();
        assert!(converted.is_tome());
        assert_eq!(converted.event_name(), "message.public");
    }

    #[test]
    fn test_description() {
        let msg = "hi " + MessageSegment::emoji("wave");
        let event = MessageEvent::new("robot", user(), Channel::new("g", "General"), msg);
        assert_eq!(
            event.description(),
            r#"Message from User(user) @ General: "hi [emoji:name=wave]""#
        );

        let event = MessageEvent::new("robot", user(), Channel::direct(), "hi".into());
        assert_eq!(event.description(), r#"Message from User(user): "hi""#);
    }
}
