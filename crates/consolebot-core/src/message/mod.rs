//! Console message model.
//!
//! [`Message`] is an ordered list of [`MessageSegment`]s. Segments and plain
//! strings compose with `+`; strings are wrapped as text segments:
//!
//! ```rust,ignore
//! use consolebot_core::{Message, MessageSegment};
//!
//! let msg = "Hello " + MessageSegment::emoji("wave") + "!";
//! assert_eq!(msg.len(), 3);
//! assert_eq!(msg.extract_plain_text(), "Hello !");
//! ```
//!
//! # Console Codec
//!
//! | Segment | Console element |
//! |---|---|
//! | `text` | [`ConsoleElement::Text`] |
//! | `emoji` | [`ConsoleElement::Emoji`] |
//! | `markup` | [`ConsoleElement::Markup`] |
//! | `markdown` | [`ConsoleElement::Markdown`] |
//!
//! Decoding a [`ConsoleElement::Other`] fails with
//! [`CodecError::UnmappedElement`]; nothing is dropped silently.

mod console;
mod segment;

use std::fmt;
use std::ops::{Add, AddAssign, Deref, DerefMut};

use serde::{Deserialize, Serialize};

use crate::error::{CodecError, CodecResult};

pub use console::{ConsoleElement, ConsoleMessage};
pub use segment::{
    DISPLAY_VALUE_LIMIT, EmojiData, EmojiVariant, Justify, MarkdownData, MarkupData,
    MessageSegment, TextData, truncate,
};

// ============================================================================
// Message
// ============================================================================

/// A console message composed of segments.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Message {
    segments: Vec<MessageSegment>,
}

impl Message {
    /// Creates a new empty message.
    pub fn new() -> Self {
        Self::default()
    }

    /// Concatenates the text of every text segment.
    pub fn extract_plain_text(&self) -> String {
        self.segments
            .iter()
            .filter_map(MessageSegment::as_text)
            .collect()
    }

    /// Returns a message holding only segments of the given kind.
    pub fn get(&self, kind: &str) -> Message {
        self.segments
            .iter()
            .filter(|seg| seg.kind() == kind)
            .cloned()
            .collect()
    }

    /// Returns `true` if any segment has the given kind.
    pub fn has(&self, kind: &str) -> bool {
        self.segments.iter().any(|seg| seg.kind() == kind)
    }

    /// Converts to the front-end representation.
    pub fn to_console_message(&self) -> ConsoleMessage {
        self.segments
            .iter()
            .map(|seg| match seg {
                MessageSegment::Text(data) => ConsoleElement::Text {
                    text: data.text.clone(),
                },
                MessageSegment::Emoji(data) => ConsoleElement::Emoji {
                    name: data.name.clone(),
                },
                MessageSegment::Markup(data) => ConsoleElement::Markup(data.clone()),
                MessageSegment::Markdown(data) => ConsoleElement::Markdown(data.clone()),
            })
            .collect()
    }

    /// Builds a message from the front-end representation.
    ///
    /// Fails on the first element kind that has no segment mapping.
    pub fn from_console_message(message: &ConsoleMessage) -> CodecResult<Message> {
        message
            .iter()
            .map(|elem| match elem {
                ConsoleElement::Text { text } => Ok(MessageSegment::text(text.clone())),
                ConsoleElement::Emoji { name } => Ok(MessageSegment::emoji(name.clone())),
                ConsoleElement::Markup(data) => Ok(MessageSegment::Markup(data.clone())),
                ConsoleElement::Markdown(data) => Ok(MessageSegment::Markdown(data.clone())),
                ConsoleElement::Other { kind, .. } => Err(CodecError::UnmappedElement {
                    kind: kind.clone(),
                }),
            })
            .collect()
    }

    pub fn into_segments(self) -> Vec<MessageSegment> {
        self.segments
    }
}

impl Deref for Message {
    type Target = Vec<MessageSegment>;

    fn deref(&self) -> &Self::Target {
        &self.segments
    }
}

impl DerefMut for Message {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.segments
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for seg in &self.segments {
            write!(f, "{seg}")?;
        }
        Ok(())
    }
}

impl TryFrom<&ConsoleMessage> for Message {
    type Error = CodecError;

    fn try_from(message: &ConsoleMessage) -> CodecResult<Self> {
        Self::from_console_message(message)
    }
}

impl From<&Message> for ConsoleMessage {
    fn from(message: &Message) -> Self {
        message.to_console_message()
    }
}

// ============================================================================
// Conversions
// ============================================================================

impl From<MessageSegment> for Message {
    fn from(segment: MessageSegment) -> Self {
        Self {
            segments: vec![segment],
        }
    }
}

impl From<&str> for Message {
    fn from(text: &str) -> Self {
        MessageSegment::text(text).into()
    }
}

impl From<String> for Message {
    fn from(text: String) -> Self {
        MessageSegment::text(text).into()
    }
}

impl From<Vec<MessageSegment>> for Message {
    fn from(segments: Vec<MessageSegment>) -> Self {
        Self { segments }
    }
}

impl FromIterator<MessageSegment> for Message {
    fn from_iter<I: IntoIterator<Item = MessageSegment>>(iter: I) -> Self {
        Self {
            segments: iter.into_iter().collect(),
        }
    }
}

impl IntoIterator for Message {
    type Item = MessageSegment;
    type IntoIter = std::vec::IntoIter<MessageSegment>;

    fn into_iter(self) -> Self::IntoIter {
        self.segments.into_iter()
    }
}

impl<'a> IntoIterator for &'a Message {
    type Item = &'a MessageSegment;
    type IntoIter = std::slice::Iter<'a, MessageSegment>;

    fn into_iter(self) -> Self::IntoIter {
        self.segments.iter()
    }
}

// ============================================================================
// Composition
// ============================================================================

impl<T: Into<Message>> AddAssign<T> for Message {
    fn add_assign(&mut self, rhs: T) {
        self.segments.extend(rhs.into().segments);
    }
}

impl<T: Into<Message>> Add<T> for Message {
    type Output = Message;

    fn add(mut self, rhs: T) -> Message {
        self += rhs;
        self
    }
}

impl<T: Into<Message>> Add<T> for MessageSegment {
    type Output = Message;

    fn add(self, rhs: T) -> Message {
        Message::from(self) + rhs
    }
}

impl Add<MessageSegment> for &str {
    type Output = Message;

    fn add(self, rhs: MessageSegment) -> Message {
        Message::from(self) + rhs
    }
}

impl Add<Message> for &str {
    type Output = Message;

    fn add(self, rhs: Message) -> Message {
        Message::from(self) + rhs
    }
}

impl Add<MessageSegment> for String {
    type Output = Message;

    fn add(self, rhs: MessageSegment) -> Message {
        Message::from(self) + rhs
    }
}

// ============================================================================
// Tests
// ============================================================================
