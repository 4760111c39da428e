//! The front-end's native message representation.
//!
//! A [`ConsoleMessage`] is what the terminal front-end renders and what it
//! produces from user input. Elements the adapter does not model (for example
//! a file drop added by a richer front-end) arrive as [`ConsoleElement::Other`]
//! and are rejected by the codec in [`Message::from_console_message`].
//!
//! [`Message::from_console_message`]: crate::Message::from_console_message

use std::ops::Deref;

use serde::de::Error as _;
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

use super::segment::{MarkdownData, MarkupData};

/// One renderable element of a [`ConsoleMessage`].
///
/// Serialized as an object tagged by `type`. Any tag other than the four
/// known kinds deserializes into [`ConsoleElement::Other`], with the
/// remaining fields kept in `data`.
#[derive(Debug, Clone, PartialEq)]
pub enum ConsoleElement {
    Text {
        text: String,
    },
    Emoji {
        name: String,
    },
    Markup(MarkupData),
    Markdown(MarkdownData),
    /// An element kind with no segment mapping.
    Other {
        kind: String,
        data: Value,
    },
}

const KNOWN_KINDS: [&str; 4] = ["text", "emoji", "markup", "markdown"];

#[derive(Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum KnownRef<'a> {
    Text { text: &'a str },
    Emoji { name: &'a str },
    Markup(&'a MarkupData),
    Markdown(&'a MarkdownData),
}

#[derive(Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum Known {
    Text { text: String },
    Emoji { name: String },
    Markup(MarkupData),
    Markdown(MarkdownData),
}

impl From<Known> for ConsoleElement {
    fn from(known: Known) -> Self {
        match known {
            Known::Text { text } => Self::Text { text },
            Known::Emoji { name } => Self::Emoji { name },
            Known::Markup(data) => Self::Markup(data),
            Known::Markdown(data) => Self::Markdown(data),
        }
    }
}

impl Serialize for ConsoleElement {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let known = match self {
            Self::Text { text } => KnownRef::Text { text },
            Self::Emoji { name } => KnownRef::Emoji { name },
            Self::Markup(data) => KnownRef::Markup(data),
            Self::Markdown(data) => KnownRef::Markdown(data),
            Self::Other { kind, data } => {
                let mut map = serializer.serialize_map(None)?;
                map.serialize_entry("type", kind)?;
                match data {
                    Value::Object(fields) => {
                        for (key, value) in fields {
                            map.serialize_entry(key, value)?;
                        }
                    }
                    Value::Null => {}
                    other => map.serialize_entry("data", other)?,
                }
                return map.end();
            }
        };
        known.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for ConsoleElement {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let mut fields: Map<String, Value> = Map::deserialize(deserializer)?;
        let kind = match fields.remove("type") {
            Some(Value::String(kind)) => kind,
            Some(_) => return Err(D::Error::custom("element `type` must be a string")),
            None => return Err(D::Error::missing_field("type")),
        };

        if !KNOWN_KINDS.contains(&kind.as_str()) {
            return Ok(Self::Other {
                kind,
                data: Value::Object(fields),
            });
        }

        fields.insert("type".to_string(), Value::String(kind));
        serde_json::from_value::<Known>(Value::Object(fields))
            .map(Into::into)
            .map_err(D::Error::custom)
    }
}

impl ConsoleElement {
    /// Returns the element kind name.
    pub fn kind(&self) -> &str {
        match self {
            Self::Text { .. } => "text",
            Self::Emoji { .. } => "emoji",
            Self::Markup(_) => "markup",
            Self::Markdown(_) => "markdown",
            Self::Other { kind, .. } => kind,
        }
    }

    /// Plain-terminal rendering of this element.
    pub fn render_plain(&self) -> String {
        match self {
            Self::Text { text } => text.clone(),
            Self::Emoji { name } => format!(":{name}:"),
            Self::Markup(data) => data.markup.clone(),
            Self::Markdown(data) => data.markup.clone(),
            Self::Other { kind, .. } => format!("[{kind}]"),
        }
    }
}

/// An ordered list of console elements.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConsoleMessage {
    elements: Vec<ConsoleElement>,
}

impl ConsoleMessage {
    pub fn new(elements: Vec<ConsoleElement>) -> Self {
        Self { elements }
    }

    /// A message holding a single text element.
    pub fn plain(text: impl Into<String>) -> Self {
        Self::new(vec![ConsoleElement::Text { text: text.into() }])
    }

    pub fn push(&mut self, element: ConsoleElement) {
        self.elements.push(element);
    }

    pub fn into_elements(self) -> Vec<ConsoleElement> {
        self.elements
    }

    /// Concatenated plain rendering of all elements.
    pub fn render_plain(&self) -> String {
        self.elements.iter().map(ConsoleElement::render_plain).collect()
    }
}

impl Deref for ConsoleMessage {
    type Target = [ConsoleElement];

    fn deref(&self) -> &Self::Target {
        &self.elements
    }
}

impl FromIterator<ConsoleElement> for ConsoleMessage {
    fn from_iter<I: IntoIterator<Item = ConsoleElement>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

impl IntoIterator for ConsoleMessage {
    type Item = ConsoleElement;
    type IntoIter = std::vec::IntoIter<ConsoleElement>;

    fn into_iter(self) -> Self::IntoIter {
        self.elements.into_iter()
    }
}

impl<'a> IntoIterator for &'a ConsoleMessage {
    type Item = &'a ConsoleElement;
    type IntoIter = std::slice::Iter<'a, ConsoleElement>;

    fn into_iter(self) -> Self::IntoIter {
        self.elements.iter()
    }
}
