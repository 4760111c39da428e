//! Console message segment types.
//!
//! A segment is a single unit of message content. The console front-end
//! understands four kinds:
//!
//! - `text` → plain string
//! - `emoji` → named emoji, e.g. `:smile:`
//! - `markup` → console markup such as `[bold red]hi[/]`
//! - `markdown` → a markdown document rendered by the front-end
//!
//! # Example
//!
//! ```rust,ignore
//! use consolebot_core::MessageSegment;
//!
//! let msg = MessageSegment::text("Hello ") + MessageSegment::emoji("wave");
//! assert_eq!(msg.to_string(), "Hello [emoji:name=wave]");
//! ```

use std::fmt::{self, Write};

use serde::{Deserialize, Serialize};

/// Display budget for a single parameter value in [`MessageSegment`]'s
/// `Display` output.
pub const DISPLAY_VALUE_LIMIT: usize = 70;

// ============================================================================
// MessageSegment
// ============================================================================

/// A console message segment.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum MessageSegment {
    /// Plain text content.
    Text(TextData),
    /// Named emoji.
    Emoji(EmojiData),
    /// Console markup.
    Markup(MarkupData),
    /// Markdown document.
    Markdown(MarkdownData),
}

impl MessageSegment {
    /// Creates a text segment.
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text(TextData { text: text.into() })
    }

    /// Creates an emoji segment.
    pub fn emoji(name: impl Into<String>) -> Self {
        Self::Emoji(EmojiData { name: name.into() })
    }

    /// Creates a markup segment.
    ///
    /// Use [`MarkupData::new`] for the default style and emoji settings.
    pub fn markup(
        markup: impl Into<String>,
        style: impl Into<String>,
        emoji: bool,
        emoji_variant: Option<EmojiVariant>,
    ) -> Self {
        Self::Markup(MarkupData {
            markup: markup.into(),
            style: style.into(),
            emoji,
            emoji_variant,
        })
    }

    /// Creates a markdown segment.
    ///
    /// Use [`MarkdownData::new`] for the default theme and style.
    pub fn markdown(
        markup: impl Into<String>,
        code_theme: impl Into<String>,
        justify: Option<Justify>,
        style: impl Into<String>,
        hyperlinks: bool,
        inline_code_lexer: Option<String>,
        inline_code_theme: Option<String>,
    ) -> Self {
        Self::Markdown(MarkdownData {
            markup: markup.into(),
            code_theme: code_theme.into(),
            justify,
            style: style.into(),
            hyperlinks,
            inline_code_lexer,
            inline_code_theme,
        })
    }

    /// Returns the segment kind name.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Text(_) => "text",
            Self::Emoji(_) => "emoji",
            Self::Markup(_) => "markup",
            Self::Markdown(_) => "markdown",
        }
    }

    /// Returns `true` for text segments.
    pub fn is_text(&self) -> bool {
        matches!(self, Self::Text(_))
    }

    /// Returns the text content of a text segment.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(data) => Some(&data.text),
            _ => None,
        }
    }

    /// Named parameters rendered by `Display`, `None` values skipped.
    fn params(&self) -> Vec<(&'static str, String)> {
        fn push<T: ToString>(out: &mut Vec<(&'static str, String)>, key: &'static str, v: &T) {
            out.push((key, v.to_string()));
        }

        let mut out = Vec::new();
        match self {
            Self::Text(data) => push(&mut out, "text", &data.text),
            Self::Emoji(data) => push(&mut out, "name", &data.name),
            Self::Markup(data) => {
                push(&mut out, "markup", &data.markup);
                push(&mut out, "style", &data.style);
                push(&mut out, "emoji", &data.emoji);
                if let Some(variant) = &data.emoji_variant {
                    push(&mut out, "emoji_variant", variant);
                }
            }
            Self::Markdown(data) => {
                push(&mut out, "markup", &data.markup);
                push(&mut out, "code_theme", &data.code_theme);
                if let Some(justify) = &data.justify {
                    push(&mut out, "justify", justify);
                }
                push(&mut out, "style", &data.style);
                push(&mut out, "hyperlinks", &data.hyperlinks);
                if let Some(lexer) = &data.inline_code_lexer {
                    push(&mut out, "inline_code_lexer", lexer);
                }
                if let Some(theme) = &data.inline_code_theme {
                    push(&mut out, "inline_code_theme", theme);
                }
            }
        }
        out
    }
}

impl fmt::Display for MessageSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Self::Text(data) = self {
            return f.write_str(&data.text);
        }

        let mut out = String::new();
        out.push('[');
        out.push_str(self.kind());
        for (i, (key, value)) in self.params().iter().enumerate() {
            out.push_str(if i == 0 { ":" } else { ", " });
            let _ = write!(out, "{}={}", key, truncate(value, DISPLAY_VALUE_LIMIT));
        }
        out.push(']');
        f.write_str(&out)
    }
}

impl From<&str> for MessageSegment {
    fn from(text: &str) -> Self {
        Self::text(text)
    }
}

impl From<String> for MessageSegment {
    fn from(text: String) -> Self {
        Self::text(text)
    }
}

impl From<MarkupData> for MessageSegment {
    fn from(data: MarkupData) -> Self {
        Self::Markup(data)
    }
}

impl From<MarkdownData> for MessageSegment {
    fn from(data: MarkdownData) -> Self {
        Self::Markdown(data)
    }
}

/// Shortens `s` to at most `limit` characters, ending with `...` when cut.
///
/// Counts characters, not bytes, so multi-byte text is never split.
pub fn truncate(s: &str, limit: usize) -> String {
    const END: &str = "...";

    if s.chars().count() <= limit {
        return s.to_string();
    }
    let keep = limit.saturating_sub(END.len());
    let mut out: String = s.chars().take(keep).collect();
    out.push_str(END);
    out
}

// ============================================================================
// Segment Data Types
// ============================================================================

/// Plain text segment data.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TextData {
    /// The text content.
    pub text: String,
}

/// Emoji segment data.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EmojiData {
    /// Emoji name without colons.
    pub name: String,
}

/// Emoji presentation variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmojiVariant {
    Emoji,
    Text,
}

impl fmt::Display for EmojiVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Emoji => "emoji",
            Self::Text => "text",
        })
    }
}

/// Markup segment data.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MarkupData {
    /// Raw markup source.
    pub markup: String,
    /// Base style applied to the whole markup.
    #[serde(default = "default_style")]
    pub style: String,
    /// Whether `:name:` emoji codes are rendered.
    #[serde(default = "default_true")]
    pub emoji: bool,
    /// Emoji presentation override.
    #[serde(default)]
    pub emoji_variant: Option<EmojiVariant>,
}

impl MarkupData {
    /// Creates markup data with the default style and emoji rendering on.
    pub fn new(markup: impl Into<String>) -> Self {
        Self {
            markup: markup.into(),
            style: default_style(),
            emoji: true,
            emoji_variant: None,
        }
    }

    pub fn style(mut self, style: impl Into<String>) -> Self {
        self.style = style.into();
        self
    }

    pub fn emoji(mut self, enabled: bool) -> Self {
        self.emoji = enabled;
        self
    }

    pub fn emoji_variant(mut self, variant: EmojiVariant) -> Self {
        self.emoji_variant = Some(variant);
        self
    }
}

/// Text justification for markdown rendering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Justify {
    Default,
    Left,
    Center,
    Right,
    Full,
}

impl fmt::Display for Justify {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Default => "default",
            Self::Left => "left",
            Self::Center => "center",
            Self::Right => "right",
            Self::Full => "full",
        })
    }
}

/// Markdown segment data.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MarkdownData {
    /// Markdown source.
    pub markup: String,
    /// Syntax theme for fenced code blocks.
    #[serde(default = "default_code_theme")]
    pub code_theme: String,
    #[serde(default)]
    pub justify: Option<Justify>,
    #[serde(default = "default_style")]
    pub style: String,
    /// Whether links are rendered as terminal hyperlinks.
    #[serde(default = "default_true")]
    pub hyperlinks: bool,
    #[serde(default)]
    pub inline_code_lexer: Option<String>,
    #[serde(default)]
    pub inline_code_theme: Option<String>,
}

impl MarkdownData {
    /// Creates markdown data with the `monokai` code theme and hyperlinks on.
    pub fn new(markup: impl Into<String>) -> Self {
        Self {
            markup: markup.into(),
            code_theme: default_code_theme(),
            justify: None,
            style: default_style(),
            hyperlinks: true,
            inline_code_lexer: None,
            inline_code_theme: None,
        }
    }

    pub fn code_theme(mut self, theme: impl Into<String>) -> Self {
        self.code_theme = theme.into();
        self
    }

    pub fn justify(mut self, justify: Justify) -> Self {
        self.justify = Some(justify);
        self
    }

    pub fn style(mut self, style: impl Into<String>) -> Self {
        self.style = style.into();
        self
    }

    pub fn hyperlinks(mut self, enabled: bool) -> Self {
        self.hyperlinks = enabled;
        self
    }

    pub fn inline_code(mut self, lexer: impl Into<String>, theme: impl Into<String>) -> Self {
        self.inline_code_lexer = Some(lexer.into());
        self.inline_code_theme = Some(theme.into());
        self
    }
}

fn default_style() -> String {
    "none".to_string()
}

fn default_code_theme() -> String {
    "monokai".to_string()
}

fn default_true() -> bool {
    true
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_segment_serialize() {
        let text = MessageSegment::text("Hello");
        let json = serde_json::to_string(&text).unwrap();
        assert_eq!(json, r#"{"type":"text","data":{"text":"Hello"}}"#);

        let emoji = MessageSegment::emoji("smile");
        let json = serde_json::to_string(&emoji).unwrap();
        assert_eq!(json, r#"{"type":"emoji","data":{"name":"smile"}}"#);
    }

    #[test]
    fn test_segment_deserialize_fills_defaults() {
        let json = r##"{"type":"markdown","data":{"markup":"# Title"}}"##;
        let segment: MessageSegment = serde_json::from_str(json).unwrap();
        assert_eq!(segment, MarkdownData::new("# Title").into());

        let json = r#"{"type":"markup","data":{"markup":"[b]x[/b]"}}"#;
        let segment: MessageSegment = serde_json::from_str(json).unwrap();
        assert_eq!(segment, MarkupData::new("[b]x[/b]").into());

        let json = r#"{"type":"image","data":{"file":"a.png"}}"#;
        assert!(serde_json::from_str::<MessageSegment>(json).is_err());
    }

    #[test]
    fn test_display() {
        assert_eq!(MessageSegment::text("plain").to_string(), "plain");
        assert_eq!(
            MessageSegment::emoji("wave").to_string(),
            "[emoji:name=wave]"
        );
        assert_eq!(
            MessageSegment::from(MarkupData::new("[b]hi[/b]")).to_string(),
            "[markup:markup=[b]hi[/b], style=none, emoji=true]"
        );
        assert_eq!(
            MessageSegment::from(MarkdownData::new("# hi").justify(Justify::Center)).to_string(),
            "[markdown:markup=# hi, code_theme=monokai, justify=center, style=none, hyperlinks=true]"
        );
    }

    #[test]
    fn test_display_truncates_long_values() {
        let long = "x".repeat(100);
        let shown = MessageSegment::emoji(long).to_string();
        let value = shown
            .strip_prefix("[emoji:name=")
            .and_then(|s| s.strip_suffix(']'))
            .unwrap();
        assert_eq!(value.chars().count(), DISPLAY_VALUE_LIMIT);
        assert!(value.ends_with("..."));
    }

    #[test]
    fn test_truncate_respects_char_boundaries() {
        let s = "你好".repeat(50);
        let cut = truncate(&s, 70);
        assert_eq!(cut.chars().count(), 70);
        assert!(cut.starts_with("你好你"));
        assert!(cut.ends_with("..."));

        assert_eq!(truncate("short", 70), "short");
        assert_eq!(truncate("", 70), "");
    }

    #[test]
    fn test_empty_strings_are_legal() {
        assert_eq!(MessageSegment::text("").as_text(), Some(""));
        assert_eq!(MessageSegment::emoji("").kind(), "emoji");
    }

    #[test]
    fn test_full_constructors() {
        let seg = MessageSegment::markup("x", "bold", false, Some(EmojiVariant::Text));
        assert_eq!(
            seg,
            MarkupData::new("x")
                .style("bold")
                .emoji(false)
                .emoji_variant(EmojiVariant::Text)
                .into()
        );

        let seg = MessageSegment::markdown(
            "`a`",
            "monokai",
            Some(Justify::Left),
            "none",
            false,
            Some("rust".into()),
            Some("dracula".into()),
        );
        assert_eq!(
            seg,
            MarkdownData::new("`a`")
                .justify(Justify::Left)
                .hyperlinks(false)
                .inline_code("rust", "dracula")
                .into()
        );
    }
}
