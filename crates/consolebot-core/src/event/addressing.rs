//! Addressing: deciding whether a message is directed at the bot.
//!
//! Two passes run in order over the first segment, and only when it is a
//! text segment:
//!
//! 1. **Mention**: a leading `@<self_id>` or `@<nickname>` (case-sensitive)
//!    is removed together with the whitespace after it. The mention must be
//!    followed by whitespace or end the segment.
//! 2. **Nickname**: a leading configured nickname (case-insensitive),
//!    followed by spaces or commas, is removed.
//!
//! Either pass sets `to_me`. Neither ever clears it, and a failure to build
//! the nickname matcher only means nicknames are not recognized.

use regex::Regex;
use tracing::{trace, warn};

use super::{ConsoleEvent, InboundEvent, MessageEvent};
use crate::message::{Message, MessageSegment};
use crate::types::Robot;

/// Addressing rules for one bot identity.
#[derive(Debug, Clone)]
pub struct Addressing {
    self_id: String,
    nickname: String,
    nickname_regex: Option<Regex>,
    force_to_me: bool,
}

impl Addressing {
    /// Mention rules for `robot`, with no nickname set.
    pub fn new(robot: &Robot) -> Self {
        Self {
            self_id: robot.id.clone(),
            nickname: robot.nickname.clone(),
            nickname_regex: None,
            force_to_me: false,
        }
    }

    /// Sets the nicknames recognized by the nickname pass.
    pub fn nicknames<I, S>(mut self, nicknames: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.nickname_regex = build_nickname_regex(nicknames);
        self
    }

    /// Marks every message as addressed (non-strict mode).
    pub fn force_to_me(mut self, enabled: bool) -> Self {
        self.force_to_me = enabled;
        self
    }

    /// Runs both passes. Does nothing on an already addressed event.
    pub fn apply(&self, event: &mut MessageEvent) {
        if event.addressed {
            return;
        }
        event.addressed = true;

        self.strip_mention(event);
        self.strip_nickname(event);
        if self.force_to_me {
            event.to_me = true;
        }
        trace!(to_me = event.to_me, "Addressing applied");
    }

    /// Applies addressing and specializes the event.
    pub fn classify(&self, event: InboundEvent) -> ConsoleEvent {
        match event {
            InboundEvent::Notice(event) => ConsoleEvent::Notice(event),
            InboundEvent::Message(mut event) => {
                self.apply(&mut event);
                event.convert()
            }
        }
    }

    /// Mention pass.
    pub fn strip_mention(&self, event: &mut MessageEvent) {
        let Some(text) = first_text(&event.message) else {
            return;
        };

        let prefix = [&self.self_id, &self.nickname]
            .into_iter()
            .filter(|name| !name.is_empty())
            .map(|name| format!("@{name}"))
            .filter(|mention| mentions(text, mention))
            .max_by_key(String::len);
        let Some(prefix) = prefix else {
            return;
        };

        let rest = text[prefix.len()..].trim_start().to_string();
        event.to_me = true;

        if rest.is_empty() {
            event.message.remove(0);
            if event.message.is_empty() {
                event.message.push(MessageSegment::text(""));
            }
        } else {
            event.message[0] = MessageSegment::text(rest);
        }
    }

    /// Nickname pass.
    pub fn strip_nickname(&self, event: &mut MessageEvent) {
        let Some(regex) = &self.nickname_regex else {
            return;
        };
        let Some(text) = first_text(&event.message) else {
            return;
        };
        let Some(found) = regex.find(text) else {
            return;
        };

        let rest = text[found.end()..].to_string();
        event.to_me = true;
        event.message[0] = MessageSegment::text(rest);
    }
}

/// A mention counts only as a whole word: `@robotics` is not `@robot`.
fn mentions(text: &str, mention: &str) -> bool {
    text.strip_prefix(mention)
        .is_some_and(|rest| rest.is_empty() || rest.starts_with(char::is_whitespace))
}

fn first_text(message: &Message) -> Option<&str> {
    message.first().and_then(MessageSegment::as_text)
}

/// Builds `(?i)^(n1|n2|…)([\s,，]*|$)` from escaped nicknames, longest first.
fn build_nickname_regex<I, S>(nicknames: I) -> Option<Regex>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut names: Vec<String> = nicknames
        .into_iter()
        .map(|name| name.as_ref().to_string())
        .filter(|name| !name.is_empty())
        .collect();
    if names.is_empty() {
        return None;
    }
    names.sort_by(|a, b| b.len().cmp(&a.len()));
    names.dedup();

    let alternation = names
        .iter()
        .map(|name| regex::escape(name))
        .collect::<Vec<_>>()
        .join("|");
    match Regex::new(&format!(r"(?i)^({alternation})([\s,，]*|$)")) {
        Ok(regex) => Some(regex),
        Err(e) => {
            warn!(error = %e, "Failed to build nickname matcher, nicknames ignored");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Channel, User};

    fn robot() -> Robot {
        Robot::new("robot", "BotName")
    }

    fn public(message: impl Into<Message>) -> MessageEvent {
        MessageEvent::new(
            "robot",
            User::new("user", "User"),
            Channel::new("general", "General"),
            message.into(),
        )
    }

    #[test]
    fn test_mention_by_nickname_on_public_channel() {
        let rules = Addressing::new(&robot());
        let event = rules.classify(public("@BotName hello").into());

        let ConsoleEvent::Public(event) = event else {
            panic!("expected public event");
        };
        assert!(event.is_tome());
        assert_eq!(event.message.extract_plain_text(), "hello");
        assert_eq!(event.original_message(), &Message::from("@BotName hello"));
    }

    #[test]
    fn test_mention_by_id_and_nbsp() {
        let rules = Addressing::new(&robot());
        let mut event = public("@robot\u{a0} hi");
        rules.strip_mention(&mut event);
        assert!(event.to_me);
        assert_eq!(event.message, Message::from("hi"));
    }

    #[test]
    fn test_mention_is_case_sensitive() {
        let rules = Addressing::new(&robot());
        let mut event = public("@botname hello");
        rules.strip_mention(&mut event);
        assert!(!event.to_me);
        assert_eq!(event.message, event.original_message().clone());
    }

    #[test]
    fn test_mention_needs_word_boundary() {
        let rules = Addressing::new(&robot());

        let mut event = public("@robotics hi");
        rules.strip_mention(&mut event);
        assert!(!event.to_me);
        assert_eq!(event.message, Message::from("@robotics hi"));

        let mut event = public("@BotNameX hi");
        rules.strip_mention(&mut event);
        assert!(!event.to_me);

        let mut event = public("@robot");
        rules.strip_mention(&mut event);
        assert!(event.to_me);
    }

    #[test]
    fn test_mention_only_message_keeps_one_segment() {
        let rules = Addressing::new(&robot());

        let mut event = public("@BotName   ");
        rules.strip_mention(&mut event);
        assert!(event.to_me);
        assert_eq!(event.message, Message::from(""));

        let mut event = public("@BotName" + MessageSegment::emoji("wave"));
        rules.strip_mention(&mut event);
        assert_eq!(event.message, Message::from(MessageSegment::emoji("wave")));
    }

    #[test]
    fn test_non_text_first_segment_untouched() {
        let rules = Addressing::new(&robot()).nicknames(["BotName"]);
        let msg = MessageSegment::emoji("wave") + "@BotName hi";
        let mut event = public(msg.clone());
        rules.apply(&mut event);
        assert!(!event.to_me);
        assert_eq!(event.message, msg);
    }

    #[test]
    fn test_nickname_prefix() {
        let rules = Addressing::new(&robot()).nicknames(["bot", "小助手"]);

        let mut event = public("BOT, what time is it");
        rules.apply(&mut event);
        assert!(event.to_me);
        assert_eq!(event.message, Message::from("what time is it"));

        let mut event = public("小助手，你好");
        rules.apply(&mut event);
        assert!(event.to_me);
        assert_eq!(event.message, Message::from("你好"));

        let mut event = public("bot");
        rules.apply(&mut event);
        assert!(event.to_me);
        assert_eq!(event.message, Message::from(""));
    }

    #[test]
    fn test_nickname_is_escaped() {
        let rules = Addressing::new(&robot()).nicknames(["a.b"]);
        let mut event = public("axb hi");
        rules.apply(&mut event);
        assert!(!event.to_me);

        let mut event = public("a.b hi");
        rules.apply(&mut event);
        assert!(event.to_me);
    }

    #[test]
    fn test_mention_then_nickname() {
        let rules = Addressing::new(&robot()).nicknames(["bot"]);
        let mut event = public("@robot bot, ping");
        rules.apply(&mut event);
        assert!(event.to_me);
        assert_eq!(event.message, Message::from("ping"));
    }

    #[test]
    fn test_reapplying_is_idempotent() {
        let rules = Addressing::new(&robot()).nicknames(["bot"]);
        let mut event = public("@BotName bot bot hello");
        rules.apply(&mut event);
        let once = event.clone();
        rules.apply(&mut event);
        assert_eq!(event, once);
        assert!(event.to_me);

        // the mention pass alone is idempotent as well
        let mut event = public("@BotName hello");
        rules.strip_mention(&mut event);
        let once = event.clone();
        rules.strip_mention(&mut event);
        assert_eq!(event, once);
        assert!(event.to_me);
    }

    #[test]
    fn test_unaddressed_public_message() {
        let rules = Addressing::new(&robot()).nicknames(["bot"]);
        let event = rules.classify(public("robots are cool").into());
        assert!(!event.is_tome());
        assert_eq!(event.get_plain_text(), "robots are cool");
    }

    #[test]
    fn test_force_to_me() {
        let rules = Addressing::new(&robot()).force_to_me(true);
        let event = rules.classify(public("hello").into());
        assert!(event.is_tome());
        assert_eq!(event.get_plain_text(), "hello");
    }

    #[test]
    fn test_direct_message_always_to_me() {
        let rules = Addressing::new(&robot());
        let event = MessageEvent::new(
            "robot",
            User::new("user", "User"),
            Channel::direct(),
            "hi".into(),
        );
        let ConsoleEvent::Private(event) = rules.classify(event.into()) else {
            panic!("expected private event");
        };
        assert!(!event.to_me);
        assert!(event.is_tome());
    }
}
