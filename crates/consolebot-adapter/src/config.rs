//! Configuration types for the console adapter.
//!
//! Loaded from the `console` section of the runtime configuration file.
//!
//! # Example Configuration
//!
//! ```toml
//! [console]
//! nicknames = ["bot", "小助手"]
//! force_to_me = false
//! shutdown_timeout_ms = 5000
//!
//! [console.bot]
//! id = "robot"
//! nickname = "Bot"
//! color = "blue"
//!
//! [console.frontend]
//! title = "Consolebot"
//! chat_history_limit = 500
//!
//! [console.frontend.user]
//! id = "user"
//! nickname = "User"
//! ```

use std::time::Duration;

use serde::{Deserialize, Serialize};

use consolebot_core::{Robot, User};

/// Console adapter configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConsoleConfig {
    /// The bot identity connected on start.
    pub bot: BotInfo,

    /// Nicknames that address the bot at the start of a message.
    pub nicknames: Vec<String>,

    /// Treat every message as addressed to the bot.
    pub force_to_me: bool,

    /// How long shutdown waits for the front-end before aborting it.
    pub shutdown_timeout_ms: u64,

    /// Front-end settings.
    pub frontend: FrontendConfig,
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            bot: BotInfo::default(),
            nicknames: Vec::new(),
            force_to_me: false,
            shutdown_timeout_ms: default_shutdown_timeout_ms(),
            frontend: FrontendConfig::default(),
        }
    }
}

impl ConsoleConfig {
    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_millis(self.shutdown_timeout_ms)
    }
}

fn default_shutdown_timeout_ms() -> u64 {
    5000
}

/// Identity of the console bot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BotInfo {
    pub id: String,
    pub nickname: String,
    pub color: String,
}

impl Default for BotInfo {
    fn default() -> Self {
        Self {
            id: "robot".to_string(),
            nickname: "Bot".to_string(),
            color: "blue".to_string(),
        }
    }
}

impl BotInfo {
    pub fn to_robot(&self) -> Robot {
        Robot::new(&self.id, &self.nickname).with_color(&self.color)
    }
}

/// The human user of the console.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UserInfo {
    pub id: String,
    pub nickname: String,
}

impl Default for UserInfo {
    fn default() -> Self {
        Self {
            id: "user".to_string(),
            nickname: "User".to_string(),
        }
    }
}

impl UserInfo {
    pub fn to_user(&self) -> User {
        User::new(&self.id, &self.nickname)
    }
}

/// Front-end settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FrontendConfig {
    pub title: String,
    pub sub_title: String,
    pub user: UserInfo,
    /// Maximum number of chat messages kept in memory.
    pub chat_history_limit: usize,
    /// Maximum number of log lines kept in memory.
    pub log_history_limit: usize,
}

impl Default for FrontendConfig {
    fn default() -> Self {
        Self {
            title: "Consolebot".to_string(),
            sub_title: "Console adapter".to_string(),
            user: UserInfo::default(),
            chat_history_limit: DEFAULT_HISTORY_LIMIT,
            log_history_limit: DEFAULT_HISTORY_LIMIT,
        }
    }
}

/// Default size of the chat and log ring buffers.
pub const DEFAULT_HISTORY_LIMIT: usize = 500;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_config() {
        let json = r#"{
            "bot": { "id": "helper", "nickname": "Helper" },
            "nicknames": ["helper", "h"],
            "frontend": { "user": { "id": "alice" }, "chat_history_limit": 50 }
        }"#;

        let config: ConsoleConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.bot.id, "helper");
        assert_eq!(config.bot.color, "blue");
        assert_eq!(config.nicknames, vec!["helper", "h"]);
        assert!(!config.force_to_me);
        assert_eq!(config.frontend.user.id, "alice");
        assert_eq!(config.frontend.user.nickname, "User");
        assert_eq!(config.frontend.chat_history_limit, 50);
        assert_eq!(config.frontend.log_history_limit, DEFAULT_HISTORY_LIMIT);
        assert_eq!(config.shutdown_timeout(), Duration::from_secs(5));
    }

    #[test]
    fn test_to_robot() {
        let robot = BotInfo::default().to_robot();
        assert_eq!(robot.id, "robot");
        assert_eq!(robot.nickname, "Bot");
        assert_eq!(robot.color, "blue");
    }
}
