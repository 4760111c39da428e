//! Identity records shared by the adapter and the front-end.

use serde::{Deserialize, Serialize};

/// ID of the distinguished private 1:1 channel.
pub const DIRECT_CHANNEL_ID: &str = "_direct";

/// Channel IDs with this prefix are private conversations as well.
pub const PRIVATE_CHANNEL_PREFIX: &str = "private:";

/// A human user of the console.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub nickname: String,
    /// Avatar glyph shown next to the user's messages.
    #[serde(default = "default_avatar")]
    pub avatar: String,
}

impl User {
    pub fn new(id: impl Into<String>, nickname: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            nickname: nickname.into(),
            avatar: default_avatar(),
        }
    }

    pub fn with_avatar(mut self, avatar: impl Into<String>) -> Self {
        self.avatar = avatar.into();
        self
    }
}

fn default_avatar() -> String {
    "👤".to_string()
}

/// A bot identity as seen by the front-end.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Robot {
    pub id: String,
    pub nickname: String,
    /// Color name used to render the bot's messages.
    #[serde(default = "default_robot_color")]
    pub color: String,
    #[serde(default = "default_robot_avatar")]
    pub avatar: String,
}

impl Robot {
    pub fn new(id: impl Into<String>, nickname: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            nickname: nickname.into(),
            color: default_robot_color(),
            avatar: default_robot_avatar(),
        }
    }

    pub fn with_color(mut self, color: impl Into<String>) -> Self {
        self.color = color.into();
        self
    }

    /// The robot as a message sender.
    pub fn as_user(&self) -> User {
        User::new(&self.id, &self.nickname).with_avatar(&self.avatar)
    }
}

fn default_robot_color() -> String {
    "blue".to_string()
}

fn default_robot_avatar() -> String {
    "🤖".to_string()
}

/// A conversation: either the DIRECT channel or a named group channel.
///
/// Equality is structural; DIRECT-ness is decided by [`Channel::is_direct`]
/// on the ID alone.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Channel {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub emoji: String,
}

impl Channel {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            emoji: "💬".to_string(),
        }
    }

    /// The distinguished private channel.
    pub fn direct() -> Self {
        Self {
            id: DIRECT_CHANNEL_ID.to_string(),
            name: "Direct".to_string(),
            emoji: "🔏".to_string(),
        }
    }

    /// A private channel with a specific user, as created by `create_dm`.
    pub fn private_with(user: &User) -> Self {
        Self {
            id: format!("{PRIVATE_CHANNEL_PREFIX}{}", user.id),
            name: user.nickname.clone(),
            emoji: user.avatar.clone(),
        }
    }

    /// Returns `true` for the DIRECT channel and `private:` channels.
    pub fn is_direct(&self) -> bool {
        self.id == DIRECT_CHANNEL_ID || self.id.starts_with(PRIVATE_CHANNEL_PREFIX)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_direct_by_identity() {
        assert!(Channel::direct().is_direct());

        // a different name does not matter, only the ID does
        let renamed = Channel::new(DIRECT_CHANNEL_ID, "whatever");
        assert!(renamed.is_direct());

        let dm = Channel::private_with(&User::new("alice", "Alice"));
        assert_eq!(dm.id, "private:alice");
        assert!(dm.is_direct());

        assert!(!Channel::new("general", "General").is_direct());
    }

    #[test]
    fn test_robot_as_user() {
        let robot = Robot::new("robot", "Bot").with_color("green");
        let user = robot.as_user();
        assert_eq!(user.id, "robot");
        assert_eq!(user.avatar, "🤖");
    }
}
