//! Core type definitions used throughout the codebase

use chrono::{DateTime, Utc};
use derive_more::{Display, From};
use serde::{Deserialize, Serialize};

/// Wall-clock instant attached to every respec record
pub type Timestamp = DateTime<Utc>;

macro_rules! platform_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Display, From,
        )]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self(id.to_string())
            }
        }
    };
}

platform_id!(
    /// Platform-stable user identifier
    UserId
);
platform_id!(
    /// Platform-stable channel identifier
    ChannelId
);
platform_id!(
    /// Platform-stable server (guild) identifier
    ServerId
);

/// A chat participant
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub name: String,
    #[serde(default)]
    pub bot: bool,
}

impl User {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: UserId::new(id),
            name: name.into(),
            bot: false,
        }
    }

    pub fn bot(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            bot: true,
            ..Self::new(id, name)
        }
    }
}

/// Coarse scope container owning channels
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Server {
    pub id: ServerId,
}

/// A chat channel
///
/// `active` gates whether organic chat earns respec. It belongs to the
/// operator; the engine only reads it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Channel {
    pub id: ChannelId,
    pub server: ServerId,
    #[serde(default)]
    pub active: bool,
}

impl Channel {
    pub fn new(id: impl Into<String>, server: impl Into<String>, active: bool) -> Self {
        Self {
            id: ChannelId::new(id),
            server: ServerId::new(server),
            active,
        }
    }
}

/// One entry of the append-only respec history
///
/// `score` is cumulative: the pair's score after this update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RespecRecord {
    pub user: UserId,
    pub channel: ChannelId,
    pub score: i64,
    pub timestamp: Timestamp,
}

/// Visibility breadth of a leaderboard query
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "scope", content = "target", rename_all = "snake_case")]
pub enum Scope {
    Channel(ChannelId),
    Server(ServerId),
    Global,
}

impl Scope {
    pub fn label(&self) -> String {
        match self {
            Scope::Channel(id) => format!("channel {}", id),
            Scope::Server(id) => format!("server {}", id),
            Scope::Global => "global".to_string(),
        }
    }
}

/// A user's score as visible at some [`Scope`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreEntry {
    pub user: UserId,
    pub name: String,
    pub score: i64,
}

impl ScoreEntry {
    pub fn new(user: impl Into<String>, name: impl Into<String>, score: i64) -> Self {
        Self {
            user: UserId::new(user),
            name: name.into(),
            score,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_display_inner_string() {
        assert_eq!(UserId::from("42").to_string(), "42");
        assert_eq!(ChannelId::new("general").as_str(), "general");
    }

    #[test]
    fn test_ids_serialize_transparently() {
        let json = serde_json::to_string(&ServerId::new("guild-1")).unwrap();
        assert_eq!(json, "\"guild-1\"");
    }

    #[test]
    fn test_scope_labels() {
        assert_eq!(Scope::Global.label(), "global");
        assert_eq!(Scope::Channel(ChannelId::new("c1")).label(), "channel c1");
        assert_eq!(Scope::Server(ServerId::new("s1")).label(), "server s1");
    }

    #[test]
    fn test_bot_constructor_sets_flag() {
        let user = User::bot("b", "Bot");
        assert!(user.bot);
        assert!(!User::new("u", "Human").bot);
    }
}
