//! Events delivered by the chat platform
//!
//! These carry raw identities only. Channel activity and canonical user
//! records come from the ledger when the engine resolves them.

use ahash::AHashSet;
use serde::{Deserialize, Serialize};

use crate::core::types::{ChannelId, ServerId, UserId};

/// A user as the platform reports them
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRef {
    pub id: UserId,
    pub name: String,
    #[serde(default)]
    pub bot: bool,
}

impl UserRef {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: UserId::new(id),
            name: name.into(),
            bot: false,
        }
    }
}

/// A channel and the server it belongs to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelRef {
    pub id: ChannelId,
    pub server: ServerId,
}

impl ChannelRef {
    pub fn new(id: impl Into<String>, server: impl Into<String>) -> Self {
        Self {
            id: ChannelId::new(id),
            server: ServerId::new(server),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PlatformEvent {
    Message {
        author: UserRef,
        channel: ChannelRef,
        /// Only the command layer reads the text
        #[serde(default)]
        content: String,
        #[serde(default)]
        mentions: Vec<UserRef>,
    },
    ReactionAdded {
        reactor: UserRef,
        author: UserRef,
        channel: ChannelRef,
    },
    ReactionRemoved {
        reactor: UserRef,
        author: UserRef,
        channel: ChannelRef,
    },
}

impl PlatformEvent {
    pub fn channel(&self) -> &ChannelRef {
        match self {
            PlatformEvent::Message { channel, .. }
            | PlatformEvent::ReactionAdded { channel, .. }
            | PlatformEvent::ReactionRemoved { channel, .. } => channel,
        }
    }

    /// Mentioned users with duplicates removed, in first-mention order
    ///
    /// A user reached through several mentions (directly and via a role, say)
    /// only counts once per message.
    pub fn unique_mentions(&self) -> Vec<&UserRef> {
        let PlatformEvent::Message { mentions, .. } = self else {
            return Vec::new();
        };
        let mut seen = AHashSet::new();
        mentions.iter().filter(|m| seen.insert(&m.id)).collect()
    }
}
