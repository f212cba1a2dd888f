use serde::{Deserialize, Serialize};

use super::dampening::Crossing;
use crate::core::types::{ChannelId, Timestamp, UserId};

/// Which write path produced an outcome
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    OrganicMessage,
    Mention,
    ReactionAdded,
    ReactionRemoved,
}

impl EventKind {
    /// Mentions and reactions are triggered by someone other than the target
    pub fn is_external(self) -> bool {
        !matches!(self, EventKind::OrganicMessage)
    }
}

/// Why an event left the ledger untouched
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    InactiveChannel,
    Cooldown,
    SelfInteraction,
    BotAuthor,
}

/// A respec change that reached the ledger
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppliedRespec {
    pub kind: EventKind,
    pub user: UserId,
    /// Display name at the time of the update
    pub name: String,
    pub channel: ChannelId,
    pub proposed: i64,
    pub applied: i64,
    pub previous: i64,
    pub score: i64,
    pub crossing: Crossing,
    pub timestamp: Timestamp,
}

impl AppliedRespec {
    /// Dampening negated the proposed delta
    pub fn flipped(&self) -> bool {
        self.applied != self.proposed
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum Outcome {
    Applied(AppliedRespec),
    Skipped {
        kind: EventKind,
        user: UserId,
        reason: SkipReason,
    },
}

impl Outcome {
    pub fn skipped(kind: EventKind, user: &UserId, reason: SkipReason) -> Self {
        Outcome::Skipped {
            kind,
            user: user.clone(),
            reason,
        }
    }

    pub fn applied(&self) -> Option<&AppliedRespec> {
        match self {
            Outcome::Applied(applied) => Some(applied),
            Outcome::Skipped { .. } => None,
        }
    }

    pub fn is_applied(&self) -> bool {
        self.applied().is_some()
    }

    pub fn applied_delta(&self) -> Option<i64> {
        self.applied().map(|a| a.applied)
    }

    pub fn skip_reason(&self) -> Option<SkipReason> {
        match self {
            Outcome::Skipped { reason, .. } => Some(*reason),
            Outcome::Applied(_) => None,
        }
    }
}

/// Everything one platform event did to the ledger
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageReport {
    pub outcomes: Vec<Outcome>,
}

impl MessageReport {
    pub fn applied(&self) -> impl Iterator<Item = &AppliedRespec> {
        self.outcomes.iter().filter_map(Outcome::applied)
    }

    /// Net change to the global total caused by this event
    pub fn net_delta(&self) -> i64 {
        self.applied().map(|a| a.applied).sum()
    }

    pub fn crossings(&self) -> impl Iterator<Item = &AppliedRespec> {
        self.applied().filter(|a| a.crossing != Crossing::Stable)
    }
}
