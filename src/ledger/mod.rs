//! Persistence contract for users, channels and respec history
//!
//! The engine never owns per-user scores; everything durable goes through
//! [`Ledger`]. Implementations must make the get-or-create operations
//! idempotent: concurrent first sightings of one identity resolve to a single
//! canonical record.

mod memory;

pub use memory::{LedgerSnapshot, MemoryLedger};

use std::sync::Arc;

use crate::core::error::LedgerError;
use crate::core::types::{
    Channel, ChannelId, RespecRecord, Scope, ScoreEntry, Server, ServerId, Timestamp, User, UserId,
};

pub type LedgerResult<T> = std::result::Result<T, LedgerError>;

pub trait Ledger: Send + Sync {
    /// Return the stored user, creating it on first sight
    fn get_or_create_user(&self, id: &UserId, name: &str, bot: bool) -> LedgerResult<User>;

    fn get_or_create_server(&self, id: &ServerId) -> LedgerResult<Server>;

    /// Return the stored channel, creating it (inactive) on first sight
    fn get_or_create_channel(&self, id: &ChannelId, server: &ServerId) -> LedgerResult<Channel>;

    /// Operator switch for organic respec. Returns false for an unknown channel.
    fn set_channel_active(&self, id: &ChannelId, active: bool) -> LedgerResult<bool>;

    /// Current cumulative score of the pair, 0 if it never received respec
    fn current_score(&self, user: &UserId, channel: &ChannelId) -> LedgerResult<i64>;

    fn last_respec_time(&self, user: &UserId, channel: &ChannelId)
        -> LedgerResult<Option<Timestamp>>;

    /// Durably append a history record and make it the pair's current score
    fn append_record(&self, record: RespecRecord) -> LedgerResult<()>;

    /// Sum of every applied delta, i.e. of all current scores
    fn global_total(&self) -> LedgerResult<i64>;

    /// Every user's score visible at `scope`. Server and global scopes sum a
    /// user's scores across the channels they cover.
    fn load_scores(&self, scope: &Scope) -> LedgerResult<Vec<ScoreEntry>>;
}

impl<L: Ledger + ?Sized> Ledger for Arc<L> {
    fn get_or_create_user(&self, id: &UserId, name: &str, bot: bool) -> LedgerResult<User> {
        (**self).get_or_create_user(id, name, bot)
    }

    fn get_or_create_server(&self, id: &ServerId) -> LedgerResult<Server> {
        (**self).get_or_create_server(id)
    }

    fn get_or_create_channel(&self, id: &ChannelId, server: &ServerId) -> LedgerResult<Channel> {
        (**self).get_or_create_channel(id, server)
    }

    fn set_channel_active(&self, id: &ChannelId, active: bool) -> LedgerResult<bool> {
        (**self).set_channel_active(id, active)
    }

    fn current_score(&self, user: &UserId, channel: &ChannelId) -> LedgerResult<i64> {
        (**self).current_score(user, channel)
    }

    fn last_respec_time(
        &self,
        user: &UserId,
        channel: &ChannelId,
    ) -> LedgerResult<Option<Timestamp>> {
        (**self).last_respec_time(user, channel)
    }

    fn append_record(&self, record: RespecRecord) -> LedgerResult<()> {
        (**self).append_record(record)
    }

    fn global_total(&self) -> LedgerResult<i64> {
        (**self).global_total()
    }

    fn load_scores(&self, scope: &Scope) -> LedgerResult<Vec<ScoreEntry>> {
        (**self).load_scores(scope)
    }
}
