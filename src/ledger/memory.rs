//! In-process ledger with JSON snapshots

use std::fs;
use std::path::Path;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use ahash::AHashMap;
use serde::{Deserialize, Serialize};

use super::{Ledger, LedgerResult};
use crate::core::error::{LedgerError, Result};
use crate::core::types::{
    Channel, ChannelId, RespecRecord, Scope, ScoreEntry, Server, ServerId, Timestamp, User, UserId,
};

type PairKey = (UserId, ChannelId);

#[derive(Debug, Default)]
struct LedgerState {
    users: AHashMap<UserId, User>,
    servers: AHashMap<ServerId, Server>,
    channels: AHashMap<ChannelId, Channel>,
    /// Latest record per pair
    current: AHashMap<PairKey, RespecRecord>,
    history: Vec<RespecRecord>,
}

impl LedgerState {
    fn insert_record(&mut self, record: RespecRecord) {
        self.current
            .insert((record.user.clone(), record.channel.clone()), record.clone());
        self.history.push(record);
    }

    fn display_name(&self, user: &UserId) -> String {
        self.users
            .get(user)
            .map(|u| u.name.clone())
            .unwrap_or_else(|| user.to_string())
    }
}

/// Serializable image of a [`MemoryLedger`]
///
/// Only the append-only history is stored for scores; current scores are
/// rebuilt from it on load.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LedgerSnapshot {
    pub users: Vec<User>,
    pub servers: Vec<Server>,
    pub channels: Vec<Channel>,
    pub history: Vec<RespecRecord>,
}

/// [`Ledger`] backed by hash maps behind a single `RwLock`
#[derive(Debug, Default)]
pub struct MemoryLedger {
    state: RwLock<LedgerState>,
}

impl MemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_snapshot(snapshot: LedgerSnapshot) -> Self {
        let mut state = LedgerState::default();
        for user in snapshot.users {
            state.users.insert(user.id.clone(), user);
        }
        for server in snapshot.servers {
            state.servers.insert(server.id.clone(), server);
        }
        for channel in snapshot.channels {
            state.channels.insert(channel.id.clone(), channel);
        }
        for record in snapshot.history {
            state.insert_record(record);
        }
        Self {
            state: RwLock::new(state),
        }
    }

    pub fn snapshot(&self) -> LedgerResult<LedgerSnapshot> {
        let state = self.read()?;
        let mut users: Vec<User> = state.users.values().cloned().collect();
        users.sort_by(|a, b| a.id.cmp(&b.id));
        let mut servers: Vec<Server> = state.servers.values().cloned().collect();
        servers.sort_by(|a, b| a.id.cmp(&b.id));
        let mut channels: Vec<Channel> = state.channels.values().cloned().collect();
        channels.sort_by(|a, b| a.id.cmp(&b.id));

        Ok(LedgerSnapshot {
            users,
            servers,
            channels,
            history: state.history.clone(),
        })
    }

    /// Read a snapshot file; a missing file yields an empty ledger
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::debug!("No ledger state at {}, starting empty", path.display());
            return Ok(Self::new());
        }
        let content = fs::read_to_string(path)?;
        let snapshot: LedgerSnapshot = serde_json::from_str(&content)?;
        Ok(Self::from_snapshot(snapshot))
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let snapshot = self.snapshot()?;
        fs::write(path, serde_json::to_string_pretty(&snapshot)?)?;
        Ok(())
    }

    /// Full history of one pair, oldest first
    pub fn history(&self, user: &UserId, channel: &ChannelId) -> LedgerResult<Vec<RespecRecord>> {
        let state = self.read()?;
        Ok(state
            .history
            .iter()
            .filter(|r| &r.user == user && &r.channel == channel)
            .cloned()
            .collect())
    }

    pub fn history_len(&self) -> LedgerResult<usize> {
        Ok(self.read()?.history.len())
    }

    pub fn user_count(&self) -> LedgerResult<usize> {
        Ok(self.read()?.users.len())
    }

    fn read(&self) -> LedgerResult<RwLockReadGuard<'_, LedgerState>> {
        self.state.read().map_err(|_| LedgerError::Poisoned)
    }

    fn write(&self) -> LedgerResult<RwLockWriteGuard<'_, LedgerState>> {
        self.state.write().map_err(|_| LedgerError::Poisoned)
    }
}

impl Ledger for MemoryLedger {
    fn get_or_create_user(&self, id: &UserId, name: &str, bot: bool) -> LedgerResult<User> {
        let mut state = self.write()?;
        let user = state.users.entry(id.clone()).or_insert_with(|| User {
            id: id.clone(),
            name: name.to_string(),
            bot,
        });
        Ok(user.clone())
    }

    fn get_or_create_server(&self, id: &ServerId) -> LedgerResult<Server> {
        let mut state = self.write()?;
        let server = state
            .servers
            .entry(id.clone())
            .or_insert_with(|| Server { id: id.clone() });
        Ok(server.clone())
    }

    fn get_or_create_channel(&self, id: &ChannelId, server: &ServerId) -> LedgerResult<Channel> {
        let mut state = self.write()?;
        state
            .servers
            .entry(server.clone())
            .or_insert_with(|| Server { id: server.clone() });
        let channel = state.channels.entry(id.clone()).or_insert_with(|| Channel {
            id: id.clone(),
            server: server.clone(),
            active: false,
        });
        Ok(channel.clone())
    }

    fn set_channel_active(&self, id: &ChannelId, active: bool) -> LedgerResult<bool> {
        let mut state = self.write()?;
        match state.channels.get_mut(id) {
            Some(channel) => {
                channel.active = active;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn current_score(&self, user: &UserId, channel: &ChannelId) -> LedgerResult<i64> {
        let state = self.read()?;
        Ok(state
            .current
            .get(&(user.clone(), channel.clone()))
            .map_or(0, |r| r.score))
    }

    fn last_respec_time(
        &self,
        user: &UserId,
        channel: &ChannelId,
    ) -> LedgerResult<Option<Timestamp>> {
        let state = self.read()?;
        Ok(state
            .current
            .get(&(user.clone(), channel.clone()))
            .map(|r| r.timestamp))
    }

    fn append_record(&self, record: RespecRecord) -> LedgerResult<()> {
        self.write()?.insert_record(record);
        Ok(())
    }

    fn global_total(&self) -> LedgerResult<i64> {
        Ok(self.read()?.current.values().map(|r| r.score).sum())
    }

    fn load_scores(&self, scope: &Scope) -> LedgerResult<Vec<ScoreEntry>> {
        let state = self.read()?;

        let visible = |record: &RespecRecord| match scope {
            Scope::Channel(id) => &record.channel == id,
            Scope::Server(id) => state
                .channels
                .get(&record.channel)
                .is_some_and(|c| &c.server == id),
            Scope::Global => true,
        };

        let mut totals: AHashMap<&UserId, i64> = AHashMap::new();
        for record in state.current.values().filter(|r| visible(*r)) {
            *totals.entry(&record.user).or_insert(0) += record.score;
        }

        let mut entries: Vec<ScoreEntry> = totals
            .into_iter()
            .map(|(user, score)| ScoreEntry {
                user: user.clone(),
                name: state.display_name(user),
                score,
            })
            .collect();
        // Hash order is random; hand out a stable retrieval order
        entries.sort_by(|a, b| a.user.cmp(&b.user));
        Ok(entries)
    }
}
