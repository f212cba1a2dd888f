//! The only write path into the ledger
//!
//! Every operation runs cooldown check, score read, dampening and ledger
//! write inside one per-(user, channel) critical section. Pairs map onto a
//! fixed table of striped locks, so unrelated pairs mostly proceed in
//! parallel and the table never grows. The shared global total is an atomic
//! counter bumped only after the ledger accepted the write.

use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Mutex, PoisonError};
use std::time::{SystemTime, UNIX_EPOCH};

use ahash::RandomState;
use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::{debug, info, warn};

use super::cooldown::CooldownGate;
use super::dampening::{Crossing, DampeningParams};
use super::outcome::{AppliedRespec, EventKind, Outcome, SkipReason};
use crate::core::clock::{Clock, SystemClock};
use crate::core::config::RespecConfig;
use crate::core::error::{RespecError, Result};
use crate::core::types::{Channel, ChannelId, RespecRecord, Scope, User, UserId};
use crate::leaderboard::{self, Leaderboard};
use crate::ledger::Ledger;

/// Number of striped pair locks
pub const LOCK_STRIPES: usize = 64;

pub struct RespecEngine<L> {
    ledger: L,
    config: RespecConfig,
    dampening: DampeningParams,
    cooldown: CooldownGate,
    clock: Box<dyn Clock>,
    rng: Mutex<Box<dyn RngCore + Send>>,
    global_total: AtomicI64,
    pair_locks: Box<[Mutex<()>]>,
    pair_hasher: RandomState,
}

impl<L: Ledger> RespecEngine<L> {
    /// Build an engine over `ledger`, deriving the global total from its history
    pub fn new(ledger: L, config: RespecConfig) -> Result<Self> {
        config.validate().map_err(RespecError::InvalidConfig)?;

        let seed = config.seed.unwrap_or_else(time_seed);
        let global_total = ledger.global_total()?;
        let rated = ledger.load_scores(&Scope::Global)?.len();
        info!(
            "Loaded {} ratings, global respec total {}, rng seed {}",
            rated, global_total, seed
        );

        Ok(Self {
            dampening: config.dampening(),
            cooldown: config.cooldown(),
            config,
            ledger,
            clock: Box::new(SystemClock),
            rng: Mutex::new(Box::new(ChaCha8Rng::seed_from_u64(seed))),
            global_total: AtomicI64::new(global_total),
            pair_locks: (0..LOCK_STRIPES).map(|_| Mutex::new(())).collect(),
            pair_hasher: RandomState::new(),
        })
    }

    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    /// Replace the dampening random source
    pub fn with_rng(mut self, rng: impl RngCore + Send + 'static) -> Self {
        self.rng = Mutex::new(Box::new(rng));
        self
    }

    pub fn ledger(&self) -> &L {
        &self.ledger
    }

    pub fn config(&self) -> &RespecConfig {
        &self.config
    }

    pub fn global_total(&self) -> i64 {
        self.global_total.load(Ordering::SeqCst)
    }

    /// Chat message by `author`. Earns respec only in an active channel and is
    /// never rate limited.
    pub fn process_organic_message(
        &self,
        author: &User,
        channel: &Channel,
        base_value: i64,
    ) -> Result<Outcome> {
        if !channel.active {
            return Ok(Outcome::skipped(
                EventKind::OrganicMessage,
                &author.id,
                SkipReason::InactiveChannel,
            ));
        }
        self.apply(EventKind::OrganicMessage, author, channel, base_value)
    }

    /// One mentioned user. Cooldown gated.
    pub fn process_mention(
        &self,
        mentioned: &User,
        channel: &Channel,
        mention_value: i64,
    ) -> Result<Outcome> {
        self.apply(EventKind::Mention, mentioned, channel, mention_value)
    }

    /// `reactor` reacted to a message by `author`; the author gets the respec
    pub fn process_reaction_added(
        &self,
        reactor: &User,
        author: &User,
        channel: &Channel,
        other_value: i64,
    ) -> Result<Outcome> {
        if reactor.id == author.id {
            return Ok(Outcome::skipped(
                EventKind::ReactionAdded,
                &author.id,
                SkipReason::SelfInteraction,
            ));
        }
        self.apply(EventKind::ReactionAdded, author, channel, other_value)
    }

    /// Retracted approval: the author loses `mention_value`
    pub fn process_reaction_removed(
        &self,
        reactor: &User,
        author: &User,
        channel: &Channel,
        mention_value: i64,
    ) -> Result<Outcome> {
        if reactor.id == author.id {
            return Ok(Outcome::skipped(
                EventKind::ReactionRemoved,
                &author.id,
                SkipReason::SelfInteraction,
            ));
        }
        self.apply(EventKind::ReactionRemoved, author, channel, -mention_value)
    }

    pub fn leaderboard(&self, scope: &Scope) -> Result<Leaderboard> {
        leaderboard::query(&self.ledger, scope, self.config.leaderboard_size)
    }

    fn apply(
        &self,
        kind: EventKind,
        user: &User,
        channel: &Channel,
        proposed: i64,
    ) -> Result<Outcome> {
        let _guard = self
            .pair_lock(&user.id, &channel.id)
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        let now = self.clock.now();
        if kind.is_external() {
            let blocked = self
                .cooldown
                .check(&self.ledger, &user.id, &channel.id, now)
                .inspect_err(|e| warn!("Cooldown lookup for {} failed: {}", user.name, e))?;
            if let Some(remaining) = blocked {
                debug!(
                    "{:?} for {} in {} dropped by cooldown ({}s left)",
                    kind,
                    user.name,
                    channel.id,
                    remaining.num_seconds()
                );
                return Ok(Outcome::skipped(kind, &user.id, SkipReason::Cooldown));
            }
        }

        self.register(user, channel)
            .inspect_err(|e| warn!("Registering {} in {} failed: {}", user.name, channel.id, e))?;

        let previous = self
            .ledger
            .current_score(&user.id, &channel.id)
            .inspect_err(|e| warn!("Reading respec of {} failed: {}", user.name, e))?;

        let applied = {
            let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
            self.dampening
                .compute_delta(previous, self.global_total(), proposed, rng.as_mut())
        };
        let score = previous + applied;

        self.ledger
            .append_record(RespecRecord {
                user: user.id.clone(),
                channel: channel.id.clone(),
                score,
                timestamp: now,
            })
            .inspect_err(|e| warn!("Writing respec of {} failed: {}", user.name, e))?;
        self.global_total.fetch_add(applied, Ordering::SeqCst);

        let crossing = Crossing::classify(previous, score);
        debug!("{} {:+} respec ({:?})", user.name, applied, kind);
        match crossing {
            Crossing::Negative => info!("{} dropped into negative respec", user.name),
            Crossing::Positive => info!("{} climbed out of negative respec", user.name),
            Crossing::Stable => {}
        }

        Ok(Outcome::Applied(AppliedRespec {
            kind,
            user: user.id.clone(),
            name: user.name.clone(),
            channel: channel.id.clone(),
            proposed,
            applied,
            previous,
            score,
            crossing,
            timestamp: now,
        }))
    }

    /// Make sure the ledger knows the user, the channel and its server so
    /// the record shows up at every scope under the user's display name
    fn register(&self, user: &User, channel: &Channel) -> Result<()> {
        self.ledger.get_or_create_server(&channel.server)?;
        self.ledger.get_or_create_channel(&channel.id, &channel.server)?;
        self.ledger.get_or_create_user(&user.id, &user.name, user.bot)?;
        Ok(())
    }

    fn pair_lock(&self, user: &UserId, channel: &ChannelId) -> &Mutex<()> {
        let hash = self.pair_hasher.hash_one((user, channel));
        &self.pair_locks[(hash % self.pair_locks.len() as u64) as usize]
    }

    #[cfg(test)]
    fn lock_table_len(&self) -> usize {
        self.pair_locks.len()
    }
}

fn time_seed() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or_default()
}
