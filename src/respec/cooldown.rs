//! Rate limit for respec a user does not earn by typing
//!
//! Mentions and reactions are triggered by other people, so they are only
//! honoured when the target pair has not received any respec recently.
//! Organic chat never goes through this gate.

use chrono::Duration;

use crate::core::error::LedgerError;
use crate::core::types::{ChannelId, Timestamp, UserId};
use crate::ledger::Ledger;

/// Default minimum gap between externally-triggered respec (5 minutes)
pub const DEFAULT_COOLDOWN_SECS: i64 = 5 * 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CooldownGate {
    window: Duration,
}

impl CooldownGate {
    pub fn new(window: Duration) -> Self {
        Self { window }
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// Pure policy: allowed when nothing was applied yet, or the last
    /// application is strictly older than the window
    pub fn permits(&self, last_applied: Option<Timestamp>, now: Timestamp) -> bool {
        match last_applied {
            None => true,
            Some(last) => now - last > self.window,
        }
    }

    /// Look up the pair's last respec and apply the policy
    ///
    /// Returns the time left when the pair is still cooling down, `None` when
    /// the event may proceed. Must run inside the same per-pair critical
    /// section as the write that follows it, otherwise two bursts can both
    /// observe "no recent respec".
    pub fn check<L: Ledger + ?Sized>(
        &self,
        ledger: &L,
        user: &UserId,
        channel: &ChannelId,
        now: Timestamp,
    ) -> Result<Option<Duration>, LedgerError> {
        let last = ledger.last_respec_time(user, channel)?;
        Ok(self.remaining(last, now))
    }

    /// Time left before the pair can receive external respec again
    pub fn remaining(&self, last_applied: Option<Timestamp>, now: Timestamp) -> Option<Duration> {
        if self.permits(last_applied, now) {
            return None;
        }
        last_applied.map(|last| self.window - (now - last))
    }
}

impl Default for CooldownGate {
    fn default() -> Self {
        Self::new(Duration::seconds(DEFAULT_COOLDOWN_SECS))
    }
}
