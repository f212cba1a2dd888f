//! Respec - per-channel chat reputation with self-balancing scores

pub mod core;
pub mod events;
pub mod leaderboard;
pub mod ledger;
pub mod respec;

pub use crate::core::error::{LedgerError, RespecError, Result};
pub use crate::core::types::{Channel, Scope, ScoreEntry, User};
pub use leaderboard::Leaderboard;
pub use ledger::{Ledger, MemoryLedger};
pub use respec::{Crossing, Outcome, RespecEngine};
