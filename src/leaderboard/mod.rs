//! Ranked respec views at channel, server and global scope
//!
//! Ties on score are broken by display name and then user ID, so repeated
//! queries over unchanged data always rank identically no matter what order
//! the ledger hands entries back in.

mod render;

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::core::error::Result;
use crate::core::types::{Scope, ScoreEntry};
use crate::ledger::Ledger;

/// Non-negative entries shown on a board
pub const DEFAULT_LEADERBOARD_SIZE: usize = 15;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Leaderboard {
    pub scope: Scope,
    /// Highest scores first, all `>= 0`
    pub top: Vec<ScoreEntry>,
    /// Display names of every user below zero, alphabetical
    pub negative: Vec<String>,
}

impl Leaderboard {
    pub fn is_empty(&self) -> bool {
        self.top.is_empty() && self.negative.is_empty()
    }
}

fn by_rank(a: &ScoreEntry, b: &ScoreEntry) -> Ordering {
    b.score
        .cmp(&a.score)
        .then_with(|| a.name.cmp(&b.name))
        .then_with(|| a.user.cmp(&b.user))
}

/// Split entries into the top `size` non-negative scores and the negative names
pub fn rank(mut entries: Vec<ScoreEntry>, size: usize) -> (Vec<ScoreEntry>, Vec<String>) {
    entries.sort_by(by_rank);

    let (top, mut negative): (Vec<ScoreEntry>, Vec<ScoreEntry>) =
        entries.into_iter().partition(|e| e.score >= 0);

    let top = top.into_iter().take(size).collect();

    negative.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.user.cmp(&b.user)));
    let negative = negative.into_iter().map(|e| e.name).collect();

    (top, negative)
}

/// Read-only leaderboard for `scope`
///
/// A scope target the ledger knows nothing about yields an empty board.
pub fn query<L: Ledger + ?Sized>(ledger: &L, scope: &Scope, size: usize) -> Result<Leaderboard> {
    let entries = ledger.load_scores(scope)?;
    let (top, negative) = rank(entries, size);
    Ok(Leaderboard {
        scope: scope.clone(),
        top,
        negative,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rank_orders_and_splits() {
        let entries = vec![
            ScoreEntry::new("1", "dave", -4),
            ScoreEntry::new("2", "alice", 10),
            ScoreEntry::new("3", "carol", 0),
            ScoreEntry::new("4", "bob", 25),
            ScoreEntry::new("5", "anna", -1),
        ];
        let (top, negative) = rank(entries, 15);

        let names: Vec<&str> = top.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["bob", "alice", "carol"]);
        assert_eq!(negative, vec!["anna".to_string(), "dave".to_string()]);
    }

    #[test]
    fn test_rank_cuts_top_but_keeps_all_negatives() {
        let mut entries: Vec<ScoreEntry> = (0..20)
            .map(|i| ScoreEntry::new(format!("p{}", i), format!("pos{:02}", i), i))
            .collect();
        entries.extend(
            (0..20).map(|i| ScoreEntry::new(format!("n{}", i), format!("neg{:02}", i), -1 - i)),
        );

        let (top, negative) = rank(entries, 15);
        assert_eq!(top.len(), 15);
        assert_eq!(top[0].score, 19);
        assert_eq!(top[14].score, 5);
        assert_eq!(negative.len(), 20);
        assert_eq!(negative[0], "neg00");
    }

    #[test]
    fn test_ties_broken_by_name_then_id() {
        let entries = vec![
            ScoreEntry::new("z", "sam", 5),
            ScoreEntry::new("b", "amy", 5),
            ScoreEntry::new("a", "sam", 5),
        ];
        let (top, _) = rank(entries, 15);
        let ids: Vec<&str> = top.iter().map(|e| e.user.as_str()).collect();
        assert_eq!(ids, vec!["b", "a", "z"]);
    }

    #[test]
    fn test_empty_input() {
        let (top, negative) = rank(Vec::new(), 15);
        assert!(top.is_empty());
        assert!(negative.is_empty());
    }
}
