//! Global Leaderboard
//!
//! Saves and retrieves finished-session scores for the leaderboard view.
//! Persistence goes through the injected [`KvStore`]; in production that is
//! a backend API, in tests an in-memory store.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;
use uuid::Uuid;

use crate::core::storage::KvStore;

pub mod weekly;

/// Keep only the top scores.
pub const MAX_ENTRIES: usize = 100;
/// Retry size when the store rejects a full write.
const REDUCED_ENTRIES: usize = 50;
/// Default storage key.
const LEADERBOARD_KEY: &str = "verdict_arena_leaderboard";

/// One finished session on the global leaderboard.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    /// Unique entry id.
    pub id: Uuid,
    /// Player name as entered.
    pub username: String,
    /// Final session score.
    pub score: u32,
    /// Rounds answered correctly.
    pub correct_answers: u32,
    /// Rounds in the session.
    pub total_rounds: u32,
    /// Accuracy percentage in `[0, 100]`.
    pub accuracy: u32,
    /// When the session finished.
    pub played_at: DateTime<Utc>,
}

/// Aggregate leaderboard statistics.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaderboardStats {
    /// Distinct players (case-insensitive).
    pub total_players: usize,
    /// Total recorded sessions.
    pub total_games: usize,
    /// Best score on the board.
    pub highest_score: u32,
    /// Mean score, rounded.
    pub average_score: u32,
    /// Mean accuracy, rounded.
    pub average_accuracy: u32,
}

/// Score board over any [`KvStore`], capped at [`MAX_ENTRIES`].
pub struct GlobalLeaderboard {
    store: Arc<dyn KvStore>,
    key: String,
}

impl GlobalLeaderboard {
    /// Leaderboard under the default storage key.
    pub fn new(store: Arc<dyn KvStore>) -> Self {
        Self::with_key(store, LEADERBOARD_KEY)
    }

    /// Leaderboard under a custom storage key.
    pub fn with_key(store: Arc<dyn KvStore>, key: &str) -> Self {
        Self {
            store,
            key: key.to_string(),
        }
    }

    /// All entries, best first (score desc, then accuracy desc, then most
    /// recent). Unreadable or corrupt storage yields an empty board.
    pub fn entries(&self) -> Vec<LeaderboardEntry> {
        let Some(raw) = self.store.get(&self.key) else {
            return Vec::new();
        };
        match serde_json::from_str::<Vec<LeaderboardEntry>>(&raw) {
            Ok(mut entries) => {
                sort_entries(&mut entries);
                entries
            }
            Err(err) => {
                warn!(error = %err, "leaderboard storage corrupt, starting empty");
                Vec::new()
            }
        }
    }

    /// Record a finished session. Returns the new entry.
    pub fn add(
        &self,
        username: &str,
        score: u32,
        correct_answers: u32,
        total_rounds: u32,
        now: DateTime<Utc>,
    ) -> LeaderboardEntry {
        let accuracy = if total_rounds == 0 {
            0
        } else {
            (correct_answers * 100 + total_rounds / 2) / total_rounds
        };
        let entry = LeaderboardEntry {
            id: Uuid::new_v4(),
            username: username.to_string(),
            score,
            correct_answers,
            total_rounds,
            accuracy,
            played_at: now,
        };

        let mut entries = self.entries();
        entries.push(entry.clone());
        sort_entries(&mut entries);
        entries.truncate(MAX_ENTRIES);

        self.persist(&entries);
        entry
    }

    /// A player's best entry.
    pub fn player_best(&self, username: &str) -> Option<LeaderboardEntry> {
        // Entries are already best-first.
        self.entries()
            .into_iter()
            .find(|e| e.username.eq_ignore_ascii_case(username))
    }

    /// A player's 1-based rank, by their best entry.
    pub fn player_rank(&self, username: &str) -> Option<usize> {
        self.entries()
            .iter()
            .position(|e| e.username.eq_ignore_ascii_case(username))
            .map(|idx| idx + 1)
    }

    /// All of a player's entries, best first.
    pub fn player_history(&self, username: &str) -> Vec<LeaderboardEntry> {
        self.entries()
            .into_iter()
            .filter(|e| e.username.eq_ignore_ascii_case(username))
            .collect()
    }

    /// Top `n` entries.
    pub fn top(&self, n: usize) -> Vec<LeaderboardEntry> {
        let mut entries = self.entries();
        entries.truncate(n);
        entries
    }

    /// Aggregate statistics over the board.
    pub fn stats(&self) -> LeaderboardStats {
        let entries = self.entries();
        if entries.is_empty() {
            return LeaderboardStats {
                total_players: 0,
                total_games: 0,
                highest_score: 0,
                average_score: 0,
                average_accuracy: 0,
            };
        }

        let mut names: Vec<String> = entries
            .iter()
            .map(|e| e.username.to_lowercase())
            .collect();
        names.sort();
        names.dedup();

        let count = entries.len() as u32;
        let total_score: u32 = entries.iter().map(|e| e.score).sum();
        let total_accuracy: u32 = entries.iter().map(|e| e.accuracy).sum();

        LeaderboardStats {
            total_players: names.len(),
            total_games: entries.len(),
            highest_score: entries[0].score,
            average_score: (total_score + count / 2) / count,
            average_accuracy: (total_accuracy + count / 2) / count,
        }
    }

    /// Wipe the board.
    pub fn clear(&self) {
        self.store.remove(&self.key);
    }

    fn persist(&self, entries: &[LeaderboardEntry]) {
        let Ok(json) = serde_json::to_string(entries) else {
            return;
        };
        if self.store.set(&self.key, json).is_ok() {
            return;
        }

        // Storage full: keep fewer entries rather than losing the board.
        warn!("leaderboard write rejected, retrying with fewer entries");
        let reduced = &entries[..entries.len().min(REDUCED_ENTRIES)];
        if let Ok(json) = serde_json::to_string(reduced) {
            if let Err(err) = self.store.set(&self.key, json) {
                warn!(error = %err, "leaderboard write failed, giving up");
            }
        }
    }
}

fn sort_entries(entries: &mut [LeaderboardEntry]) {
    entries.sort_by(|a, b| {
        b.score
            .cmp(&a.score)
            .then(b.accuracy.cmp(&a.accuracy))
            .then(b.played_at.cmp(&a.played_at))
    });
}

// =============================================================================
// TESTS
// =============================================================================
