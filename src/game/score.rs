//! Derived Scoreboard Metrics
//!
//! Pure functions of a [`GameState`]. The snapshot is the JSON blob an
//! external leaderboard view reads from session storage.

use serde::{Deserialize, Serialize};

use crate::game::state::GameState;

/// Accuracy as a rounded percentage in `[0, 100]`.
///
/// Zero when no rounds have been played.
pub fn accuracy(state: &GameState) -> u32 {
    if state.rounds_played == 0 {
        return 0;
    }
    percent_rounded(state.correct, state.rounds_played)
}

/// Points awarded per correct round: `round(100 / total_rounds)`, so a
/// full-correct run caps near 100.
pub fn points_per_round(total_rounds: u32) -> u32 {
    if total_rounds == 0 {
        return 0;
    }
    (100 + total_rounds / 2) / total_rounds
}

/// Integer `round(numerator / denominator * 100)`.
fn percent_rounded(numerator: u32, denominator: u32) -> u32 {
    (numerator * 100 + denominator / 2) / denominator
}

/// The session's scoreboard, serialized for a separate leaderboard view.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaderboardSnapshot {
    /// Experience points earned this session.
    pub xp: u32,
    /// Session score (same basis as xp).
    pub score: u32,
    /// Accuracy percentage in `[0, 100]`.
    pub accuracy: u32,
    /// Correct rounds voted trust.
    pub correct_trusts: u32,
    /// Correct rounds voted doubt.
    pub correct_doubts: u32,
    /// Appeals won.
    pub appeals_won: u32,
    /// Rounds finalized.
    pub rounds_played: u32,
}

/// Snapshot the scoreboard for display or persistence.
pub fn leaderboard_snapshot(state: &GameState) -> LeaderboardSnapshot {
    let score = state.correct * points_per_round(state.total_rounds);
    LeaderboardSnapshot {
        xp: score,
        score,
        accuracy: accuracy(state),
        correct_trusts: state.correct_trusts,
        correct_doubts: state.correct_doubts,
        appeals_won: state.appeals_won,
        rounds_played: state.rounds_played,
    }
}

// =============================================================================
// TESTS
// =============================================================================
