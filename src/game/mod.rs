//! Game Logic Module
//!
//! The round-scoring engine and its data model.
//!
//! ## Module Structure
//!
//! - `round`: plain round data (claims, verdicts, consensus, history entries)
//! - `state`: the scoring ledger and its pure state transitions
//! - `score`: derived aggregates (accuracy, points, snapshot)
//! - `session`: epoch-guarded async finalization driver

pub mod round;
pub mod score;
pub mod session;
pub mod state;

// Re-export key types
pub use round::{AppealOutcome, AppealRecord, ConsensusResult, RoundRecord, ScenarioClaim, Verdict};
pub use score::{accuracy, leaderboard_snapshot, points_per_round, LeaderboardSnapshot};
pub use session::{Epoch, GameSession};
pub use state::{FallbackVote, GameState};
