//! Session Driver
//!
//! Bridges the synchronous scoring engine and the asynchronous consensus
//! boundary. Each mutating step reads the current state under a write lock,
//! computes the next state as a pure function, and replaces it atomically —
//! so interleaved finalizations never lose updates.
//!
//! Restart protection uses a generation counter: restarting bumps the epoch
//! and installs a fresh [`GameState`], and any in-flight resolution that
//! captured the old epoch is dropped when it lands.

use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::consensus::ConsensusResolver;
use crate::game::round::{AppealOutcome, ConsensusResult, ScenarioClaim, Verdict};
use crate::game::score::{leaderboard_snapshot, LeaderboardSnapshot};
use crate::game::state::{FallbackVote, GameState};

/// Session generation counter. Advances on restart.
pub type Epoch = u64;

/// Confidence reported when a failed resolution is replaced by the fallback.
const FALLBACK_CONFIDENCE: f64 = 0.5;

struct Shared {
    epoch: Epoch,
    state: GameState,
}

/// One player's live session: the current [`GameState`] behind an atomic
/// replace, plus the resolver used to finalize rounds.
///
/// Cloning shares the session; it is owned by a single logical caller and
/// not designed for concurrent writers from multiple sessions.
#[derive(Clone)]
pub struct GameSession {
    shared: Arc<RwLock<Shared>>,
    resolver: Arc<dyn ConsensusResolver>,
}

impl GameSession {
    /// Create a session with fresh state.
    pub fn new(total_rounds: u32, resolver: Arc<dyn ConsensusResolver>) -> Self {
        Self {
            shared: Arc::new(RwLock::new(Shared {
                epoch: 0,
                state: GameState::new(total_rounds),
            })),
            resolver,
        }
    }

    /// Current session epoch.
    pub async fn epoch(&self) -> Epoch {
        self.shared.read().await.epoch
    }

    /// Snapshot of the current game state.
    pub async fn state(&self) -> GameState {
        self.shared.read().await.state.clone()
    }

    /// Scoreboard snapshot for display or persistence.
    pub async fn snapshot(&self) -> LeaderboardSnapshot {
        leaderboard_snapshot(&self.shared.read().await.state)
    }

    /// Start over: bump the epoch and install a fresh state.
    ///
    /// In-flight resolutions from the previous run become no-ops when they
    /// land — the old state is never reset in place.
    pub async fn restart(&self, total_rounds: u32) -> Epoch {
        let mut shared = self.shared.write().await;
        shared.epoch += 1;
        shared.state = GameState::new(total_rounds);
        info!(epoch = shared.epoch, total_rounds, "session restarted");
        shared.epoch
    }

    /// Record a provisional vote. Returns the epoch the vote was cast
    /// under; pass it back to [`GameSession::finalize`].
    pub async fn cast_vote(&self, scenario: &ScenarioClaim, choice: Verdict) -> Epoch {
        let mut shared = self.shared.write().await;
        shared.state = shared.state.add_provisional_round(scenario, choice);
        shared.epoch
    }

    /// Resolve consensus for a voted round and merge the result.
    ///
    /// A rejected resolution is replaced by the fallback result
    /// `{consensus: choice, confidence: 0.5}` so the round always
    /// finalizes. If the session restarted while the resolution was in
    /// flight, the result is dropped. Returns the consensus that was
    /// applied (or would have been, for a stale epoch).
    pub async fn finalize(
        &self,
        scenario: &ScenarioClaim,
        choice: Verdict,
        epoch: Epoch,
    ) -> ConsensusResult {
        let consensus = self.resolve_or_fallback(scenario, choice).await;

        let mut shared = self.shared.write().await;
        if shared.epoch != epoch {
            debug!(
                scenario = %scenario.id,
                stale = epoch,
                current = shared.epoch,
                "dropping finalization from a previous session"
            );
            return consensus;
        }

        shared.state = shared.state.finalize_round(
            &scenario.id,
            &consensus,
            None,
            Some(FallbackVote {
                scenario,
                choice: Some(choice),
            }),
        );
        consensus
    }

    /// Vote and finalize in one step — the last-round path, where a visible
    /// provisional state is undesirable.
    pub async fn record_direct(
        &self,
        scenario: &ScenarioClaim,
        choice: Verdict,
    ) -> ConsensusResult {
        let epoch = self.epoch().await;
        let consensus = self.resolve_or_fallback(scenario, choice).await;

        let mut shared = self.shared.write().await;
        if shared.epoch != epoch {
            debug!(scenario = %scenario.id, "dropping direct record from a previous session");
            return consensus;
        }

        shared.state = shared.state.record_round(scenario, choice, &consensus, None);
        consensus
    }

    /// Appeal an already-finalized round with a larger validator set.
    ///
    /// A rejected appeal resolution degrades to an unsuccessful outcome.
    pub async fn appeal(
        &self,
        scenario_id: &str,
        previous: &ConsensusResult,
        epoch: Epoch,
    ) -> AppealOutcome {
        let outcome = match self.resolver.resolve_appeal(previous).await {
            Ok(outcome) => outcome,
            Err(err) => {
                warn!(scenario = scenario_id, error = %err, "appeal resolution failed");
                AppealOutcome {
                    success: false,
                    detail: "Appeal could not be adjudicated; the verdict stands.".to_string(),
                }
            }
        };

        let mut shared = self.shared.write().await;
        if shared.epoch != epoch {
            debug!(scenario = scenario_id, "dropping appeal from a previous session");
            return outcome;
        }

        shared.state = shared.state.record_appeal(scenario_id, &outcome);
        outcome
    }

    async fn resolve_or_fallback(
        &self,
        scenario: &ScenarioClaim,
        choice: Verdict,
    ) -> ConsensusResult {
        match self.resolver.resolve_consensus(scenario).await {
            Ok(result) => result,
            Err(err) => {
                warn!(
                    scenario = %scenario.id,
                    error = %err,
                    "consensus resolution failed, substituting fallback"
                );
                ConsensusResult {
                    consensus: choice,
                    confidence: FALLBACK_CONFIDENCE,
                    explanation: None,
                }
            }
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::build_scenario_queue;
    use crate::consensus::MockResolver;

    fn session(total_rounds: u32) -> GameSession {
        GameSession::new(total_rounds, Arc::new(MockResolver::new(7)))
    }

    #[tokio::test]
    async fn test_vote_then_finalize() {
        let session = session(5);
        let queue = build_scenario_queue(5, "session-test");
        let claim = queue[0];

        let epoch = session.cast_vote(claim, claim.verdict).await;
        let consensus = session.finalize(claim, claim.verdict, epoch).await;

        assert_eq!(consensus.consensus, claim.verdict);
        let state = session.state().await;
        assert_eq!(state.rounds_played, 1);
        assert_eq!(state.correct, 1);
    }

    #[tokio::test]
    async fn test_stale_epoch_dropped_after_restart() {
        let session = session(5);
        let queue = build_scenario_queue(5, "session-test");
        let claim = queue[0];

        let epoch = session.cast_vote(claim, claim.verdict).await;
        session.restart(5).await;
        session.finalize(claim, claim.verdict, epoch).await;

        let state = session.state().await;
        assert_eq!(state.rounds_played, 0, "stale finalize must not touch the new session");
        assert!(state.history.is_empty());
    }

    #[tokio::test]
    async fn test_flaky_resolver_falls_back() {
        let session = GameSession::new(5, Arc::new(MockResolver::flaky(7)));
        let queue = build_scenario_queue(5, "session-test");
        let claim = queue[0];

        let epoch = session.cast_vote(claim, Verdict::Doubt).await;
        let consensus = session.finalize(claim, Verdict::Doubt, epoch).await;

        // Fallback echoes the player's choice at half confidence.
        assert_eq!(consensus.consensus, Verdict::Doubt);
        assert_eq!(consensus.confidence, 0.5);

        let state = session.state().await;
        assert_eq!(state.rounds_played, 1);
        assert_eq!(state.correct, 1);
    }

    #[tokio::test]
    async fn test_out_of_order_concurrent_finalizations() {
        let session = session(5);
        let queue = build_scenario_queue(5, "session-test");

        let e0 = session.cast_vote(queue[0], queue[0].verdict).await;
        let e1 = session.cast_vote(queue[1], queue[1].verdict.flipped()).await;
        let e2 = session.cast_vote(queue[2], queue[2].verdict).await;

        // Resolutions land in reverse order, concurrently.
        let tasks = [
            tokio::spawn({
                let s = session.clone();
                let c = queue[2];
                async move { s.finalize(c, c.verdict, e2).await }
            }),
            tokio::spawn({
                let s = session.clone();
                let c = queue[1];
                async move { s.finalize(c, c.verdict.flipped(), e1).await }
            }),
            tokio::spawn({
                let s = session.clone();
                let c = queue[0];
                async move { s.finalize(c, c.verdict, e0).await }
            }),
        ];
        for task in tasks {
            task.await.unwrap();
        }

        let state = session.state().await;
        assert_eq!(state.rounds_played, 3, "no finalization may be lost");
        assert_eq!(state.correct, 2);
        assert_eq!(state.history.len(), 3);
        assert!(state.history.iter().all(|r| r.is_finalized()));
    }

    #[tokio::test]
    async fn test_record_direct_last_round() {
        let session = session(1);
        let queue = build_scenario_queue(1, "session-test");
        let claim = queue[0];

        session.record_direct(claim, claim.verdict).await;

        let state = session.state().await;
        assert_eq!(state.rounds_played, 1);
        assert_eq!(state.history.len(), 1);
        assert!(state.history[0].is_finalized());
    }

    #[tokio::test]
    async fn test_appeal_through_session() {
        let session = session(5);
        let queue = build_scenario_queue(5, "session-test");
        let claim = queue[0];

        // Vote against the ground truth so the round finalizes incorrect.
        let epoch = session.cast_vote(claim, claim.verdict.flipped()).await;
        let consensus = session.finalize(claim, claim.verdict.flipped(), epoch).await;

        let before = session.state().await;
        assert_eq!(before.correct, 0);

        let outcome = session.appeal(&claim.id, &consensus, epoch).await;
        let after = session.state().await;

        assert_eq!(after.rounds_played, 1, "appeal must not re-count the round");
        assert_eq!(after.history.len(), 1);
        if outcome.success {
            assert_eq!(after.correct, 1);
            assert_eq!(after.appeals_won, 1);
        } else {
            assert_eq!(after.correct, 0);
            assert_eq!(after.appeals_won, 0);
        }
    }

    #[tokio::test]
    async fn test_flaky_appeal_degrades_to_failure() {
        let session = GameSession::new(5, Arc::new(MockResolver::flaky(7)));
        let prev = ConsensusResult {
            consensus: Verdict::Trust,
            confidence: 0.8,
            explanation: None,
        };
        let outcome = session.appeal("claim-1", &prev, session.epoch().await).await;
        assert!(!outcome.success);
    }

    #[tokio::test]
    async fn test_snapshot_reflects_state() {
        let session = session(5);
        let queue = build_scenario_queue(5, "session-test");
        let claim = queue[0];

        session.record_direct(claim, claim.verdict).await;
        let snap = session.snapshot().await;
        assert_eq!(snap.rounds_played, 1);
        assert_eq!(snap.score, 20);
        assert_eq!(snap.accuracy, 100);
    }
}
