//! Game State Engine
//!
//! The authoritative scoring ledger for one play session. Vote-casting is
//! synchronous but consensus resolution is asynchronous and may complete out
//! of round order, so every mutating operation is a pure
//! `&self -> GameState` transition the caller applies as a single atomic
//! replace — never an in-place read-then-write split across an await.
//!
//! The engine never errors: duplicate finalizations are ignored, missing
//! provisional entries degrade to direct recording. The scoreboard must
//! always render something.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::game::round::{
    AppealOutcome, AppealRecord, ConsensusResult, RoundRecord, ScenarioClaim, Verdict,
};

/// Caller-supplied context for a finalize that arrives without a matching
/// provisional vote (resolution outran the vote, or the caller skipped the
/// provisional step).
#[derive(Clone, Copy, Debug)]
pub struct FallbackVote<'a> {
    /// The claim being finalized.
    pub scenario: &'a ScenarioClaim,
    /// The player's vote, if the caller still knows it. When absent the
    /// engine adopts the resolved consensus as the choice — an
    /// availability-first default that marks the round correct.
    pub choice: Option<Verdict>,
}

/// The session's running tally. Counters cover finalized rounds only.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GameState {
    /// Rounds answered correctly.
    pub correct: u32,
    /// Correct rounds where the player voted trust.
    pub correct_trusts: u32,
    /// Correct rounds where the player voted doubt.
    pub correct_doubts: u32,
    /// Appeals that flipped or confirmed in the player's favor.
    pub appeals_won: u32,
    /// Rounds finalized so far. Never double-counted for one scenario.
    pub rounds_played: u32,
    /// Fixed target for the session.
    pub total_rounds: u32,
    /// One entry per round played, keyed by scenario id.
    pub history: Vec<RoundRecord>,
}

impl GameState {
    /// Fresh state: all counters zero, empty history.
    pub fn new(total_rounds: u32) -> Self {
        Self {
            correct: 0,
            correct_trusts: 0,
            correct_doubts: 0,
            appeals_won: 0,
            rounds_played: 0,
            total_rounds,
            history: Vec::new(),
        }
    }

    /// Record a vote whose consensus result is already known.
    ///
    /// The `NONE -> FINALIZED` path: used for the session's last round (no
    /// visible provisional flash) or when the caller skipped the provisional
    /// step. The caller must know no provisional entry exists for this
    /// scenario.
    pub fn record_round(
        &self,
        scenario: &ScenarioClaim,
        choice: Verdict,
        consensus: &ConsensusResult,
        appeal: Option<&AppealOutcome>,
    ) -> GameState {
        let record = finalized_record(scenario.clone(), choice, consensus, appeal);
        self.settle(record, None)
    }

    /// Record a vote whose consensus result is still in flight.
    ///
    /// Appends a provisional history entry; aggregate counters and
    /// `rounds_played` are untouched until [`GameState::finalize_round`].
    /// A second vote for a scenario that already has an entry is ignored.
    pub fn add_provisional_round(&self, scenario: &ScenarioClaim, choice: Verdict) -> GameState {
        if self.position_of(&scenario.id).is_some() {
            warn!(scenario = %scenario.id, "duplicate vote for scenario ignored");
            return self.clone();
        }

        let mut next = self.clone();
        next.history.push(RoundRecord::Provisional {
            scenario: scenario.clone(),
            choice,
        });
        next
    }

    /// Merge an asynchronous consensus result into the matching provisional
    /// round.
    ///
    /// - Already finalized for `scenario_id`: returns the state unchanged
    ///   (benign race, e.g. a retried resolution).
    /// - Matching provisional entry: converts it in place, computing
    ///   `correct = choice == consensus || appeal succeeded`, and settles
    ///   the counters exactly once.
    /// - No matching entry: degrades to direct recording using `fallback`,
    ///   or a synthesized stub when no fallback was supplied. A signal of
    ///   caller misuse, logged but never fatal.
    pub fn finalize_round(
        &self,
        scenario_id: &str,
        consensus: &ConsensusResult,
        appeal: Option<&AppealOutcome>,
        fallback: Option<FallbackVote<'_>>,
    ) -> GameState {
        if self.is_finalized(scenario_id) {
            debug!(scenario = scenario_id, "round already finalized, ignoring");
            return self.clone();
        }

        let Some(idx) = self.position_of(scenario_id) else {
            warn!(
                scenario = scenario_id,
                "finalize arrived without a provisional vote, recording directly"
            );
            return self.finalize_without_provisional(scenario_id, consensus, appeal, fallback);
        };

        let (scenario, choice) = {
            let existing = &self.history[idx];
            (existing.scenario().clone(), existing.choice())
        };
        let record = finalized_record(scenario, choice, consensus, appeal);
        self.settle(record, Some(idx))
    }

    /// Re-adjudicate an already-finalized round after an appeal.
    ///
    /// Mutates the existing finalized entry in place — never appends a
    /// duplicate. `appeals_won` moves on success; the correctness counters
    /// gain exactly one if the verdict flips from wrong to right;
    /// `rounds_played` never moves.
    pub fn record_appeal(&self, scenario_id: &str, outcome: &AppealOutcome) -> GameState {
        let Some(idx) = self
            .history
            .iter()
            .position(|r| r.scenario().id == scenario_id && r.is_finalized())
        else {
            warn!(scenario = scenario_id, "appeal against unknown round ignored");
            return self.clone();
        };

        let RoundRecord::Finalized {
            scenario,
            choice,
            consensus,
            confidence,
            correct: was_correct,
            ..
        } = self.history[idx].clone()
        else {
            unreachable!("position_of filtered on is_finalized");
        };

        let now_correct = was_correct || outcome.success;
        let newly_correct = now_correct && !was_correct;

        let mut next = self.clone();
        next.history[idx] = RoundRecord::Finalized {
            scenario,
            choice,
            consensus,
            confidence,
            correct: now_correct,
            appeal: Some(AppealRecord::from_outcome(outcome)),
        };

        if newly_correct {
            next.correct += 1;
            match choice {
                Verdict::Trust => next.correct_trusts += 1,
                Verdict::Doubt => next.correct_doubts += 1,
            }
        }
        if outcome.success {
            next.appeals_won += 1;
        }
        next
    }

    /// Does a finalized entry exist for this scenario id?
    pub fn is_finalized(&self, scenario_id: &str) -> bool {
        self.history
            .iter()
            .any(|r| r.scenario().id == scenario_id && r.is_finalized())
    }

    /// Index of the provisional entry for this scenario id, if any.
    fn position_of(&self, scenario_id: &str) -> Option<usize> {
        self.history
            .iter()
            .position(|r| r.scenario().id == scenario_id && !r.is_finalized())
    }

    fn finalize_without_provisional(
        &self,
        scenario_id: &str,
        consensus: &ConsensusResult,
        appeal: Option<&AppealOutcome>,
        fallback: Option<FallbackVote<'_>>,
    ) -> GameState {
        match fallback {
            Some(fb) => {
                let choice = fb.choice.unwrap_or_else(|| {
                    warn!(
                        scenario = scenario_id,
                        "no player choice supplied, adopting resolved consensus"
                    );
                    consensus.consensus
                });
                self.record_round(fb.scenario, choice, consensus, appeal)
            }
            None => {
                // Keep the real id so a retried finalize still hits the
                // idempotency guard.
                let stub = ScenarioClaim {
                    id: scenario_id.to_string(),
                    text: String::new(),
                    category: String::new(),
                    verdict: consensus.consensus,
                    detail: consensus.explanation.clone().unwrap_or_default(),
                };
                self.record_round(&stub, consensus.consensus, consensus, appeal)
            }
        }
    }

    /// Apply a finalized record: replace the provisional entry at
    /// `replace_at` (or append), and settle counters exactly once.
    fn settle(&self, record: RoundRecord, replace_at: Option<usize>) -> GameState {
        let RoundRecord::Finalized {
            choice,
            correct,
            ref appeal,
            ..
        } = record
        else {
            unreachable!("settle is only called with finalized records");
        };

        let mut next = self.clone();
        next.rounds_played += 1;
        if correct {
            next.correct += 1;
            match choice {
                Verdict::Trust => next.correct_trusts += 1,
                Verdict::Doubt => next.correct_doubts += 1,
            }
        }
        if appeal.as_ref().is_some_and(|a| a.success) {
            next.appeals_won += 1;
        }

        match replace_at {
            Some(idx) => next.history[idx] = record,
            None => next.history.push(record),
        }
        next
    }
}

fn finalized_record(
    scenario: ScenarioClaim,
    choice: Verdict,
    consensus: &ConsensusResult,
    appeal: Option<&AppealOutcome>,
) -> RoundRecord {
    let appeal_success = appeal.is_some_and(|a| a.success);
    RoundRecord::Finalized {
        scenario,
        choice,
        consensus: consensus.consensus,
        confidence: consensus.confidence,
        correct: choice == consensus.consensus || appeal_success,
        appeal: appeal.map(AppealRecord::from_outcome),
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn claim(id: &str, verdict: Verdict) -> ScenarioClaim {
        ScenarioClaim {
            id: id.to_string(),
            text: format!("{id} text"),
            category: "Testing".to_string(),
            verdict,
            detail: format!("{id} detail"),
        }
    }

    fn consensus(verdict: Verdict, confidence: f64) -> ConsensusResult {
        ConsensusResult {
            consensus: verdict,
            confidence,
            explanation: None,
        }
    }

    #[test]
    fn test_record_round_correct_trust() {
        let state = GameState::new(5);
        let c = claim("claim-1", Verdict::Trust);

        let next = state.record_round(&c, Verdict::Trust, &consensus(Verdict::Trust, 0.8), None);

        assert_eq!(next.correct, 1);
        assert_eq!(next.correct_trusts, 1);
        assert_eq!(next.correct_doubts, 0);
        assert_eq!(next.rounds_played, 1);
        assert!(next.history[0].is_correct());
    }

    #[test]
    fn test_record_round_incorrect() {
        let state = GameState::new(5);
        let c = claim("claim-1", Verdict::Trust);

        let next = state.record_round(&c, Verdict::Doubt, &consensus(Verdict::Trust, 0.8), None);

        assert_eq!(next.correct, 0);
        assert_eq!(next.rounds_played, 1);
        assert!(!next.history[0].is_correct());
    }

    #[test]
    fn test_provisional_leaves_counters_untouched() {
        let state = GameState::new(5);
        let c = claim("claim-1", Verdict::Trust);

        let next = state.add_provisional_round(&c, Verdict::Trust);

        assert_eq!(next.rounds_played, 0);
        assert_eq!(next.correct, 0);
        assert_eq!(next.history.len(), 1);
        assert!(!next.history[0].is_finalized());
    }

    #[test]
    fn test_duplicate_vote_ignored() {
        let state = GameState::new(5);
        let c = claim("claim-1", Verdict::Trust);

        let next = state
            .add_provisional_round(&c, Verdict::Trust)
            .add_provisional_round(&c, Verdict::Doubt);

        assert_eq!(next.history.len(), 1);
        assert_eq!(next.history[0].choice(), Verdict::Trust);
    }

    #[test]
    fn test_provisional_then_finalize_equivalence() {
        let state = GameState::new(5);
        let c = claim("claim-1", Verdict::Trust);

        let voted = state.add_provisional_round(&c, Verdict::Trust);
        let done = voted.finalize_round(&c.id, &consensus(Verdict::Trust, 0.9), None, None);

        assert_eq!(done.rounds_played, state.rounds_played + 1);
        assert_eq!(done.correct, state.correct + 1);
        assert_eq!(done.history.len(), 1);
        assert!(done.history[0].is_finalized());
    }

    #[test]
    fn test_finalize_mismatch_is_incorrect() {
        let state = GameState::new(5);
        let c = claim("claim-1", Verdict::Trust);

        let done = state
            .add_provisional_round(&c, Verdict::Doubt)
            .finalize_round(&c.id, &consensus(Verdict::Trust, 0.9), None, None);

        assert_eq!(done.correct, 0);
        assert_eq!(done.rounds_played, 1);
    }

    #[test]
    fn test_finalize_is_idempotent() {
        let state = GameState::new(5);
        let c = claim("claim-1", Verdict::Trust);
        let result = consensus(Verdict::Trust, 0.9);

        let once = state
            .add_provisional_round(&c, Verdict::Trust)
            .finalize_round(&c.id, &result, None, None);
        let twice = once.finalize_round(&c.id, &result, None, None);

        assert_eq!(twice.rounds_played, once.rounds_played);
        assert_eq!(twice.correct, once.correct);
        assert_eq!(twice.history.len(), once.history.len());
    }

    #[test]
    fn test_appeal_success_overrides_mismatch() {
        // Provisional doubt, consensus trust, appeal won.
        let state = GameState::new(5);
        let c = claim("claim-x", Verdict::Trust);
        let appeal = AppealOutcome {
            success: true,
            detail: "overturned".to_string(),
        };

        let done = state
            .add_provisional_round(&c, Verdict::Doubt)
            .finalize_round(&c.id, &consensus(Verdict::Trust, 0.9), Some(&appeal), None);

        assert_eq!(done.correct, 1);
        assert_eq!(done.correct_doubts, 1);
        assert_eq!(done.appeals_won, 1);
        assert!(done.history[0].is_correct());
    }

    #[test]
    fn test_finalize_without_provisional_uses_fallback() {
        let state = GameState::new(5);
        let c = claim("claim-1", Verdict::Trust);

        let done = state.finalize_round(
            &c.id,
            &consensus(Verdict::Trust, 0.7),
            None,
            Some(FallbackVote {
                scenario: &c,
                choice: Some(Verdict::Doubt),
            }),
        );

        assert_eq!(done.rounds_played, 1);
        assert_eq!(done.correct, 0);
        assert_eq!(done.history[0].choice(), Verdict::Doubt);
    }

    #[test]
    fn test_finalize_without_provisional_or_fallback_synthesizes_stub() {
        let state = GameState::new(5);

        let done = state.finalize_round("claim-ghost", &consensus(Verdict::Doubt, 0.6), None, None);

        assert_eq!(done.rounds_played, 1);
        // Adopting the consensus as the choice marks the round correct.
        assert_eq!(done.correct, 1);
        assert_eq!(done.history[0].scenario().id, "claim-ghost");

        // The stub keeps the real id, so a retried finalize is still a no-op.
        let retried = done.finalize_round("claim-ghost", &consensus(Verdict::Doubt, 0.6), None, None);
        assert_eq!(retried.rounds_played, 1);
    }

    #[test]
    fn test_record_appeal_mutates_in_place() {
        let state = GameState::new(5);
        let c = claim("claim-1", Verdict::Trust);

        let done = state
            .add_provisional_round(&c, Verdict::Doubt)
            .finalize_round(&c.id, &consensus(Verdict::Trust, 0.9), None, None);
        assert_eq!(done.correct, 0);

        let appealed = done.record_appeal(
            &c.id,
            &AppealOutcome {
                success: true,
                detail: "expanded validator set sided with the player".to_string(),
            },
        );

        assert_eq!(appealed.history.len(), 1, "appeal must not append a duplicate");
        assert_eq!(appealed.rounds_played, 1, "appeal must not re-count the round");
        assert_eq!(appealed.correct, 1);
        assert_eq!(appealed.correct_doubts, 1);
        assert_eq!(appealed.appeals_won, 1);
        assert!(appealed.history[0].is_correct());
    }

    #[test]
    fn test_failed_appeal_keeps_counters() {
        let state = GameState::new(5);
        let c = claim("claim-1", Verdict::Trust);

        let done = state
            .add_provisional_round(&c, Verdict::Doubt)
            .finalize_round(&c.id, &consensus(Verdict::Trust, 0.9), None, None);

        let appealed = done.record_appeal(
            &c.id,
            &AppealOutcome {
                success: false,
                detail: "verdict confirmed".to_string(),
            },
        );

        assert_eq!(appealed.correct, 0);
        assert_eq!(appealed.appeals_won, 0);
        assert_eq!(appealed.rounds_played, 1);
    }

    #[test]
    fn test_appeal_against_unknown_round_is_noop() {
        let state = GameState::new(5);
        let appealed = state.record_appeal(
            "claim-missing",
            &AppealOutcome {
                success: true,
                detail: String::new(),
            },
        );
        assert_eq!(appealed.history.len(), 0);
        assert_eq!(appealed.appeals_won, 0);
    }

    #[test]
    fn test_out_of_order_finalization() {
        // Round 2's consensus arrives after round 3's vote was cast.
        let state = GameState::new(5);
        let c2 = claim("claim-2", Verdict::Trust);
        let c3 = claim("claim-3", Verdict::Doubt);

        let voted = state
            .add_provisional_round(&c2, Verdict::Trust)
            .add_provisional_round(&c3, Verdict::Doubt);

        let late = voted.finalize_round(&c2.id, &consensus(Verdict::Trust, 0.8), None, None);
        assert_eq!(late.rounds_played, 1);
        assert!(!late.is_finalized(&c3.id));

        let both = late.finalize_round(&c3.id, &consensus(Verdict::Doubt, 0.7), None, None);
        assert_eq!(both.rounds_played, 2);
        assert_eq!(both.correct, 2);
    }
}
