//! Round Data Model
//!
//! Plain data shared between the catalog, the consensus boundary, and the
//! scoring engine. A round's lifecycle is explicit in the type: a
//! [`RoundRecord`] is either `Provisional` (vote cast, resolution pending)
//! or `Finalized` (consensus merged, counters settled).

use serde::{Deserialize, Serialize};

/// A trust-or-doubt verdict.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    /// The claim is held to be true.
    Trust,
    /// The claim is held to be false.
    Doubt,
}

impl Verdict {
    /// Ground-truth verdict for a catalog index: alternates by parity so the
    /// catalog splits roughly 50/50.
    pub fn for_index(idx: usize) -> Self {
        if idx % 2 == 0 {
            Verdict::Trust
        } else {
            Verdict::Doubt
        }
    }

    /// The opposite verdict.
    pub fn flipped(self) -> Self {
        match self {
            Verdict::Trust => Verdict::Doubt,
            Verdict::Doubt => Verdict::Trust,
        }
    }
}

/// A single trivia claim drawn from the static catalog.
///
/// Created once at catalog construction and never mutated; the queue hands
/// out references and the history stores clones.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScenarioClaim {
    /// Stable unique identifier (`claim-1` .. `claim-1000`).
    pub id: String,
    /// The claim statement shown to the player.
    pub text: String,
    /// Classification label.
    pub category: String,
    /// Ground-truth verdict the consensus is expected to echo.
    pub verdict: Verdict,
    /// Supporting explanation text.
    pub detail: String,
}

/// Resolved verdict for one round, produced by the consensus boundary.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ConsensusResult {
    /// The resolved verdict.
    pub consensus: Verdict,
    /// Validator confidence in `[0, 1]`.
    pub confidence: f64,
    /// Advisory explanation text.
    pub explanation: Option<String>,
}

/// Result of an appeal re-adjudication.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppealOutcome {
    /// Whether the appeal flipped the round in the player's favor.
    pub success: bool,
    /// Explanatory text.
    pub detail: String,
}

/// Appeal bookkeeping attached to a finalized round.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppealRecord {
    /// An appeal was requested for this round.
    pub attempted: bool,
    /// The appeal succeeded.
    pub success: bool,
    /// Explanatory text.
    pub detail: String,
}

impl AppealRecord {
    /// Build the history record for an appeal outcome.
    pub fn from_outcome(outcome: &AppealOutcome) -> Self {
        Self {
            attempted: true,
            success: outcome.success,
            detail: outcome.detail.clone(),
        }
    }
}

/// One entry per round played; the engine's history is append-only apart
/// from the provisional-to-finalized conversion.
///
/// Rounds are matched by scenario **id**: claim text is display data, ids
/// are the key.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RoundRecord {
    /// Vote cast, consensus resolution still in flight. Counters untouched.
    Provisional {
        /// The claim played.
        scenario: ScenarioClaim,
        /// The player's vote.
        choice: Verdict,
    },
    /// Consensus merged and counters settled.
    Finalized {
        /// The claim played.
        scenario: ScenarioClaim,
        /// The player's vote.
        choice: Verdict,
        /// The resolved verdict.
        consensus: Verdict,
        /// Validator confidence in `[0, 1]`.
        confidence: f64,
        /// `choice == consensus`, or the appeal succeeded.
        correct: bool,
        /// Appeal bookkeeping, if one was adjudicated.
        appeal: Option<AppealRecord>,
    },
}

impl RoundRecord {
    /// The claim this round was played against.
    pub fn scenario(&self) -> &ScenarioClaim {
        match self {
            RoundRecord::Provisional { scenario, .. } => scenario,
            RoundRecord::Finalized { scenario, .. } => scenario,
        }
    }

    /// The player's vote.
    pub fn choice(&self) -> Verdict {
        match self {
            RoundRecord::Provisional { choice, .. } => *choice,
            RoundRecord::Finalized { choice, .. } => *choice,
        }
    }

    /// Has the async consensus result been merged in?
    pub fn is_finalized(&self) -> bool {
        matches!(self, RoundRecord::Finalized { .. })
    }

    /// Whether the round counted as correct (`false` while provisional).
    pub fn is_correct(&self) -> bool {
        matches!(self, RoundRecord::Finalized { correct: true, .. })
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verdict_parity() {
        assert_eq!(Verdict::for_index(0), Verdict::Trust);
        assert_eq!(Verdict::for_index(1), Verdict::Doubt);
        assert_eq!(Verdict::for_index(998), Verdict::Trust);
    }

    #[test]
    fn test_verdict_flipped() {
        assert_eq!(Verdict::Trust.flipped(), Verdict::Doubt);
        assert_eq!(Verdict::Doubt.flipped(), Verdict::Trust);
    }

    #[test]
    fn test_verdict_serde_snake_case() {
        assert_eq!(serde_json::to_string(&Verdict::Trust).unwrap(), "\"trust\"");
        assert_eq!(
            serde_json::from_str::<Verdict>("\"doubt\"").unwrap(),
            Verdict::Doubt
        );
    }

    #[test]
    fn test_round_record_tagging() {
        let claim = ScenarioClaim {
            id: "claim-1".into(),
            text: "t".into(),
            category: "c".into(),
            verdict: Verdict::Trust,
            detail: "d".into(),
        };
        let record = RoundRecord::Provisional {
            scenario: claim,
            choice: Verdict::Doubt,
        };

        assert!(!record.is_finalized());
        assert!(!record.is_correct());
        assert_eq!(record.choice(), Verdict::Doubt);

        let json = serde_json::to_string(&record).unwrap();
        assert!(json.contains("\"status\":\"provisional\""));
    }
}
