//! Consensus Resolver Boundary
//!
//! The engine treats verdict resolution as an opaque async service: submit a
//! claim, eventually get a [`ConsensusResult`] back (or an error the caller
//! recovers from with a fallback result). Real deployments back this with an
//! on-chain validator contract; the crate ships a deterministic mock.

use futures_util::future::BoxFuture;
use thiserror::Error;

use crate::core::rng::{derive_claim_seed, DeterministicRng};
use crate::game::round::{AppealOutcome, ConsensusResult, ScenarioClaim, Verdict};

/// Errors surfaced by a resolver backend.
#[derive(Debug, Clone, Error)]
pub enum ResolverError {
    /// The backend could not be reached.
    #[error("resolver unavailable: {0}")]
    Unavailable(String),

    /// The backend did not answer in time.
    #[error("resolver timed out")]
    Timeout,

    /// The backend rejected the request.
    #[error("resolver rejected the request: {0}")]
    Rejected(String),
}

/// Asynchronous verdict resolution for one claim, plus appeal
/// re-adjudication.
///
/// Implementations must eventually resolve or error; there is no
/// engine-enforced timeout. On error the caller substitutes a fallback
/// result so the round can still finalize.
pub trait ConsensusResolver: Send + Sync {
    /// Resolve the consensus verdict for a claim.
    fn resolve_consensus<'a>(
        &'a self,
        claim: &'a ScenarioClaim,
    ) -> BoxFuture<'a, Result<ConsensusResult, ResolverError>>;

    /// Re-adjudicate a round with a larger validator set.
    fn resolve_appeal<'a>(
        &'a self,
        previous: &'a ConsensusResult,
    ) -> BoxFuture<'a, Result<AppealOutcome, ResolverError>>;
}

/// Base confidence when the consensus echoes a trust ground truth.
const TRUST_BASE_CONFIDENCE: f64 = 0.70;
/// Base confidence when the consensus echoes a doubt ground truth.
const DOUBT_BASE_CONFIDENCE: f64 = 0.65;
/// Maximum reported confidence.
const CONFIDENCE_CAP: f64 = 0.95;
/// Appeal success probability when the original confidence was shaky.
const APPEAL_CHANCE_LOW_CONFIDENCE: f64 = 0.45;
/// Appeal success probability against a confident verdict.
const APPEAL_CHANCE_HIGH_CONFIDENCE: f64 = 0.25;

/// Deterministic simulated consensus.
///
/// Echoes each claim's ground-truth verdict with seeded confidence jitter,
/// so a given `(claim, salt)` pair always resolves identically. The `flaky`
/// knob makes every call fail, for exercising the caller's fallback path.
pub struct MockResolver {
    salt: u64,
    flaky: bool,
}

impl MockResolver {
    /// Resolver with the given jitter salt.
    pub fn new(salt: u64) -> Self {
        Self { salt, flaky: false }
    }

    /// Resolver whose every call returns `Unavailable`.
    pub fn flaky(salt: u64) -> Self {
        Self { salt, flaky: true }
    }
}

impl ConsensusResolver for MockResolver {
    fn resolve_consensus<'a>(
        &'a self,
        claim: &'a ScenarioClaim,
    ) -> BoxFuture<'a, Result<ConsensusResult, ResolverError>> {
        Box::pin(async move {
            if self.flaky {
                return Err(ResolverError::Unavailable("mock resolver offline".into()));
            }

            let mut rng = DeterministicRng::new(derive_claim_seed(&claim.id, self.salt));
            let base = match claim.verdict {
                Verdict::Trust => TRUST_BASE_CONFIDENCE,
                Verdict::Doubt => DOUBT_BASE_CONFIDENCE,
            };
            let confidence = (base + rng.next_f64() * 0.15).min(CONFIDENCE_CAP);

            Ok(ConsensusResult {
                consensus: claim.verdict,
                confidence,
                explanation: Some(claim.detail.clone()),
            })
        })
    }

    fn resolve_appeal<'a>(
        &'a self,
        previous: &'a ConsensusResult,
    ) -> BoxFuture<'a, Result<AppealOutcome, ResolverError>> {
        Box::pin(async move {
            if self.flaky {
                return Err(ResolverError::Unavailable("mock resolver offline".into()));
            }

            // Seed from the prior confidence so re-running an appeal is
            // reproducible.
            let seed = derive_claim_seed(&format!("appeal-{:.4}", previous.confidence), self.salt);
            let mut rng = DeterministicRng::new(seed);
            let chance = if previous.confidence < 0.85 {
                APPEAL_CHANCE_LOW_CONFIDENCE
            } else {
                APPEAL_CHANCE_HIGH_CONFIDENCE
            };
            let success = rng.chance(chance);

            Ok(AppealOutcome {
                success,
                detail: if success {
                    "Additional validators sided with your reading and flipped the verdict."
                        .to_string()
                } else {
                    "The expanded validator set confirmed the earlier verdict.".to_string()
                },
            })
        })
    }
}

// =============================================================================
// TESTS
// =============================================================================
