//! Verdict Arena Game Server
//!
//! Demo driver: deals a seeded scenario queue, plays a solo session against
//! the mock consensus oracle, and records the result on a leaderboard.

use std::sync::Arc;

use anyhow::Result;
use chrono::Utc;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use verdict_arena::{
    catalog::{build_scenario_queue, session_seed},
    consensus::MockResolver,
    core::seed::hash_seed,
    core::storage::MemoryStore,
    game::round::Verdict,
    game::session::GameSession,
    leaderboard::weekly::{level_for, XpLedger},
    leaderboard::GlobalLeaderboard,
    DEFAULT_TOTAL_ROUNDS, VERSION,
};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    info!("Verdict Arena Server v{}", VERSION);
    info!("Rounds per game: {}", DEFAULT_TOTAL_ROUNDS);

    demo_game().await;
    Ok(())
}

/// Demo function to play a full solo session.
async fn demo_game() {
    info!("=== Starting Demo Session ===");

    let seed = session_seed("demo", "solo", 42);
    info!("Session Seed: {}", seed);
    info!("Seed Hash: {}", hex::encode(hash_seed(&seed).to_be_bytes()));

    let queue = build_scenario_queue(DEFAULT_TOTAL_ROUNDS as usize, &seed);
    for (i, scenario) in queue.iter().enumerate() {
        info!("Round {}: [{}] {}", i + 1, scenario.category, scenario.text);
    }

    let resolver = Arc::new(MockResolver::new(7));
    let session = GameSession::new(DEFAULT_TOTAL_ROUNDS, resolver);

    // Play each round: vote, then resolve consensus and finalize.
    for (i, scenario) in queue.iter().enumerate() {
        let choice = Verdict::for_index(i);
        let epoch = session.cast_vote(scenario, choice).await;
        let consensus = session.finalize(scenario, choice, epoch).await;
        info!(
            "Round {}: voted {:?}, consensus {:?} ({:.0}% confidence)",
            i + 1,
            choice,
            consensus.consensus,
            consensus.confidence * 100.0
        );

        // Appeal the first round that went against us.
        if consensus.consensus != choice {
            let outcome = session.appeal(&scenario.id, &consensus, epoch).await;
            info!(
                "Appealed round {}: {}",
                i + 1,
                if outcome.success { "overturned" } else { "upheld" }
            );
        }
    }

    let snapshot = session.snapshot().await;
    info!("=== Session Results ===");
    info!(
        "Score: {} | Accuracy: {}% | Appeals won: {} | Rounds: {}",
        snapshot.score, snapshot.accuracy, snapshot.appeals_won, snapshot.rounds_played
    );

    // Record on the leaderboard and XP ladder.
    let store = Arc::new(MemoryStore::new());
    let leaderboard = GlobalLeaderboard::new(store.clone());
    let state = session.state().await;
    let entry = leaderboard.add(
        "demo",
        snapshot.score,
        state.correct,
        state.total_rounds,
        Utc::now(),
    );
    info!(
        "Leaderboard rank: #{}",
        leaderboard.player_rank(&entry.username).unwrap_or(0)
    );

    let ledger = XpLedger::new(store);
    let total_xp = ledger.add_xp(snapshot.xp);
    let level = level_for(total_xp);
    info!("Total XP: {} ({})", total_xp, level.title);

    // Restart and show that in-flight results from the old session are dropped.
    info!("=== Restart Guard ===");
    let scenario = queue[0];
    let stale_epoch = session.cast_vote(scenario, Verdict::Trust).await;
    let new_epoch = session.restart(DEFAULT_TOTAL_ROUNDS).await;
    session.finalize(scenario, Verdict::Trust, stale_epoch).await;
    let fresh = session.state().await;
    info!(
        "Epoch {} -> {}: stale finalization dropped, {} rounds in new session",
        stale_epoch, new_epoch, fresh.rounds_played
    );
}
