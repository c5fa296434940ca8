//! # Verdict Arena Game Server
//!
//! Deterministic scenario dealing and round scoring for Verdict Arena, a
//! trust/doubt judgement game resolved by a consensus oracle.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                   VERDICT ARENA SERVER                       │
//! ├─────────────────────────────────────────────────────────────┤
//! │  core/           - Deterministic primitives                  │
//! │  ├── seed.rs     - Seed hashing and full-cycle walks         │
//! │  ├── rng.rs      - Deterministic Xorshift128+ PRNG           │
//! │  └── storage.rs  - Key-value persistence boundary            │
//! │                                                              │
//! │  catalog/        - Scenario pool and queue building          │
//! │                                                              │
//! │  game/           - Game logic (deterministic)                │
//! │  ├── round.rs    - Claims, verdicts, round records           │
//! │  ├── state.rs    - Pure game-state transitions               │
//! │  ├── score.rs    - Accuracy and score derivation             │
//! │  └── session.rs  - Async session with epoch guard            │
//! │                                                              │
//! │  consensus/      - Oracle resolution (non-deterministic)     │
//! │                                                              │
//! │  leaderboard/    - Rankings, weekly plays, XP ladder         │
//! │                                                              │
//! │  room/           - Multiplayer room lifecycle                │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Determinism Guarantee
//!
//! The `core/`, `catalog/`, and `game/` (minus `session`) modules are
//! **100% deterministic**:
//! - No HashMap (uses BTreeMap for sorted iteration)
//! - No system time dependencies
//! - Scenario order from seeded full-cycle walks
//! - All randomness from seeded Xorshift128+
//!
//! Given the same seed string, queue building produces **identical
//! scenario order** on any platform; given the same vote sequence, the
//! game state transitions produce identical results. Only the consensus
//! resolver and wall-clock concerns (weekly resets, room timestamps)
//! live outside the deterministic core.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod catalog;
pub mod consensus;
pub mod core;
pub mod game;
pub mod leaderboard;
pub mod room;

// Re-export commonly used types
pub use catalog::{build_scenario_queue, catalog, session_seed, CATALOG_SIZE};
pub use consensus::{ConsensusResolver, MockResolver, ResolverError};
pub use self::core::rng::DeterministicRng;
pub use self::core::seed::{hash_seed, FullCycleWalk};
pub use self::core::storage::{KvStore, MemoryStore, StorageError};
pub use game::round::{ConsensusResult, RoundRecord, ScenarioClaim, Verdict};
pub use game::session::GameSession;
pub use game::state::GameState;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Rounds in a standard solo game
pub const DEFAULT_TOTAL_ROUNDS: u32 = 5;

/// Seconds allowed per round in solo games
pub const DEFAULT_ROUND_TIMER_SECS: u32 = 30;
