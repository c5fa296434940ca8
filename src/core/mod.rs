//! Deterministic Primitives
//!
//! - `seed`: seed-string hashing and the full-cycle index walk
//! - `rng`: Xorshift128+ PRNG and resolver seed derivation
//! - `storage`: injected key/value persistence

pub mod rng;
pub mod seed;
pub mod storage;

pub use rng::DeterministicRng;
pub use seed::{hash_seed, FullCycleWalk};
pub use storage::{KvStore, MemoryStore, StorageError};
