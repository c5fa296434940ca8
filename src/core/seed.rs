//! Seed Hashing and Full-Cycle Index Walks
//!
//! A scenario queue is derived entirely from a seed string. The seed is
//! reduced to an integer with a polynomial rolling hash, and a full-cycle
//! modular walk over the catalog deals non-repeating indices without
//! shuffling or copying the catalog.

/// Modulus for the rolling seed hash.
const SEED_HASH_PRIME: u64 = 1_000_000_007;

/// Seed substituted when the caller passes an empty string.
pub const DEFAULT_SEED: &str = "neutral";

/// Reduce an arbitrary seed string to a non-negative integer.
///
/// Polynomial rolling hash: `h = (h * 31 + byte) mod 1_000_000_007`.
/// Empty input falls back to [`DEFAULT_SEED`] so a queue can always be
/// built.
///
/// # Example
///
/// ```
/// use verdict_arena::core::seed::hash_seed;
///
/// assert_eq!(hash_seed("alice-single-1000"), hash_seed("alice-single-1000"));
/// assert_ne!(hash_seed("a"), hash_seed("b"));
/// ```
pub fn hash_seed(seed: &str) -> u64 {
    let sanitized = if seed.is_empty() { DEFAULT_SEED } else { seed };
    let mut hash: u64 = 0;
    for byte in sanitized.bytes() {
        hash = (hash.wrapping_mul(31).wrapping_add(byte as u64)) % SEED_HASH_PRIME;
    }
    hash
}

/// Greatest common divisor (Euclid).
pub fn gcd(mut a: u64, mut b: u64) -> u64 {
    while b != 0 {
        let t = b;
        b = a % b;
        a = t;
    }
    a
}

/// Iterator over catalog indices that visits every index exactly once
/// before repeating.
///
/// From a hash the walk picks `start = hash % len` and a step coprime to
/// `len`. Because `gcd(step, len) == 1`, the sequence
/// `start, start + step, start + 2*step, … (mod len)` is a permutation of
/// `[0, len)` — so taking the first `count` terms yields `count` distinct
/// indices in O(count), with no shuffle and no allocation.
#[derive(Clone, Debug)]
pub struct FullCycleWalk {
    len: u64,
    next: u64,
    step: u64,
    emitted: u64,
}

impl FullCycleWalk {
    /// Build a walk over `len` indices from a seed hash.
    ///
    /// A zero-length walk is empty; length 1 yields index 0 once.
    pub fn new(len: usize, hash: u64) -> Self {
        let len = len as u64;
        if len <= 1 {
            return Self { len, next: 0, step: 1, emitted: 0 };
        }

        let start = hash % len;
        // Candidate step in [1, len-1]; bump (wrapping) until coprime.
        // gcd(1, len) == 1, so this always terminates.
        let mut step = (hash % (len - 1)) + 1;
        while gcd(step, len) != 1 {
            step = (step % (len - 1)) + 1;
        }

        Self { len, next: start, step, emitted: 0 }
    }

    /// The stride chosen for this walk.
    pub fn step(&self) -> u64 {
        self.step
    }
}

impl Iterator for FullCycleWalk {
    type Item = usize;

    fn next(&mut self) -> Option<usize> {
        if self.emitted >= self.len {
            return None;
        }
        let index = self.next;
        self.next = (self.next + self.step) % self.len;
        self.emitted += 1;
        Some(index as usize)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = (self.len - self.emitted) as usize;
        (remaining, Some(remaining))
    }
}

// =============================================================================
// TESTS
// =============================================================================
