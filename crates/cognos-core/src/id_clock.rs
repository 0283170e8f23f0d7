//! Monotonic sequence numbers and opaque IDs (C1).
//!
//! The bus needs a strictly monotone `seq` independent of wall-clock time; replay needs a seed-driven PRNG whose
//! output is reproducible across runs on any host. Both live here since they are
//! the two primitive sources of "the next number" the rest of the substrate
//! draws from.

use std::sync::atomic::{AtomicU64, Ordering};
use uuid::Uuid;

/// Monotonic counter shared across the process, handed out to the bus for
/// event `seq` and to any caller needing a cheap strictly-increasing tick.
#[derive(Debug, Default)]
pub struct IdClock {
    counter: AtomicU64,
}

impl IdClock {
    pub fn new() -> Self {
        Self {
            counter: AtomicU64::new(0),
        }
    }

    /// Returns the next value in the sequence, starting at 1.
    pub fn next_seq(&self) -> u64 {
        self.counter.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Current value without advancing.
    pub fn current(&self) -> u64 {
        self.counter.load(Ordering::SeqCst)
    }

    /// Mints a fresh opaque entity ID (DTU id, submission id, task id, ...).
    pub fn mint_id() -> String {
        Uuid::new_v4().to_string()
    }
}

/// Deterministic linear-congruential generator used by `ReplayEngine`.
///
/// Parameters are the classic Numerical-Recipes constants; any fixed choice is
/// fine here since the only requirement is that the same seed
/// always yields the same stream, not that the stream be cryptographically
/// strong.
#[derive(Debug, Clone)]
pub struct DeterministicRng {
    state: u64,
}

impl DeterministicRng {
    pub fn from_seed(seed: &str) -> Self {
        Self {
            state: seed_to_u64(seed),
        }
    }

    /// Advances the generator and returns the next raw 64-bit value.
    pub fn next_u64(&mut self) -> u64 {
        self.state = self
            .state
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        self.state
    }

    /// Next value folded into `[0.0, 1.0)`.
    pub fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    /// Next value in `[0, bound)`; returns 0 when `bound == 0`.
    pub fn next_bounded(&mut self, bound: u64) -> u64 {
        if bound == 0 {
            return 0;
        }
        self.next_u64() % bound
    }
}

fn seed_to_u64(seed: &str) -> u64 {
    // FNV-1a: simple, deterministic, no external dependency needed for a seed fold.
    let mut hash: u64 = 0xcbf29ce484222325;
    for byte in seed.as_bytes() {
        hash ^= *byte as u64;
        hash = hash.wrapping_mul(0x100000001b3);
    }
    if hash == 0 {
        1
    } else {
        hash
    }
}
