//! Selection engine: eligible pool and unbiased sampling
//!
//! The pool is recomputed from the live participants on every call so it
//! always reflects the latest `has_won` flags. Sampling is without
//! replacement: shuffle the filtered pool (Fisher–Yates) and take a prefix,
//! so every ordering of the pool is equally likely.

use std::collections::HashSet;

use rand::prelude::*;
use rand_chacha::ChaCha8Rng;

use pd_core::{Participant, ParticipantId, Prize};

/// Participants allowed to win `prize`
pub fn eligible_pool<'a>(prize: &Prize, participants: &'a [Participant]) -> Vec<&'a Participant> {
    participants
        .iter()
        .filter(|p| !prize.exclude_winners || !p.has_won)
        .collect()
}

/// Random sampler with a pluggable, seedable RNG
pub struct Sampler {
    rng: Box<dyn RngCore + Send>,
}

impl Sampler {
    /// Sampler seeded from the OS
    pub fn from_entropy() -> Self {
        Self {
            rng: Box::new(StdRng::from_os_rng()),
        }
    }

    /// Deterministic sampler for tests and replays
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: Box::new(ChaCha8Rng::seed_from_u64(seed)),
        }
    }

    /// Use a caller-provided RNG
    pub fn with_rng(rng: Box<dyn RngCore + Send>) -> Self {
        Self { rng }
    }

    /// Reseed for reproducible results
    pub fn reseed(&mut self, seed: u64) {
        self.rng = Box::new(ChaCha8Rng::seed_from_u64(seed));
    }

    /// Pick `min(count, |pool - exclude|)` distinct participants uniformly
    /// at random. An empty pool or `count == 0` yields an empty list.
    pub fn sample(
        &mut self,
        pool: &[&Participant],
        count: usize,
        exclude: &HashSet<ParticipantId>,
    ) -> Vec<Participant> {
        if count == 0 {
            return Vec::new();
        }

        let mut candidates: Vec<&Participant> = pool
            .iter()
            .copied()
            .filter(|p| !exclude.contains(&p.id))
            .collect();
        if candidates.is_empty() {
            return Vec::new();
        }

        candidates.shuffle(self.rng.as_mut());
        candidates.truncate(count);
        candidates.into_iter().cloned().collect()
    }
}

impl Default for Sampler {
    fn default() -> Self {
        Self::from_entropy()
    }
}

impl std::fmt::Debug for Sampler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Sampler").finish_non_exhaustive()
    }
}
