//! Per-round seed generation.

use nanpow_types::SeedPair;

/// Produces a fresh [`SeedPair`] for every round.
pub trait SeedSource: Send + Sync {
    fn next_pair(&self) -> SeedPair;
}

/// Seeds from the thread-local CSPRNG.
#[derive(Debug, Default, Clone, Copy)]
pub struct OsSeedSource;

impl SeedSource for OsSeedSource {
    fn next_pair(&self) -> SeedPair {
        SeedPair::new(rand::random(), rand::random())
    }
}
