//! Nullable seeds: scripted seed pairs.

use std::sync::Mutex;

use nanpow_types::SeedPair;
use nanpow_work::SeedSource;

/// A deterministic [`SeedSource`] for testing.
///
/// Returns pre-configured pairs in order, wrapping around at the end.
pub struct NullSeedSource {
    pairs: Vec<SeedPair>,
    index: Mutex<usize>,
}

impl NullSeedSource {
    pub fn new(pairs: Vec<SeedPair>) -> Self {
        assert!(!pairs.is_empty(), "NullSeedSource needs at least one pair");
        Self {
            pairs,
            index: Mutex::new(0),
        }
    }

    /// Create with a single pair that will be returned for every round.
    pub fn constant(pair: SeedPair) -> Self {
        Self::new(vec![pair])
    }

    /// How many pairs have been handed out.
    pub fn drawn(&self) -> usize {
        *self.index.lock().unwrap()
    }
}

impl SeedSource for NullSeedSource {
    fn next_pair(&self) -> SeedPair {
        let mut idx = self.index.lock().unwrap();
        let pair = self.pairs[*idx % self.pairs.len()];
        *idx += 1;
        pair
    }
}
