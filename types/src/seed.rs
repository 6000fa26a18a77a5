//! Per-round random seed material.

/// The two random 4-byte values that parameterize one search round.
///
/// `work1` becomes the upper half of every candidate nonce in the round;
/// bytes 2 and 3 of `work0` are mixed into the lower half by the kernel.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub struct SeedPair {
    pub work0: [u8; 4],
    pub work1: [u8; 4],
}

impl SeedPair {
    pub fn new(work0: [u8; 4], work1: [u8; 4]) -> Self {
        Self { work0, work1 }
    }
}
