//! PoW validation.

use nanpow_crypto::blake2b_64_multi;
use nanpow_types::{BlockHash, WorkNonce};

/// Blake2b-64 of `nonce_le || hash`, read little-endian.
pub fn work_value(block_hash: &BlockHash, nonce: &WorkNonce) -> u64 {
    let nonce_le = nonce.as_u64().to_le_bytes();
    u64::from_le_bytes(blake2b_64_multi(&[&nonce_le, block_hash.as_bytes()]))
}

/// Whether a work value clears a difficulty threshold.
///
/// Only the high 32 bits take part, and they must be strictly greater.
pub fn meets_difficulty(work_value: u64, difficulty: u32) -> bool {
    (work_value >> 32) as u32 > difficulty
}

/// Validate that a work nonce meets the difficulty for a given block.
pub fn validate_work(block_hash: &BlockHash, nonce: &WorkNonce, difficulty: u32) -> bool {
    meets_difficulty(work_value(block_hash, nonce), difficulty)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn threshold_is_strict() {
        let value = 0x8000_0000_1234_5678;
        assert!(meets_difficulty(value, 0x7FFF_FFFF));
        assert!(!meets_difficulty(value, 0x8000_0000));
        assert!(!meets_difficulty(u64::MAX, u32::MAX));
    }

    #[test]
    fn work_value_depends_on_nonce_and_hash() {
        let hash = BlockHash::new([0x42; 32]);
        let a = work_value(&hash, &WorkNonce::from_u64(1));
        let b = work_value(&hash, &WorkNonce::from_u64(2));
        let c = work_value(&BlockHash::new([0x43; 32]), &WorkNonce::from_u64(1));
        assert_ne!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn validate_agrees_with_work_value() {
        let hash = BlockHash::new([0xAA; 32]);
        let nonce = WorkNonce::from_u64(12345);
        let high = (work_value(&hash, &nonce) >> 32) as u32;

        if high > 0 {
            assert!(validate_work(&hash, &nonce, high - 1));
        }
        assert!(!validate_work(&hash, &nonce, high));
    }
}
