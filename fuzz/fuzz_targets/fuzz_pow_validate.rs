#![no_main]

use libfuzzer_sys::fuzz_target;
use nanpow_kernel::{meets_difficulty, validate_work, work_value};
use nanpow_types::{BlockHash, WorkNonce};

fuzz_target!(|data: &[u8]| {
    // 32 (hash) + 8 (nonce), optionally followed by 4 bytes of difficulty.
    if data.len() < 40 {
        return;
    }
    let Ok(block_hash) = BlockHash::from_slice(&data[..32]) else {
        return;
    };
    let Ok(nonce) = WorkNonce::from_slice(&data[32..40]) else {
        return;
    };
    let difficulty = match data.get(40..44) {
        Some(bytes) => u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]),
        None => 0xFFFF_FE00,
    };

    let value = work_value(&block_hash, &nonce);
    let valid = validate_work(&block_hash, &nonce, difficulty);
    assert_eq!(valid, meets_difficulty(value, difficulty));
    assert_eq!(valid, (value >> 32) as u32 > difficulty);
    // A threshold one below a passing one must pass too.
    if valid && difficulty > 0 {
        assert!(validate_work(&block_hash, &nonce, difficulty - 1));
    }
});
