#![no_main]

use libfuzzer_sys::fuzz_target;
use nanpow_types::{BlockHash, WorkNonce};

fuzz_target!(|data: &[u8]| {
    // Raw bytes: only exactly 32 are accepted.
    match BlockHash::from_slice(data) {
        Ok(hash) => {
            assert_eq!(data.len(), 32);
            assert_eq!(hash.as_bytes(), data);
        }
        Err(_) => assert_ne!(data.len(), 32),
    }

    // Text: hex parsing must never panic, and what parses must print back.
    if let Ok(text) = std::str::from_utf8(data) {
        if let Ok(hash) = BlockHash::from_hex(text) {
            assert!(hash.to_string().eq_ignore_ascii_case(text.trim()));
        }
        if let Ok(nonce) = WorkNonce::from_hex(text) {
            assert!(nonce.to_string().eq_ignore_ascii_case(text.trim()));
        }
    }
});
