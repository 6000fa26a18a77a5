//! Blake2b hashing.

use blake2::digest::consts::U8;
use blake2::{Blake2b, Digest};

type Blake2b64 = Blake2b<U8>;

/// Compute a 64-bit Blake2b digest of arbitrary data.
pub fn blake2b_64(data: &[u8]) -> [u8; 8] {
    let mut hasher = Blake2b64::new();
    hasher.update(data);
    let mut output = [0u8; 8];
    output.copy_from_slice(&hasher.finalize());
    output
}

/// Hash multiple byte slices in sequence (avoids concatenation allocation).
pub fn blake2b_64_multi(parts: &[&[u8]]) -> [u8; 8] {
    let mut hasher = Blake2b64::new();
    for part in parts {
        hasher.update(part);
    }
    let mut output = [0u8; 8];
    output.copy_from_slice(&hasher.finalize());
    output
}
