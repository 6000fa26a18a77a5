//! Kernel result word → work nonce.

use nanpow_types::{SeedPair, WorkNonce};

/// Turn a non-zero kernel result into the nonce it stands for.
///
/// With `r0..r3` the result bytes (most significant first), the low half of
/// the nonce is `[r2, r3, work0[2] ^ (r0 - 1), work0[3] ^ (r1 - 1)]`. The nonce
/// is `reverse(work1) ++ reverse(low)`. Downstream verifiers depend on this
/// exact byte order.
pub fn derive_nonce(result: u32, seeds: SeedPair) -> WorkNonce {
    let [r0, r1, r2, r3] = result.to_be_bytes();
    let low = [
        r2,
        r3,
        seeds.work0[2] ^ r0.wrapping_sub(1),
        seeds.work0[3] ^ r1.wrapping_sub(1),
    ];

    let mut bytes = [0u8; 8];
    for (dst, src) in bytes[..4].iter_mut().zip(seeds.work1.iter().rev()) {
        *dst = *src;
    }
    for (dst, src) in bytes[4..].iter_mut().zip(low.iter().rev()) {
        *dst = *src;
    }
    WorkNonce::new(bytes)
}
