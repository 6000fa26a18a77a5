//! Cryptographic primitives for nanpow.
//!
//! Blake2b-64 for work values: the 8-byte digest of `nonce || hash`.

pub mod hash;

pub use hash::{blake2b_64, blake2b_64_multi};
