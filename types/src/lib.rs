//! Fundamental types for nanpow.
//!
//! This crate defines the values shared by every other crate in the workspace:
//! the 32-byte block hash a proof is computed for, the 8-byte work nonce that
//! comes back, and the per-round seed pair.

pub mod block;
pub mod error;
pub mod nonce;
pub mod seed;

pub use block::{BlockHash, HashWords};
pub use error::InputError;
pub use nonce::WorkNonce;
pub use seed::SeedPair;
