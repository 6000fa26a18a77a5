//! Input validation errors shared across crates.

use thiserror::Error;

/// A caller-supplied value could not be turned into a typed input.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum InputError {
    #[error("block hash must be 32 bytes, got {len}")]
    InvalidHashLength { len: usize },

    #[error("work nonce must be 8 bytes, got {len}")]
    InvalidNonceLength { len: usize },

    #[error("invalid hex: {0}")]
    InvalidHex(#[from] hex::FromHexError),
}
