//! The proof-of-work nonce returned to callers.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::InputError;

/// Length of a work nonce in bytes.
pub const NONCE_LEN: usize = 8;

/// An 8-byte work nonce.
///
/// The bytes are the big-endian encoding of the 64-bit nonce; the value that
/// gets hashed together with the block hash is its little-endian encoding.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct WorkNonce([u8; NONCE_LEN]);

impl WorkNonce {
    pub fn new(bytes: [u8; NONCE_LEN]) -> Self {
        Self(bytes)
    }

    pub fn from_u64(value: u64) -> Self {
        Self(value.to_be_bytes())
    }

    pub fn from_slice(bytes: &[u8]) -> Result<Self, InputError> {
        let array: [u8; NONCE_LEN] = bytes
            .try_into()
            .map_err(|_| InputError::InvalidNonceLength { len: bytes.len() })?;
        Ok(Self(array))
    }

    /// Parse a 16-character hex string (either case).
    pub fn from_hex(s: &str) -> Result<Self, InputError> {
        let bytes = hex::decode(s.trim())?;
        Self::from_slice(&bytes)
    }

    pub fn as_bytes(&self) -> &[u8; NONCE_LEN] {
        &self.0
    }

    pub fn as_u64(&self) -> u64 {
        u64::from_be_bytes(self.0)
    }
}

impl FromStr for WorkNonce {
    type Err = InputError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

impl fmt::Debug for WorkNonce {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "WorkNonce({})", hex::encode_upper(self.0))
    }
}

impl fmt::Display for WorkNonce {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode_upper(self.0))
    }
}
