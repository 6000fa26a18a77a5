//! The block hash a proof of work is computed for.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::InputError;

/// Length of a block hash in bytes.
pub const HASH_LEN: usize = 32;

/// A 32-byte block identifier.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BlockHash([u8; HASH_LEN]);

impl Default for BlockHash {
    fn default() -> Self {
        Self::ZERO
    }
}

/// A block hash laid out the way the search kernel consumes it.
///
/// Each half of the hash becomes four 32-bit words. Word `i` of `hash0` is the
/// little-endian value of bytes `4i..4i+4`; `hash1` covers bytes 16..32.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct HashWords {
    pub hash0: [u32; 4],
    pub hash1: [u32; 4],
}

impl BlockHash {
    pub const ZERO: Self = Self([0u8; HASH_LEN]);

    pub fn new(bytes: [u8; HASH_LEN]) -> Self {
        Self(bytes)
    }

    /// Build a hash from an arbitrary slice, rejecting anything that is not
    /// exactly 32 bytes long.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, InputError> {
        let array: [u8; HASH_LEN] = bytes
            .try_into()
            .map_err(|_| InputError::InvalidHashLength { len: bytes.len() })?;
        Ok(Self(array))
    }

    /// Parse a 64-character hex string (either case).
    pub fn from_hex(s: &str) -> Result<Self, InputError> {
        let bytes = hex::decode(s.trim())?;
        Self::from_slice(&bytes)
    }

    pub fn as_bytes(&self) -> &[u8; HASH_LEN] {
        &self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; HASH_LEN]
    }

    /// Split the hash into the kernel's word layout.
    pub fn kernel_words(&self) -> HashWords {
        let mut words = [0u32; 8];
        for (word, chunk) in words.iter_mut().zip(self.0.chunks_exact(4)) {
            *word = u32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
        }
        HashWords {
            hash0: [words[0], words[1], words[2], words[3]],
            hash1: [words[4], words[5], words[6], words[7]],
        }
    }
}

impl TryFrom<&[u8]> for BlockHash {
    type Error = InputError;

    fn try_from(bytes: &[u8]) -> Result<Self, Self::Error> {
        Self::from_slice(bytes)
    }
}

impl FromStr for BlockHash {
    type Err = InputError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

impl fmt::Debug for BlockHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BlockHash({}\u{2026})", hex::encode_upper(&self.0[..4]))
    }
}

impl fmt::Display for BlockHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode_upper(self.0))
    }
}
