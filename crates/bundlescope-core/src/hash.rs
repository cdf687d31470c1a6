//! SHA-256 content digests for leaves and directories.

use std::fmt;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;

/// Digest size in bytes (SHA-256 produces 256-bit hashes).
pub const HASH_SIZE: usize = 32;

/// Error returned when parsing a hex digest fails.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HashParseError {
    /// Input had the wrong number of characters.
    #[error("expected {expected} hex characters, got {actual}")]
    InvalidLength { expected: usize, actual: usize },

    /// Input contained a non-hex character.
    #[error("invalid hex character {found:?} at offset {offset}")]
    InvalidCharacter { found: char, offset: usize },
}

/// SHA-256 content hash identifying a node's content.
///
/// Leaves hash their bytes; directories hash the concatenation of their
/// children's raw digests (see [`ContentHash::combine`]).
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct ContentHash(pub [u8; HASH_SIZE]);

impl ContentHash {
    /// Create a ContentHash from raw bytes.
    pub fn new(bytes: [u8; HASH_SIZE]) -> Self {
        Self(bytes)
    }

    /// Hash a byte slice.
    pub fn digest(data: impl AsRef<[u8]>) -> Self {
        Self(Sha256::digest(data.as_ref()).into())
    }

    /// Digest of the empty input.
    ///
    /// This is also the hash of a directory with no entries.
    pub fn empty() -> Self {
        Self::digest(b"")
    }

    /// Combine an ordered sequence of child digests into a parent digest.
    ///
    /// The raw 32-byte digests are fed to the hasher back to back, so no
    /// delimiter is needed to keep the encoding unambiguous. Order matters.
    pub fn combine<'a>(children: impl IntoIterator<Item = &'a ContentHash>) -> Self {
        let mut hasher = Sha256::new();
        for child in children {
            hasher.update(child.0);
        }
        Self(hasher.finalize().into())
    }

    /// Borrow the raw digest bytes.
    pub fn as_bytes(&self) -> &[u8; HASH_SIZE] {
        &self.0
    }

    /// Get the hash as a lowercase hex string.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Parse a 64-character hex string.
    pub fn from_hex(hex_str: &str) -> Result<Self, HashParseError> {
        if hex_str.len() != HASH_SIZE * 2 {
            return Err(HashParseError::InvalidLength {
                expected: HASH_SIZE * 2,
                actual: hex_str.len(),
            });
        }

        let mut bytes = [0u8; HASH_SIZE];
        hex::decode_to_slice(hex_str, &mut bytes).map_err(|e| match e {
            hex::FromHexError::InvalidHexCharacter { c, index } => {
                HashParseError::InvalidCharacter {
                    found: c,
                    offset: index,
                }
            }
            _ => {
                HashParseError::InvalidLength {
                    expected: HASH_SIZE * 2,
                    actual: hex_str.len(),
                }
            }
        })?;
        Ok(Self(bytes))
    }
}

impl fmt::Debug for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ContentHash({})", self.to_hex())
    }
}

impl fmt::Display for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl From<ContentHash> for String {
    fn from(hash: ContentHash) -> Self {
        hash.to_hex()
    }
}

impl TryFrom<String> for ContentHash {
    type Error = HashParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::from_hex(&value)
    }
}
