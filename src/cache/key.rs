//! Resource keys and their on-disk slot names.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

/// Stable identifier for a remote resource.
///
/// Usually the canonical URL or a dependency coordinate. Two keys are equal
/// when their strings are equal, so the same logical resource maps to the
/// same slot across process restarts.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResourceKey(String);

impl ResourceKey {
    /// Create a key from its canonical string form.
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// The canonical string form.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// File-system safe name of this key's slot.
    ///
    /// First 16 bytes of the SHA-256 of the key, hex encoded.
    pub fn slot_name(&self) -> String {
        let hash = Sha256::digest(self.0.as_bytes());
        hex::encode(&hash.as_slice()[..16])
    }
}

impl fmt::Display for ResourceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ResourceKey {
    fn from(key: &str) -> Self {
        Self::new(key)
    }
}

impl From<String> for ResourceKey {
    fn from(key: String) -> Self {
        Self(key)
    }
}
