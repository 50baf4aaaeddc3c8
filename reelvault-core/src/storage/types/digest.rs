//! Content digest newtype

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

/// Hex-encoded SHA-256 of a blob's full content.
///
/// Digests read back from an existing index file are kept verbatim, whatever
/// algorithm produced them; they are only compared for equality. Legacy MD5
/// keys therefore never match a fresh upload of the same bytes.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BlobDigest(String);

impl BlobDigest {
    /// Hash `data`
    pub fn from_data(data: &[u8]) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(data);
        Self(hex::encode(hasher.finalize()))
    }

    /// Wrap an existing digest string (for loading from the index)
    pub fn from_string(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// On-disk name for content with this digest: `<digest><ext>`
    pub fn filename(&self, extension: &str) -> String {
        format!("{}{}", self.0, extension)
    }
}

impl fmt::Display for BlobDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for BlobDigest {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<BlobDigest> for String {
    fn from(digest: BlobDigest) -> String {
        digest.0
    }
}
