//! Blob storage types

use chrono::{DateTime, Utc};

/// Result of storing a blob
#[derive(Debug, Clone)]
pub struct StoredBlob {
    /// Name the blob was stored under
    pub name: String,
    /// Size in bytes
    pub size: u64,
}

/// Fresh on-disk facts about a stored blob
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlobStat {
    pub size: u64,
    pub created_at: DateTime<Utc>,
}
