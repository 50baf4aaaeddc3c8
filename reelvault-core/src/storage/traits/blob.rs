//! BlobStore trait for the flat blob directory

use anyhow::Result;
use async_trait::async_trait;

use crate::storage::types::{BlobStat, StoredBlob};

/// Named blob storage.
///
/// Names are the derived `<digest><ext>` filenames; the store itself knows
/// nothing about digests or metadata.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Write `data` under `name`, replacing nothing that is already complete
    async fn store(&self, name: &str, data: &[u8]) -> Result<StoredBlob>;

    /// Size and creation time, or `Ok(None)` if the blob does not exist
    async fn stat(&self, name: &str) -> Result<Option<BlobStat>>;

    /// Check if a blob exists
    async fn exists(&self, name: &str) -> bool;

    /// Delete a blob by name
    ///
    /// Returns Ok(true) if deleted, Ok(false) if didn't exist
    async fn delete(&self, name: &str) -> Result<bool>;

    /// Names of every object physically present, referenced or not
    async fn list_all(&self) -> Result<Vec<String>>;
}
