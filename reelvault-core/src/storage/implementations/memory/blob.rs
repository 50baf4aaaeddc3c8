//! In-memory BlobStore implementation

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::sync::Mutex;

use crate::storage::traits::BlobStore;
use crate::storage::types::{BlobStat, StoredBlob};

/// In-memory blob store for testing
#[derive(Debug, Default)]
pub struct MemoryBlobStore {
    blobs: Mutex<BTreeMap<String, (Vec<u8>, DateTime<Utc>)>>,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop a blob behind the index's back, like an external `rm`
    pub fn remove_externally(&self, name: &str) -> bool {
        self.blobs.lock().unwrap().remove(name).is_some()
    }

    /// Place a blob the index knows nothing about
    pub fn insert_externally(&self, name: &str, data: &[u8]) {
        self.blobs
            .lock()
            .unwrap()
            .insert(name.to_string(), (data.to_vec(), Utc::now()));
    }

    /// Set the creation time reported by `stat`
    pub fn set_created_at(&self, name: &str, at: DateTime<Utc>) {
        if let Some(blob) = self.blobs.lock().unwrap().get_mut(name) {
            blob.1 = at;
        }
    }

    pub fn len(&self) -> usize {
        self.blobs.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn store(&self, name: &str, data: &[u8]) -> Result<StoredBlob> {
        let mut blobs = self.blobs.lock().unwrap();
        blobs
            .entry(name.to_string())
            .or_insert_with(|| (data.to_vec(), Utc::now()));

        Ok(StoredBlob {
            name: name.to_string(),
            size: data.len() as u64,
        })
    }

    async fn stat(&self, name: &str) -> Result<Option<BlobStat>> {
        let blobs = self.blobs.lock().unwrap();
        Ok(blobs.get(name).map(|(data, created_at)| BlobStat {
            size: data.len() as u64,
            created_at: *created_at,
        }))
    }

    async fn exists(&self, name: &str) -> bool {
        self.blobs.lock().unwrap().contains_key(name)
    }

    async fn delete(&self, name: &str) -> Result<bool> {
        Ok(self.blobs.lock().unwrap().remove(name).is_some())
    }

    async fn list_all(&self) -> Result<Vec<String>> {
        Ok(self.blobs.lock().unwrap().keys().cloned().collect())
    }
}
