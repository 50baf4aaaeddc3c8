//! Filesystem blob storage
//!
//! Blobs live side by side in one flat directory under their derived
//! `<digest><ext>` names, so the directory can be served as static files.

use crate::storage::traits::BlobStore;
use crate::storage::types::{BlobStat, StoredBlob};
use anyhow::{bail, Context};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;

/// Blob storage in a single directory on the filesystem
#[derive(Debug, Clone)]
pub struct FsBlobStore {
    root: PathBuf,
}

impl FsBlobStore {
    /// Create a new FsBlobStore over an existing directory
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    /// Create the storage directory (and parents) if needed
    pub async fn create(root: PathBuf) -> anyhow::Result<Self> {
        fs::create_dir_all(&root)
            .await
            .with_context(|| format!("creating storage directory {}", root.display()))?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Get the filesystem path for a blob
    pub fn path_for(&self, name: &str) -> anyhow::Result<PathBuf> {
        if name.is_empty() || name == "." || name == ".." || name.contains(['/', '\\']) {
            bail!("invalid blob name {:?}", name);
        }
        Ok(self.root.join(name))
    }

    fn temp_path_for(&self, name: &str) -> PathBuf {
        self.root.join(format!(".{}.tmp", name))
    }
}

#[async_trait]
impl BlobStore for FsBlobStore {
    async fn store(&self, name: &str, data: &[u8]) -> anyhow::Result<StoredBlob> {
        let path = self.path_for(name)?;

        // Content-addressed names never change meaning, so a complete file wins
        if fs::try_exists(&path).await? {
            return Ok(StoredBlob {
                name: name.to_string(),
                size: data.len() as u64,
            });
        }

        fs::create_dir_all(&self.root).await?;

        // Write atomically using a temp file
        let temp_path = self.temp_path_for(name);
        let mut file = fs::File::create(&temp_path)
            .await
            .with_context(|| format!("creating {}", temp_path.display()))?;
        if let Err(e) = file.write_all(data).await {
            fs::remove_file(&temp_path).await.ok();
            return Err(e).with_context(|| format!("writing {}", temp_path.display()));
        }
        file.sync_all().await?;
        fs::rename(&temp_path, &path)
            .await
            .with_context(|| format!("renaming into {}", path.display()))?;

        Ok(StoredBlob {
            name: name.to_string(),
            size: data.len() as u64,
        })
    }

    async fn stat(&self, name: &str) -> anyhow::Result<Option<BlobStat>> {
        let path = self.path_for(name)?;
        let metadata = match fs::metadata(&path).await {
            Ok(metadata) => metadata,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e).with_context(|| format!("stat {}", path.display())),
        };

        // Not every filesystem records a birth time
        let created = metadata.created().or_else(|_| metadata.modified())?;
        Ok(Some(BlobStat {
            size: metadata.len(),
            created_at: DateTime::<Utc>::from(created),
        }))
    }

    async fn exists(&self, name: &str) -> bool {
        match self.path_for(name) {
            Ok(path) => fs::try_exists(&path).await.unwrap_or(false),
            Err(_) => false,
        }
    }

    async fn delete(&self, name: &str) -> anyhow::Result<bool> {
        let path = self.path_for(name)?;
        match fs::remove_file(&path).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e).with_context(|| format!("removing {}", path.display())),
        }
    }

    async fn list_all(&self) -> anyhow::Result<Vec<String>> {
        let mut names = Vec::new();

        if !fs::try_exists(&self.root).await? {
            return Ok(names);
        }

        let mut entries = fs::read_dir(&self.root).await?;
        while let Some(entry) = entries.next_entry().await? {
            if !entry.file_type().await?.is_file() {
                continue;
            }
            if let Some(name) = entry.file_name().to_str() {
                names.push(name.to_string());
            }
        }

        names.sort();
        Ok(names)
    }
}
