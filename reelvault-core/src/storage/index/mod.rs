//! Content index: digest -> entry, mirrored to a JSON file.
//!
//! All mutations go through one async mutex around the in-memory map and
//! persist a snapshot before the lock is released, so the file on disk is
//! never older than the last committed change. Blob writes for new content
//! happen under the same lock, which is what keeps two uploads of identical
//! bytes from both creating the file.
//!
//! An open index holds an exclusive lock on `<index>.lock`, so a second
//! index on the same file is refused rather than silently diverging.

mod file;
mod lock;
pub(crate) mod record;

use serde::Serialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, MutexGuard};
use tracing::{debug, error, info, warn};

use crate::error::{StoreError, ValidationError};
use crate::storage::traits::BlobStore;
use crate::storage::types::{
    now_millis, BlobDigest, BlobEntry, Comment, DeleteOutcome, DeleteTarget, ListedBlob,
    PutOutcome, TtlSpec,
};
use crate::storage::FsBlobStore;
use crate::upload::{extension_of, mime_for_extension, normalize_extension, UploadPolicy};
use file::{IndexFile, RawIndex};
use lock::IndexLock;

pub(crate) type Entries = BTreeMap<BlobDigest, BlobEntry>;

/// Tunables for a [`ContentIndex`]
#[derive(Debug, Clone)]
pub struct IndexOptions {
    /// Lifetime of uploads that carry no TTL
    pub default_ttl: Duration,
    pub policy: UploadPolicy,
}

impl Default for IndexOptions {
    fn default() -> Self {
        Self {
            default_ttl: Duration::from_secs(24 * 60 * 60),
            policy: UploadPolicy::default(),
        }
    }
}

impl IndexOptions {
    pub fn from_settings(settings: &config::Settings) -> Self {
        Self {
            default_ttl: Duration::from_secs(settings.default_ttl_hours.saturating_mul(60 * 60)),
            policy: UploadPolicy::new(settings.max_upload_bytes, &settings.allowed_extensions),
        }
    }
}

/// What the load/repair pass found
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadReport {
    /// Entries kept after repair
    pub loaded: usize,
    /// Entries dropped because their file was gone
    pub missing_files: usize,
    /// Records that could not be salvaged at all
    pub dropped_records: usize,
    pub repaired_fields: usize,
    /// The index was unreadable and started over empty
    pub reset: bool,
}

/// The authoritative digest -> entry mapping
pub struct ContentIndex<B: BlobStore = FsBlobStore> {
    blobs: Arc<B>,
    file: IndexFile,
    options: IndexOptions,
    entries: Mutex<Entries>,
    lock: IndexLock,
}

impl<B: BlobStore> ContentIndex<B> {
    /// Lock the index file, load it and repair it against the blob store.
    ///
    /// Fails with [`StoreError::IndexInUse`] while another index owns the file.
    pub async fn open(
        blobs: Arc<B>,
        index_path: impl Into<PathBuf>,
        options: IndexOptions,
    ) -> Result<Self, StoreError> {
        Ok(Self::open_with_report(blobs, index_path, options).await?.0)
    }

    /// Like [`ContentIndex::open`], also returning what the repair pass did
    pub async fn open_with_report(
        blobs: Arc<B>,
        index_path: impl Into<PathBuf>,
        options: IndexOptions,
    ) -> Result<(Self, LoadReport), StoreError> {
        let index_path = index_path.into();
        let lock = IndexLock::acquire(&index_path)?;
        let file = IndexFile::new(index_path);
        let mut report = LoadReport::default();

        let mut entries = match file.read().await {
            RawIndex::Missing => {
                info!(path = %file.path().display(), "no index file yet, starting empty");
                Entries::new()
            }
            RawIndex::Corrupt => {
                report.reset = true;
                Entries::new()
            }
            RawIndex::Document(doc) => {
                let normalized = record::normalize_document(doc, now_millis(), options.default_ttl);
                if normalized.reset {
                    warn!(path = %file.path().display(), "index root is not a mapping, resetting");
                }
                report.reset = normalized.reset;
                report.dropped_records = normalized.dropped;
                report.repaired_fields = normalized.repaired_fields;
                normalized.entries
            }
        };

        let mut missing = Vec::new();
        for (digest, entry) in &entries {
            if !blobs.exists(&entry.filename).await {
                missing.push(digest.clone());
            }
        }
        for digest in missing {
            if let Some(entry) = entries.remove(&digest) {
                warn!(filename = %entry.filename, "removed missing file from index");
                report.missing_files += 1;
            }
        }
        report.loaded = entries.len();

        let index = Self {
            blobs,
            file,
            options,
            entries: Mutex::new(entries),
            lock,
        };

        // Persist right away so a crash before the next write doesn't meet the
        // same corruption again
        {
            let entries = index.entries.lock().await;
            index.persist_locked(&entries).await;
        }

        info!(
            loaded = report.loaded,
            missing_files = report.missing_files,
            dropped = report.dropped_records,
            repaired = report.repaired_fields,
            reset = report.reset,
            lock = %index.lock.path().display(),
            "index loaded"
        );
        Ok((index, report))
    }

    pub fn blobs(&self) -> &Arc<B> {
        &self.blobs
    }

    pub fn options(&self) -> &IndexOptions {
        &self.options
    }

    pub fn index_path(&self) -> &Path {
        self.file.path()
    }

    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.lock().await.is_empty()
    }

    /// Store `data`, or refresh the metadata of identical content already stored.
    ///
    /// `extension` is the original file extension in any case, with or without
    /// the dot. A duplicate never rewrites the file; it overwrites the title
    /// only when one is supplied and re-arms the expiry unless the entry is
    /// already permanent.
    pub async fn put(
        &self,
        data: &[u8],
        extension: &str,
        title: Option<&str>,
        ttl: TtlSpec,
    ) -> Result<PutOutcome, StoreError> {
        let extension = normalize_extension(extension);
        let size = data.len() as u64;
        self.options.policy.check(size, &extension)?;

        let title = title.filter(|t| !t.is_empty()).map(str::to_string);
        let digest = BlobDigest::from_data(data);
        let expiry = ttl.resolve(now_millis(), self.options.default_ttl);

        let mut entries = self.entries.lock().await;

        if let Some(entry) = entries.get_mut(&digest) {
            if let Some(title) = title {
                entry.title = Some(title);
            }
            let rearmed = entry.rearm(expiry);
            debug!(
                filename = %entry.filename,
                rearmed,
                is_permanent = entry.is_permanent,
                "duplicate upload"
            );
            let outcome = PutOutcome {
                digest,
                filename: entry.filename.clone(),
                is_duplicate: true,
                size,
                entry: entry.clone(),
            };
            self.persist_locked(&entries).await;
            return Ok(outcome);
        }

        let filename = digest.filename(&extension);
        self.blobs
            .store(&filename, data)
            .await
            .map_err(|cause| StoreError::Storage {
                context: format!("writing {}", filename),
                cause,
            })?;

        let entry = BlobEntry::new(filename.clone(), title, expiry);
        entries.insert(digest.clone(), entry.clone());
        info!(filename = %filename, size, is_permanent = entry.is_permanent, "stored new blob");
        self.persist_locked(&entries).await;

        Ok(PutOutcome {
            digest,
            filename,
            is_duplicate: false,
            size,
            entry,
        })
    }

    /// Every entry whose file still exists, newest upload first.
    ///
    /// Entries whose file has disappeared are removed from the index.
    pub async fn list(&self) -> Vec<ListedBlob> {
        let mut entries = self.entries.lock().await;
        let mut listed = Vec::with_capacity(entries.len());
        let mut missing = Vec::new();

        for (digest, entry) in entries.iter() {
            match self.blobs.stat(&entry.filename).await {
                Ok(Some(stat)) => listed.push(ListedBlob {
                    digest: digest.clone(),
                    filename: entry.filename.clone(),
                    title: entry.title.clone(),
                    size: stat.size,
                    uploaded_at: stat.created_at,
                    expires_at: if entry.is_permanent {
                        None
                    } else {
                        entry.expires_at.and_then(chrono::DateTime::<chrono::Utc>::from_timestamp_millis)
                    },
                    is_permanent: entry.is_permanent,
                    mime_type: mime_for_extension(&extension_of(&entry.filename)),
                    likes: entry.likes,
                    comments: entry.comments.clone(),
                }),
                Ok(None) => missing.push(digest.clone()),
                // Transient stat failures hide the entry from this listing only
                Err(e) => warn!(filename = %entry.filename, error = %e, "failed to stat blob"),
            }
        }

        if !missing.is_empty() {
            for digest in &missing {
                if let Some(entry) = entries.remove(digest) {
                    warn!(filename = %entry.filename, "removed missing file from index");
                }
            }
            self.persist_locked(&entries).await;
        }

        listed.sort_by(|a, b| b.uploaded_at.cmp(&a.uploaded_at));
        listed
    }

    /// Look up an entry by filename or digest
    pub async fn get(&self, filename_or_digest: &str) -> Option<(BlobDigest, BlobEntry)> {
        let entries = self.entries.lock().await;
        let digest = key_for(&entries, filename_or_digest)?;
        let entry = entries.get(&digest)?.clone();
        Some((digest, entry))
    }

    /// Set or clear the title
    pub async fn annotate(
        &self,
        filename_or_digest: &str,
        title: Option<&str>,
    ) -> Result<BlobEntry, StoreError> {
        let mut entries = self.entries.lock().await;
        let entry = lookup_mut(&mut entries, filename_or_digest)?;
        entry.title = title.filter(|t| !t.is_empty()).map(str::to_string);
        let updated = entry.clone();
        self.persist_locked(&entries).await;
        Ok(updated)
    }

    /// Add one like; returns the new count
    pub async fn like(&self, filename: &str) -> Result<u64, StoreError> {
        let mut entries = self.entries.lock().await;
        let entry = lookup_mut(&mut entries, filename)?;
        entry.likes = entry.likes.saturating_add(1);
        let likes = entry.likes;
        self.persist_locked(&entries).await;
        Ok(likes)
    }

    /// Append a comment stamped with the current time
    pub async fn comment(&self, filename: &str, text: &str) -> Result<Comment, StoreError> {
        if text.trim().is_empty() {
            return Err(ValidationError::MissingParameter("comment text").into());
        }

        let mut entries = self.entries.lock().await;
        let entry = lookup_mut(&mut entries, filename)?;
        let comment = Comment::new(text, chrono::Utc::now());
        entry.comments.push(comment.clone());
        self.persist_locked(&entries).await;
        Ok(comment)
    }

    /// Remove one blob, or everything in the storage directory.
    ///
    /// A failed file delete is logged and the entry is dropped anyway; the
    /// cleanup is attempted at most once.
    pub async fn delete(&self, target: &DeleteTarget) -> Result<DeleteOutcome, StoreError> {
        let mut entries = self.entries.lock().await;
        let mut outcome = DeleteOutcome::default();

        match target {
            DeleteTarget::File(name) => {
                let digest = key_for(&entries, name)
                    .ok_or_else(|| StoreError::NotFound(name.clone()))?;
                let Some(entry) = entries.remove(&digest) else {
                    return Err(StoreError::NotFound(name.clone()));
                };
                outcome.entries_removed = 1;
                if self.remove_blob(&entry.filename).await {
                    outcome.files_removed = 1;
                }
                info!(filename = %entry.filename, "deleted blob");
            }
            DeleteTarget::All => {
                let names = match self.blobs.list_all().await {
                    Ok(names) => names,
                    Err(e) => {
                        warn!(error = %e, "failed to list storage directory, deleting indexed files only");
                        entries.values().map(|e| e.filename.clone()).collect()
                    }
                };
                for name in names {
                    if self.remove_blob(&name).await {
                        outcome.files_removed += 1;
                    }
                }
                outcome.entries_removed = entries.len();
                entries.clear();
                info!(files = outcome.files_removed, entries = outcome.entries_removed, "deleted all blobs");
            }
        }

        self.persist_locked(&entries).await;
        Ok(outcome)
    }

    /// Write the current state to the index file
    pub async fn persist(&self) -> Result<(), StoreError> {
        let entries = self.entries.lock().await;
        self.file
            .write(&*entries)
            .await
            .map_err(|source| StoreError::Index {
                path: self.file.path().to_path_buf(),
                source,
            })
    }

    /// Final persist at shutdown
    pub async fn close(&self) -> Result<(), StoreError> {
        self.persist().await?;
        info!(path = %self.file.path().display(), "index closed");
        Ok(())
    }

    pub(crate) async fn lock(&self) -> MutexGuard<'_, Entries> {
        self.entries.lock().await
    }

    /// Persist while holding the lock. Failures are logged and the in-memory
    /// state stays authoritative until the next successful write.
    pub(crate) async fn persist_locked(&self, entries: &Entries) -> bool {
        match self.file.write(entries).await {
            Ok(()) => {
                debug!(entries = entries.len(), "index saved");
                true
            }
            Err(e) => {
                error!(path = %self.file.path().display(), error = %e, "failed to save index");
                false
            }
        }
    }

    /// Delete a file, treating failure as soft. Returns whether a file was removed.
    pub(crate) async fn remove_blob(&self, name: &str) -> bool {
        match self.blobs.delete(name).await {
            Ok(true) => true,
            Ok(false) => {
                debug!(filename = %name, "file already gone");
                false
            }
            Err(e) => {
                warn!(filename = %name, error = %e, "failed to delete file");
                false
            }
        }
    }
}

fn key_for(entries: &Entries, filename_or_digest: &str) -> Option<BlobDigest> {
    let digest = BlobDigest::from_string(filename_or_digest);
    if entries.contains_key(&digest) {
        return Some(digest);
    }
    entries
        .iter()
        .find(|(_, e)| e.filename == filename_or_digest)
        .map(|(d, _)| d.clone())
}

fn lookup_mut<'a>(entries: &'a mut Entries, key: &str) -> Result<&'a mut BlobEntry, StoreError> {
    let digest = key_for(entries, key).ok_or_else(|| StoreError::NotFound(key.to_string()))?;
    entries
        .get_mut(&digest)
        .ok_or_else(|| StoreError::NotFound(key.to_string()))
}
