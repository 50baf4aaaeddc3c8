//! Deduplicating media store with TTL-based lifecycle
//!
//! This crate provides:
//! - **Storage**: `BlobStore` trait with `FsBlobStore` and `MemoryBlobStore`
//! - **Index**: `ContentIndex`, the digest -> entry mapping persisted as JSON,
//!   with load-time repair against the storage directory
//! - **Lifecycle**: `Reconciler` for expiry and orphan sweeps, on demand or
//!   on a background interval
//! - **Upload rules**: `UploadPolicy` and extension/MIME helpers
//! - **Access**: `ApiKeyGuard` for the key-protected operations
//!
//! An open `ContentIndex` holds an exclusive lock on `<index>.lock`, so only
//! one process at a time can own a given index and storage directory.
//!
//! Digests are SHA-256. Indexes written by deployments that keyed entries by
//! MD5 still load, and those entries behave normally, but deduplication does
//! not reach them: uploading the same bytes again stores a second copy under
//! its SHA-256 name.
//!
//! # Example
//!
//! ```ignore
//! use reelvault_core::{ContentIndex, FsBlobStore, IndexOptions, TtlSpec};
//!
//! let blobs = Arc::new(FsBlobStore::create(storage_dir).await?);
//! let index = ContentIndex::open(blobs, index_path, IndexOptions::default()).await?;
//! let stored = index.put(&bytes, ".mp4", Some("holiday"), TtlSpec::parse(Some("0"))).await?;
//! ```
pub mod access;
pub mod error;
pub mod lifecycle;
pub mod storage;
pub mod upload;

pub use access::ApiKeyGuard;
pub use error::{AccessError, IndexFileError, StoreError, ValidationError};
pub use lifecycle::{Reconciler, ReconcilerHandle, SweepSummary};
pub use storage::types::{
    BlobDigest, BlobEntry, Comment, DeleteOutcome, DeleteTarget, ListedBlob, PutOutcome, TtlSpec,
};
pub use storage::{BlobStore, ContentIndex, FsBlobStore, IndexOptions, LoadReport, MemoryBlobStore};
pub use upload::UploadPolicy;
