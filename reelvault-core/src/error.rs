//! Error types surfaced to adapter layers

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// A request was rejected before any state was touched
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("no file uploaded")]
    Empty,
    #[error("file size {size} exceeds the {limit} byte limit")]
    TooLarge { size: u64, limit: u64 },
    #[error("unsupported file type {0:?}")]
    UnsupportedType(String),
    #[error("{0} must not be empty")]
    MissingParameter(&'static str),
}

/// Failure reading or writing the index file
#[derive(Debug, Error)]
pub enum IndexFileError {
    #[error("i/o error: {0}")]
    Io(#[from] io::Error),
    #[error("encoding error: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Errors returned by [`ContentIndex`](crate::ContentIndex) operations
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("invalid request: {0}")]
    Validation(#[from] ValidationError),

    #[error("not found: {0}")]
    NotFound(String),

    /// Writing new content failed; no entry was created
    #[error("storage failure while {context}: {cause:#}")]
    Storage { context: String, cause: anyhow::Error },

    /// Another open index already owns this index file
    #[error("index file {} is in use by another process (stop `reelvault serve` first)", path.display())]
    IndexInUse { path: PathBuf },

    #[error("index file {}: {source}", path.display())]
    Index {
        path: PathBuf,
        #[source]
        source: IndexFileError,
    },
}

impl StoreError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound(_))
    }
}

/// Outcome of an API key check
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AccessError {
    /// No key is configured, so protected operations cannot be allowed
    #[error("API key is not configured")]
    Misconfigured,
    #[error("invalid API key")]
    Forbidden,
}
