//! Core storage types

mod blob;
mod digest;
mod entry;
mod ttl;

pub use blob::{BlobStat, StoredBlob};
pub use digest::BlobDigest;
pub use entry::{BlobEntry, Comment, DeleteOutcome, DeleteTarget, ListedBlob, PutOutcome};
pub use ttl::{now_millis, Expiry, TtlSpec};
