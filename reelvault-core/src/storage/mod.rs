//! Storage for uploaded blobs and their metadata
//!
//! - `traits` - the `BlobStore` seam between the index and the bytes
//! - `implementations` - filesystem and in-memory blob stores
//! - `index` - the persisted digest -> entry mapping
//! - `types` - digests, entries and operation results

pub mod implementations;
pub mod index;
pub mod traits;
pub mod types;

pub use implementations::fs::FsBlobStore;
pub use implementations::memory::MemoryBlobStore;
pub use index::{ContentIndex, IndexOptions, LoadReport};
pub use traits::BlobStore;
