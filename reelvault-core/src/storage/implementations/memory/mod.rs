mod blob;

pub use blob::MemoryBlobStore;
