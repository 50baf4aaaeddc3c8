mod blob;

pub use blob::FsBlobStore;
