//! Storage implementations
//!
//! ## Available Implementations
//!
//! - `fs/` - Filesystem-based blob storage
//! - `memory/` - In-memory storage for testing

pub mod fs;
pub mod memory;
