//! Reference backends used by tests and local runs.

mod blob;
mod directory;
mod table;

pub use blob::{FsBlobStore, MemoryBlobStore, StoredBlob};
pub use directory::MemoryDirectory;
pub use table::MemoryTableClient;
