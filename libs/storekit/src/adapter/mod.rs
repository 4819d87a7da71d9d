//! [`Repository`](crate::repository::Repository) implementations, one per
//! backend kind.

mod directory;
mod table;

pub use directory::{
    DEFAULT_SCAN_PAGE_SIZE, DIRECTORY_FIELDS, DirectoryMapping, DirectoryRepository,
};
pub use table::{Embed, TableRepository, TableSpec};
