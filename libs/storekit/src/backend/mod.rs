//! Client traits for the hosted services the adapters talk to.
//!
//! Each trait mirrors the native capability of one service. The reference
//! implementations live in [`crate::inmem`].

pub mod blob;
pub mod directory;
pub mod table;

pub use blob::BlobStore;
pub use directory::{DirectoryClient, DirectoryPage, DirectoryUser, UserAttributes};
pub use table::{OrderBy, Predicate, PredicateOp, Row, TableClient, TableQuery};
