//! Storage toolkit: a backend-agnostic query model, declarative payload
//! validation, and a repository contract with adapters for a relational
//! table store and an identity directory.

pub mod adapter;
pub mod backend;
pub mod error;
pub mod inmem;
pub mod page;
pub mod query;
pub mod repository;
pub mod validate;
pub mod value;

pub use adapter::{DirectoryMapping, DirectoryRepository, Embed, TableRepository, TableSpec};
pub use error::{BackendError, ErrorKind, RepoError, RepoResult};
pub use page::{Page, PageInfo};
pub use query::{
    FilterOperator, FilterOption, FilterParam, ListOptions, ListParams, QueryConfig, QueryError,
    SortOrder,
};
pub use repository::Repository;
pub use validate::{FieldError, Rule, Validate, ValidationErrors, Validator, validate_all};
pub use value::FilterValue;
