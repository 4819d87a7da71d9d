//! Profiles SDK
//!
//! Public surface of the profiles module:
//! - `ProfilesApi` trait
//! - read and write models for users, profiles and badges
//! - error type (`ProfilesError`)
//! - the list/query types callers build requests with
//!
//! ```ignore
//! use profiles_sdk::{ListOptions, ProfilesApi};
//!
//! let page = api.list_profiles(ListOptions::default()).await?;
//! for profile in page.items {
//!     println!("{}", profile.username);
//! }
//! ```

pub mod api;
pub mod errors;
pub mod models;

pub use api::ProfilesApi;
pub use errors::{ErrorKind, ProfilesError};
pub use models::{
    AvatarUpload, Badge, BadgePatch, IdentityDocument, NewBadge, NewProfile, NewUser, ProfilePatch,
    User, UserBadge, UserPatch, UserProfile,
};

pub use storekit::{
    FilterOperator, FilterOption, FilterValue, ListOptions, ListParams, Page, PageInfo,
    QueryConfig, SortOrder,
};
