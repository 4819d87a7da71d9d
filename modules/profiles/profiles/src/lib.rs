//! Profiles module: directory users, their profiles, and badges awarded on
//! profile events.

pub mod config;
pub mod domain;
pub mod infra;
pub mod local_client;
pub mod module;
pub mod telemetry;

pub use config::ProfilesConfig;
pub use module::{Backends, ProfilesModule};
