//! Module configuration.
//!
//! Layered with `figment`: built-in defaults, then an optional YAML file,
//! then `PROFILES__`-prefixed environment variables where `__` separates
//! nesting levels (`PROFILES__QUERY__MAX_PER_PAGE=50`).

use std::path::{Path, PathBuf};

use figment::Figment;
use figment::providers::{Env, Format, Serialized, Yaml};
use serde::{Deserialize, Serialize};
use storekit::QueryConfig;
use thiserror::Error;

pub const ENV_PREFIX: &str = "PROFILES__";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("configuration file not found: {}", .0.display())]
    MissingFile(PathBuf),

    #[error("failed to load configuration: {0}")]
    Load(#[from] Box<figment::Error>),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProfilesConfig {
    pub query: QueryConfig,
    pub badges: BadgeRulesConfig,
    pub storage: StorageConfig,
    pub directory: DirectoryConfig,
    pub logging: LoggingConfig,
}

/// Badge names awarded by the built-in rules.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BadgeRulesConfig {
    /// Awarded when a user creates their profile.
    pub explorer: String,
    /// Awarded when a user verifies their identity.
    pub verified_locale: String,
}

impl Default for BadgeRulesConfig {
    fn default() -> Self {
        Self {
            explorer: "explorer".to_owned(),
            verified_locale: "verified-locale".to_owned(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StorageConfig {
    pub public_base_url: String,
    pub avatars_bucket: String,
    pub documents_bucket: String,
    pub max_upload_bytes: usize,
    pub allowed_image_types: Vec<String>,
    pub allowed_document_types: Vec<String>,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            public_base_url: "http://localhost:54321".to_owned(),
            avatars_bucket: "avatars".to_owned(),
            documents_bucket: "identity-documents".to_owned(),
            max_upload_bytes: 5 * 1024 * 1024,
            allowed_image_types: ["image/jpeg", "image/png", "image/webp", "image/gif"]
                .map(str::to_owned)
                .to_vec(),
            allowed_document_types: ["application/pdf", "image/jpeg", "image/png"]
                .map(str::to_owned)
                .to_vec(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DirectoryConfig {
    /// Page size used when scanning the directory's own pagination.
    pub scan_page_size: u32,
}

impl Default for DirectoryConfig {
    fn default() -> Self {
        Self {
            scan_page_size: storekit::adapter::DEFAULT_SCAN_PAGE_SIZE,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingConfig {
    /// `EnvFilter` directive, overridden by `RUST_LOG` when set.
    pub level: String,
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_owned(),
            json: false,
        }
    }
}

impl ProfilesConfig {
    /// Merge defaults, the YAML file at `path` (when given) and the
    /// environment, then validate the result.
    ///
    /// # Errors
    /// Fails when the file is missing or malformed, a value has the wrong
    /// type, or the merged configuration is inconsistent.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));
        if let Some(path) = path {
            if !path.is_file() {
                return Err(ConfigError::MissingFile(path.to_path_buf()));
            }
            figment = figment.merge(Yaml::file(path));
        }
        let cfg: Self = figment
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()
            .map_err(Box::new)?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// # Errors
    /// Returns `ConfigError::Invalid` for zero or inverted page limits,
    /// blank badge names, or a zero upload cap.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let q = &self.query;
        if q.default_per_page == 0 || q.max_per_page == 0 {
            return Err(ConfigError::Invalid(
                "query page sizes must be at least 1".to_owned(),
            ));
        }
        if q.default_per_page > q.max_per_page {
            return Err(ConfigError::Invalid(format!(
                "query.default_per_page ({}) exceeds query.max_per_page ({})",
                q.default_per_page, q.max_per_page
            )));
        }
        if q.default_sort_field.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "query.default_sort_field must not be blank".to_owned(),
            ));
        }
        if self.badges.explorer.trim().is_empty() || self.badges.verified_locale.trim().is_empty() {
            return Err(ConfigError::Invalid("badge names must not be blank".to_owned()));
        }
        if self.storage.max_upload_bytes == 0 {
            return Err(ConfigError::Invalid(
                "storage.max_upload_bytes must be positive".to_owned(),
            ));
        }
        if self.directory.scan_page_size == 0 {
            return Err(ConfigError::Invalid(
                "directory.scan_page_size must be at least 1".to_owned(),
            ));
        }
        Ok(())
    }
}
