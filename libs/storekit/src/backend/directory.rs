//! Identity directory reached through its admin API.
//!
//! The directory only offers paginated bulk listing; it cannot filter or
//! sort on the server.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::BackendError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DirectoryUser {
    pub id: Uuid,
    pub email: String,
    pub phone: Option<String>,
    pub email_confirmed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub user_metadata: serde_json::Map<String, serde_json::Value>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub last_sign_in_at: Option<DateTime<Utc>>,
}

/// Admin write payload. `None` leaves the attribute untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserAttributes {
    pub email: Option<String>,
    pub password: Option<String>,
    pub phone: Option<String>,
    pub email_confirm: Option<bool>,
    /// Keys present here replace the stored metadata keys.
    pub user_metadata: Option<serde_json::Map<String, serde_json::Value>>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DirectoryPage {
    pub users: Vec<DirectoryUser>,
    /// Reported total, when the directory provides one.
    pub total: Option<u64>,
}

#[async_trait]
pub trait DirectoryClient: Send + Sync {
    async fn create_user(&self, attrs: UserAttributes) -> Result<DirectoryUser, BackendError>;

    async fn get_user(&self, id: Uuid) -> Result<DirectoryUser, BackendError>;

    async fn update_user(
        &self,
        id: Uuid,
        attrs: UserAttributes,
    ) -> Result<DirectoryUser, BackendError>;

    async fn delete_user(&self, id: Uuid) -> Result<(), BackendError>;

    /// One 1-based page in the directory's native order.
    async fn list_users(&self, page: u32, per_page: u32) -> Result<DirectoryPage, BackendError>;
}
