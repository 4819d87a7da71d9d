//! In-process identity directory.

use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::RwLock;
use uuid::Uuid;

use crate::backend::directory::{DirectoryClient, DirectoryPage, DirectoryUser, UserAttributes};
use crate::error::BackendError;

/// Directory kept in memory, listing users in creation order.
///
/// E-mail addresses are unique ignoring case. Passwords are accepted and
/// dropped; this directory never authenticates anyone.
#[derive(Debug, Default)]
pub struct MemoryDirectory {
    users: RwLock<Vec<DirectoryUser>>,
    list_calls: AtomicU64,
}

impl MemoryDirectory {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of `list_users` pages served so far.
    #[must_use]
    pub fn list_calls(&self) -> u64 {
        self.list_calls.load(Ordering::SeqCst)
    }

    fn email_taken(users: &[DirectoryUser], email: &str, except: Option<Uuid>) -> bool {
        users
            .iter()
            .any(|u| Some(u.id) != except && u.email.eq_ignore_ascii_case(email))
    }
}

fn apply(user: &mut DirectoryUser, attrs: UserAttributes) {
    if let Some(email) = attrs.email {
        user.email = email;
    }
    if let Some(phone) = attrs.phone {
        user.phone = Some(phone).filter(|p| !p.is_empty());
    }
    if let Some(confirm) = attrs.email_confirm {
        user.email_confirmed_at = confirm.then(Utc::now);
    }
    if let Some(metadata) = attrs.user_metadata {
        user.user_metadata.extend(metadata);
    }
}

#[async_trait]
impl DirectoryClient for MemoryDirectory {
    async fn create_user(&self, attrs: UserAttributes) -> Result<DirectoryUser, BackendError> {
        let Some(email) = attrs.email.clone().filter(|e| !e.trim().is_empty()) else {
            return Err(BackendError::Rejected("email is required".to_owned()));
        };
        let mut users = self.users.write();
        if Self::email_taken(&users, &email, None) {
            return Err(BackendError::UniqueViolation {
                constraint: "users_email_key".to_owned(),
            });
        }
        let now = Utc::now();
        let mut user = DirectoryUser {
            id: Uuid::new_v4(),
            email,
            phone: None,
            email_confirmed_at: None,
            user_metadata: serde_json::Map::new(),
            created_at: now,
            updated_at: now,
            last_sign_in_at: None,
        };
        apply(&mut user, attrs);
        users.push(user.clone());
        Ok(user)
    }

    async fn get_user(&self, id: Uuid) -> Result<DirectoryUser, BackendError> {
        self.users
            .read()
            .iter()
            .find(|u| u.id == id)
            .cloned()
            .ok_or(BackendError::NotFound)
    }

    async fn update_user(
        &self,
        id: Uuid,
        attrs: UserAttributes,
    ) -> Result<DirectoryUser, BackendError> {
        let mut users = self.users.write();
        if let Some(email) = attrs.email.as_deref()
            && Self::email_taken(&users, email, Some(id))
        {
            return Err(BackendError::UniqueViolation {
                constraint: "users_email_key".to_owned(),
            });
        }
        let user = users
            .iter_mut()
            .find(|u| u.id == id)
            .ok_or(BackendError::NotFound)?;
        apply(user, attrs);
        user.updated_at = Utc::now();
        Ok(user.clone())
    }

    async fn delete_user(&self, id: Uuid) -> Result<(), BackendError> {
        let mut users = self.users.write();
        let before = users.len();
        users.retain(|u| u.id != id);
        if users.len() == before {
            return Err(BackendError::NotFound);
        }
        Ok(())
    }

    async fn list_users(&self, page: u32, per_page: u32) -> Result<DirectoryPage, BackendError> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        if page == 0 || per_page == 0 {
            return Err(BackendError::Rejected(
                "page and per_page start at 1".to_owned(),
            ));
        }
        let users = self.users.read();
        let start = (page as usize - 1).saturating_mul(per_page as usize);
        let slice = users
            .iter()
            .skip(start)
            .take(per_page as usize)
            .cloned()
            .collect();
        Ok(DirectoryPage {
            users: slice,
            total: Some(users.len() as u64),
        })
    }
}
