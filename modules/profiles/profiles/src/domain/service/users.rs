use profiles_sdk::{NewUser, User, UserPatch};
use storekit::{ListOptions, Page, QueryConfig, Validate};
use tracing::{debug, info, instrument};
use uuid::Uuid;

use crate::domain::error::DomainError;
use crate::domain::records::UserRecord;
use crate::domain::repos::UsersRepo;

/// Directory-backed user accounts.
pub struct UsersService {
    repo: UsersRepo,
    query: QueryConfig,
}

impl UsersService {
    #[must_use]
    pub fn new(repo: UsersRepo, query: QueryConfig) -> Self {
        Self { repo, query }
    }

    async fn ensure_email_free(&self, email: &str, owner: Option<Uuid>) -> Result<(), DomainError> {
        let taken = self
            .repo
            .find_by_field("email", email.into())
            .await?
            .into_iter()
            .any(|u| Some(u.id) != owner);
        if taken {
            return Err(DomainError::conflict(
                "user",
                format!("email '{email}' is already registered"),
            ));
        }
        Ok(())
    }

    #[instrument(skip_all)]
    pub async fn create_user(&self, new_user: NewUser) -> Result<User, DomainError> {
        new_user.validate()?;
        self.ensure_email_free(new_user.email.trim(), None).await?;
        let user = self.repo.create(UserRecord::from(new_user)).await?;
        info!(user_id = %user.id, "user created");
        Ok(user)
    }

    #[instrument(skip(self))]
    pub async fn get_user(&self, id: Uuid) -> Result<User, DomainError> {
        Ok(self.repo.find_by_id(id).await?)
    }

    #[instrument(skip(self, patch))]
    pub async fn update_user(&self, id: Uuid, patch: UserPatch) -> Result<User, DomainError> {
        patch.validate()?;
        let current = self.repo.find_by_id(id).await?;
        let record = UserRecord::from(patch);
        if let Some(email) = record.email.as_deref()
            && !email.eq_ignore_ascii_case(&current.email)
        {
            self.ensure_email_free(email, Some(id)).await?;
        }
        let user = self.repo.update(id, record).await?;
        debug!("user updated");
        Ok(user)
    }

    #[instrument(skip(self))]
    pub async fn delete_user(&self, id: Uuid) -> Result<(), DomainError> {
        self.repo.delete(id).await?;
        info!("user deleted");
        Ok(())
    }

    /// Fails with `NotFound` unless the user exists. Guards every record that
    /// references a user.
    pub async fn ensure_exists(&self, id: Uuid) -> Result<(), DomainError> {
        if self.repo.exists(id).await? {
            Ok(())
        } else {
            Err(DomainError::not_found("user", id))
        }
    }

    #[instrument(skip_all)]
    pub async fn list_users(&self, opts: ListOptions) -> Result<Page<User>, DomainError> {
        super::list_page(self.repo.as_ref(), &self.query, opts).await
    }

    #[instrument(skip_all)]
    pub async fn search_users(&self, opts: ListOptions) -> Result<Page<User>, DomainError> {
        super::search_page(self.repo.as_ref(), &self.query, opts).await
    }
}
