use std::collections::HashSet;
use std::sync::Arc;

use chrono::Utc;
use profiles_sdk::{Badge, BadgePatch, NewBadge, UserBadge};
use storekit::{FilterOption, ListOptions, Page, QueryConfig, Validate, validate_all};
use tracing::{debug, info, instrument};
use uuid::Uuid;

use super::UsersService;
use crate::domain::error::DomainError;
use crate::domain::merge::{overlay, overlay_opt};
use crate::domain::records::{BadgeRecord, GrantRecord};
use crate::domain::repos::{BadgesRepo, GrantsRepo};

/// Badge catalogue and per-user grants.
pub struct BadgesService {
    badges: BadgesRepo,
    grants: GrantsRepo,
    users: Arc<UsersService>,
    query: QueryConfig,
}

impl BadgesService {
    #[must_use]
    pub fn new(
        badges: BadgesRepo,
        grants: GrantsRepo,
        users: Arc<UsersService>,
        query: QueryConfig,
    ) -> Self {
        Self {
            badges,
            grants,
            users,
            query,
        }
    }

    async fn find_by_name(&self, name: &str) -> Result<Option<Badge>, DomainError> {
        Ok(self
            .badges
            .find_by_field("name", name.trim().into())
            .await?
            .into_iter()
            .next())
    }

    /* ---------- catalogue ---------- */

    #[instrument(skip_all, fields(name = %new_badge.name))]
    pub async fn create_badge(&self, new_badge: NewBadge) -> Result<Badge, DomainError> {
        new_badge.validate()?;
        if self.find_by_name(&new_badge.name).await?.is_some() {
            return Err(DomainError::conflict(
                "badge",
                format!("badge '{}' already exists", new_badge.name.trim()),
            ));
        }
        let badge = self.badges.create(BadgeRecord::from(new_badge)).await?;
        info!(badge_id = %badge.id, "badge created");
        Ok(badge)
    }

    #[instrument(skip(self))]
    pub async fn get_badge(&self, id: Uuid) -> Result<Badge, DomainError> {
        Ok(self.badges.find_by_id(id).await?)
    }

    #[instrument(skip(self))]
    pub async fn get_badge_by_name(&self, name: &str) -> Result<Badge, DomainError> {
        self.find_by_name(name)
            .await?
            .ok_or_else(|| DomainError::not_found("badge", name.trim()))
    }

    #[instrument(skip(self, patch))]
    pub async fn update_badge(&self, id: Uuid, patch: BadgePatch) -> Result<Badge, DomainError> {
        patch.validate()?;
        let current = self.badges.find_by_id(id).await?;
        let mut record = BadgeRecord::from(current);
        let before = record.name.clone();
        overlay(&mut record.name, patch.name);
        overlay_opt(&mut record.description, patch.description);
        overlay_opt(&mut record.icon_url, patch.icon_url);

        if record.name != before
            && let Some(other) = self.find_by_name(&record.name).await?
            && other.id != id
        {
            return Err(DomainError::conflict(
                "badge",
                format!("badge '{}' already exists", record.name),
            ));
        }
        Ok(self.badges.update(id, record).await?)
    }

    /// Remove a badge together with every grant of it.
    #[instrument(skip(self))]
    pub async fn delete_badge(&self, id: Uuid) -> Result<(), DomainError> {
        if !self.badges.exists(id).await? {
            return Err(DomainError::not_found("badge", id));
        }
        let grant_ids: Vec<Uuid> = self
            .grants
            .find_by_field("badge_id", id.into())
            .await?
            .into_iter()
            .map(|g| g.id)
            .collect();
        if !grant_ids.is_empty() {
            self.grants.bulk_delete(&grant_ids).await?;
        }
        self.badges.delete(id).await?;
        info!(revoked = grant_ids.len(), "badge deleted");
        Ok(())
    }

    #[instrument(skip_all)]
    pub async fn list_badges(&self, opts: ListOptions) -> Result<Page<Badge>, DomainError> {
        super::list_page(self.badges.as_ref(), &self.query, opts).await
    }

    #[instrument(skip_all)]
    pub async fn search_badges(&self, opts: ListOptions) -> Result<Page<Badge>, DomainError> {
        super::search_page(self.badges.as_ref(), &self.query, opts).await
    }

    /// Create every badge whose name is not in the catalogue yet. Returns the
    /// badges that were created.
    #[instrument(skip_all, fields(requested = badges.len()))]
    pub async fn seed_badges(&self, badges: Vec<NewBadge>) -> Result<Vec<Badge>, DomainError> {
        validate_all(&badges)?;
        let mut seen = HashSet::new();
        let mut missing = Vec::new();
        for badge in badges {
            let name = badge.name.trim().to_owned();
            if !seen.insert(name.clone()) || self.find_by_name(&name).await?.is_some() {
                continue;
            }
            missing.push(BadgeRecord::from(badge));
        }
        if missing.is_empty() {
            return Ok(Vec::new());
        }
        let created = self.badges.bulk_create(missing).await?;
        info!(created = created.len(), "badges seeded");
        Ok(created)
    }

    /* ---------- grants ---------- */

    /// Grant a badge to a user. Fails with `Conflict` when the user already
    /// holds it.
    #[instrument(skip(self))]
    pub async fn grant_badge(&self, user_id: Uuid, badge_id: Uuid) -> Result<UserBadge, DomainError> {
        self.users.ensure_exists(user_id).await?;
        let badge = self.badges.find_by_id(badge_id).await?;
        if self.has_badge(user_id, badge_id).await? {
            return Err(DomainError::conflict(
                "user_badge",
                format!("user already holds badge '{}'", badge.name),
            ));
        }
        let mut grant = self
            .grants
            .create(GrantRecord {
                user_id,
                badge_id,
                awarded_at: Utc::now(),
            })
            .await?;
        if grant.badge.is_none() {
            grant.badge = Some(badge);
        }
        info!(grant_id = %grant.id, "badge granted");
        Ok(grant)
    }

    #[instrument(skip(self))]
    pub async fn grant_badge_by_name(
        &self,
        user_id: Uuid,
        name: &str,
    ) -> Result<UserBadge, DomainError> {
        let badge = self.get_badge_by_name(name).await?;
        self.grant_badge(user_id, badge.id).await
    }

    /// Every grant held by the user, each with its badge attached.
    #[instrument(skip(self))]
    pub async fn list_user_badges(&self, user_id: Uuid) -> Result<Vec<UserBadge>, DomainError> {
        let grants = self.grants.find_by_field("user_id", user_id.into()).await?;
        debug!(count = grants.len(), "user badges loaded");
        Ok(grants)
    }

    #[instrument(skip(self))]
    pub async fn has_badge(&self, user_id: Uuid, badge_id: Uuid) -> Result<bool, DomainError> {
        let held = self
            .grants
            .count(&[
                FilterOption::equal("user_id", user_id),
                FilterOption::equal("badge_id", badge_id),
            ])
            .await?;
        Ok(held > 0)
    }
}
