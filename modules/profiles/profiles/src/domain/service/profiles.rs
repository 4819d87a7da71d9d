use std::sync::Arc;

use bytes::Bytes;
use chrono::Utc;
use profiles_sdk::{AvatarUpload, IdentityDocument, NewProfile, ProfilePatch, UserProfile};
use storekit::backend::BlobStore;
use storekit::{ListOptions, Page, QueryConfig, RepoError, Validate};
use tracing::{debug, info, instrument};
use uuid::Uuid;

use super::{BadgeAwarder, UsersService};
use crate::config::StorageConfig;
use crate::domain::error::DomainError;
use crate::domain::events::ProfileDomainEvent;
use crate::domain::merge::{overlay, overlay_opt};
use crate::domain::ports::EventPublisher;
use crate::domain::records::ProfileRecord;
use crate::domain::repos::ProfilesRepo;

/// Profiles of directory users, their avatars and identity verification.
pub struct ProfilesService {
    profiles: ProfilesRepo,
    users: Arc<UsersService>,
    blobs: Arc<dyn BlobStore>,
    storage: StorageConfig,
    query: QueryConfig,
    awarder: Arc<BadgeAwarder>,
    events: Arc<dyn EventPublisher<ProfileDomainEvent>>,
}

impl ProfilesService {
    #[must_use]
    pub fn new(
        profiles: ProfilesRepo,
        users: Arc<UsersService>,
        blobs: Arc<dyn BlobStore>,
        storage: StorageConfig,
        query: QueryConfig,
        awarder: Arc<BadgeAwarder>,
        events: Arc<dyn EventPublisher<ProfileDomainEvent>>,
    ) -> Self {
        Self {
            profiles,
            users,
            blobs,
            storage,
            query,
            awarder,
            events,
        }
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<UserProfile>, DomainError> {
        Ok(self
            .profiles
            .find_by_field("username", username.into())
            .await?
            .into_iter()
            .next())
    }

    /// Run the badge rules for `event`, then hand it to the publisher.
    async fn raise(&self, event: ProfileDomainEvent) {
        let outcomes = self.awarder.handle(&event).await;
        let granted = outcomes.iter().filter(|o| o.is_granted()).count();
        debug!(rules = outcomes.len(), granted, "profile event handled");
        self.events.publish(&event);
    }

    #[instrument(skip_all, fields(user_id = %new_profile.user_id))]
    pub async fn create_profile(&self, new_profile: NewProfile) -> Result<UserProfile, DomainError> {
        new_profile.validate()?;
        let user_id = new_profile.user_id;
        self.users.ensure_exists(user_id).await?;
        if !self
            .profiles
            .find_by_field("user_id", user_id.into())
            .await?
            .is_empty()
        {
            return Err(DomainError::conflict(
                "profile",
                "user already has a profile",
            ));
        }
        let record = ProfileRecord::from(new_profile);
        if self.find_by_username(&record.username).await?.is_some() {
            return Err(DomainError::conflict(
                "profile",
                format!("username '{}' is taken", record.username),
            ));
        }

        let profile = self.profiles.create(record).await?;
        info!(profile_id = %profile.id, "profile created");
        self.raise(ProfileDomainEvent::ProfileCreated {
            user_id,
            profile_id: profile.id,
            at: profile.created_at,
        })
        .await;
        Ok(profile)
    }

    #[instrument(skip(self))]
    pub async fn get_profile(&self, id: Uuid) -> Result<UserProfile, DomainError> {
        Ok(self.profiles.find_by_id(id).await?)
    }

    #[instrument(skip(self))]
    pub async fn get_profile_by_user(&self, user_id: Uuid) -> Result<UserProfile, DomainError> {
        self.profiles
            .find_by_field("user_id", user_id.into())
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| DomainError::not_found("profile", user_id))
    }

    #[instrument(skip(self, patch))]
    pub async fn update_profile(
        &self,
        id: Uuid,
        patch: ProfilePatch,
    ) -> Result<UserProfile, DomainError> {
        patch.validate()?;
        let current = self.profiles.find_by_id(id).await?;
        let mut record = ProfileRecord::from(current);
        let before = record.username.clone();
        overlay(&mut record.username, patch.username);
        overlay_opt(&mut record.full_name, patch.full_name);
        overlay_opt(&mut record.bio, patch.bio);
        overlay_opt(&mut record.location, patch.location);
        overlay_opt(&mut record.locale, patch.locale);

        if record.username != before
            && let Some(other) = self.find_by_username(&record.username).await?
            && other.id != id
        {
            return Err(DomainError::conflict(
                "profile",
                format!("username '{}' is taken", record.username),
            ));
        }
        Ok(self.profiles.update(id, record).await?)
    }

    #[instrument(skip(self))]
    pub async fn delete_profile(&self, id: Uuid) -> Result<(), DomainError> {
        self.profiles.delete(id).await?;
        info!("profile deleted");
        Ok(())
    }

    #[instrument(skip_all)]
    pub async fn list_profiles(&self, opts: ListOptions) -> Result<Page<UserProfile>, DomainError> {
        super::list_page(self.profiles.as_ref(), &self.query, opts).await
    }

    #[instrument(skip_all)]
    pub async fn search_profiles(
        &self,
        opts: ListOptions,
    ) -> Result<Page<UserProfile>, DomainError> {
        super::search_page(self.profiles.as_ref(), &self.query, opts).await
    }

    /* ---------- uploads ---------- */

    fn check_upload(
        &self,
        content_type: &str,
        allowed: &[String],
        bytes: &Bytes,
    ) -> Result<(), DomainError> {
        if !allowed.iter().any(|t| t.eq_ignore_ascii_case(content_type)) {
            return Err(DomainError::invalid(
                "content_type",
                "allowed",
                format!("content type '{content_type}' is not accepted"),
            ));
        }
        if bytes.len() > self.storage.max_upload_bytes {
            return Err(DomainError::invalid(
                "bytes",
                "max",
                format!(
                    "upload is {} bytes, the limit is {}",
                    bytes.len(),
                    self.storage.max_upload_bytes
                ),
            ));
        }
        Ok(())
    }

    async fn store(
        &self,
        bucket: &str,
        entity: &'static str,
        user_id: Uuid,
        content_type: &str,
        bytes: Bytes,
    ) -> Result<String, DomainError> {
        let path = format!("{user_id}/{}.{}", Uuid::now_v7(), extension_for(content_type));
        self.blobs
            .upload(bucket, &path, bytes, content_type)
            .await
            .map_err(|e| RepoError::from_backend(entity, e))?;
        debug!(%bucket, %path, "object stored");
        Ok(path)
    }

    /// Store a new avatar image and point the user's profile at it.
    #[instrument(skip(self, upload), fields(size = upload.bytes.len()))]
    pub async fn upload_avatar(
        &self,
        user_id: Uuid,
        upload: AvatarUpload,
    ) -> Result<UserProfile, DomainError> {
        upload.validate()?;
        self.check_upload(
            &upload.content_type,
            &self.storage.allowed_image_types,
            &upload.bytes,
        )?;
        let profile = self.get_profile_by_user(user_id).await?;

        let bucket = self.storage.avatars_bucket.as_str();
        let path = self
            .store(bucket, "avatar", user_id, &upload.content_type, upload.bytes)
            .await?;
        let id = profile.id;
        let mut record = ProfileRecord::from(profile);
        record.avatar_url = Some(self.blobs.public_url(bucket, &path));
        let updated = self.profiles.update(id, record).await?;
        info!(profile_id = %id, "avatar updated");
        Ok(updated)
    }

    /// Store an identity document and mark the user's profile verified.
    #[instrument(skip(self, document), fields(document_type = %document.document_type))]
    pub async fn verify_identity(
        &self,
        user_id: Uuid,
        document: IdentityDocument,
    ) -> Result<UserProfile, DomainError> {
        document.validate()?;
        self.check_upload(
            &document.content_type,
            &self.storage.allowed_document_types,
            &document.bytes,
        )?;
        let profile = self.get_profile_by_user(user_id).await?;
        if profile.is_verified {
            return Err(DomainError::conflict(
                "profile",
                "identity is already verified",
            ));
        }

        self.store(
            &self.storage.documents_bucket,
            "identity_document",
            user_id,
            &document.content_type,
            document.bytes,
        )
        .await?;

        let id = profile.id;
        let mut record = ProfileRecord::from(profile);
        record.is_verified = true;
        record.verified_at = Some(Utc::now());
        overlay_opt(&mut record.locale, document.locale);
        let updated = self.profiles.update(id, record).await?;
        info!(profile_id = %id, "identity verified");

        self.raise(ProfileDomainEvent::IdentityVerified {
            user_id,
            profile_id: id,
            locale: updated.locale.clone(),
            at: updated.verified_at.unwrap_or_else(Utc::now),
        })
        .await;
        Ok(updated)
    }
}

fn extension_for(content_type: &str) -> &'static str {
    match content_type.to_ascii_lowercase().as_str() {
        "image/jpeg" | "image/jpg" => "jpg",
        "image/png" => "png",
        "image/webp" => "webp",
        "image/gif" => "gif",
        "application/pdf" => "pdf",
        _ => "bin",
    }
}
