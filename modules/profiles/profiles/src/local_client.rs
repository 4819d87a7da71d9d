use std::sync::Arc;

use async_trait::async_trait;
use profiles_sdk::{
    AvatarUpload, Badge, BadgePatch, IdentityDocument, ListOptions, NewBadge, NewProfile, NewUser,
    Page, ProfilePatch, ProfilesApi, ProfilesError, User, UserBadge, UserPatch, UserProfile,
};
use uuid::Uuid;

use crate::domain::service::{BadgesService, ProfilesService, UsersService};

/// In-process [`ProfilesApi`] backed by the domain services.
pub struct LocalProfilesClient {
    users: Arc<UsersService>,
    profiles: Arc<ProfilesService>,
    badges: Arc<BadgesService>,
}

impl LocalProfilesClient {
    #[must_use]
    pub fn new(
        users: Arc<UsersService>,
        profiles: Arc<ProfilesService>,
        badges: Arc<BadgesService>,
    ) -> Self {
        Self {
            users,
            profiles,
            badges,
        }
    }
}

#[async_trait]
impl ProfilesApi for LocalProfilesClient {
    async fn create_user(&self, new_user: NewUser) -> Result<User, ProfilesError> {
        self.users.create_user(new_user).await.map_err(Into::into)
    }

    async fn get_user(&self, id: Uuid) -> Result<User, ProfilesError> {
        self.users.get_user(id).await.map_err(Into::into)
    }

    async fn update_user(&self, id: Uuid, patch: UserPatch) -> Result<User, ProfilesError> {
        self.users.update_user(id, patch).await.map_err(Into::into)
    }

    async fn delete_user(&self, id: Uuid) -> Result<(), ProfilesError> {
        self.users.delete_user(id).await.map_err(Into::into)
    }

    async fn list_users(&self, opts: ListOptions) -> Result<Page<User>, ProfilesError> {
        self.users.list_users(opts).await.map_err(Into::into)
    }

    async fn search_users(&self, opts: ListOptions) -> Result<Page<User>, ProfilesError> {
        self.users.search_users(opts).await.map_err(Into::into)
    }

    async fn create_profile(&self, new_profile: NewProfile) -> Result<UserProfile, ProfilesError> {
        self.profiles
            .create_profile(new_profile)
            .await
            .map_err(Into::into)
    }

    async fn get_profile(&self, id: Uuid) -> Result<UserProfile, ProfilesError> {
        self.profiles.get_profile(id).await.map_err(Into::into)
    }

    async fn get_profile_by_user(&self, user_id: Uuid) -> Result<UserProfile, ProfilesError> {
        self.profiles
            .get_profile_by_user(user_id)
            .await
            .map_err(Into::into)
    }

    async fn update_profile(
        &self,
        id: Uuid,
        patch: ProfilePatch,
    ) -> Result<UserProfile, ProfilesError> {
        self.profiles
            .update_profile(id, patch)
            .await
            .map_err(Into::into)
    }

    async fn delete_profile(&self, id: Uuid) -> Result<(), ProfilesError> {
        self.profiles.delete_profile(id).await.map_err(Into::into)
    }

    async fn list_profiles(&self, opts: ListOptions) -> Result<Page<UserProfile>, ProfilesError> {
        self.profiles.list_profiles(opts).await.map_err(Into::into)
    }

    async fn search_profiles(
        &self,
        opts: ListOptions,
    ) -> Result<Page<UserProfile>, ProfilesError> {
        self.profiles.search_profiles(opts).await.map_err(Into::into)
    }

    async fn upload_avatar(
        &self,
        user_id: Uuid,
        upload: AvatarUpload,
    ) -> Result<UserProfile, ProfilesError> {
        self.profiles
            .upload_avatar(user_id, upload)
            .await
            .map_err(Into::into)
    }

    async fn verify_identity(
        &self,
        user_id: Uuid,
        document: IdentityDocument,
    ) -> Result<UserProfile, ProfilesError> {
        self.profiles
            .verify_identity(user_id, document)
            .await
            .map_err(Into::into)
    }

    async fn create_badge(&self, new_badge: NewBadge) -> Result<Badge, ProfilesError> {
        self.badges.create_badge(new_badge).await.map_err(Into::into)
    }

    async fn get_badge(&self, id: Uuid) -> Result<Badge, ProfilesError> {
        self.badges.get_badge(id).await.map_err(Into::into)
    }

    async fn get_badge_by_name(&self, name: &str) -> Result<Badge, ProfilesError> {
        self.badges.get_badge_by_name(name).await.map_err(Into::into)
    }

    async fn update_badge(&self, id: Uuid, patch: BadgePatch) -> Result<Badge, ProfilesError> {
        self.badges.update_badge(id, patch).await.map_err(Into::into)
    }

    async fn delete_badge(&self, id: Uuid) -> Result<(), ProfilesError> {
        self.badges.delete_badge(id).await.map_err(Into::into)
    }

    async fn list_badges(&self, opts: ListOptions) -> Result<Page<Badge>, ProfilesError> {
        self.badges.list_badges(opts).await.map_err(Into::into)
    }

    async fn search_badges(&self, opts: ListOptions) -> Result<Page<Badge>, ProfilesError> {
        self.badges.search_badges(opts).await.map_err(Into::into)
    }

    async fn grant_badge(
        &self,
        user_id: Uuid,
        badge_id: Uuid,
    ) -> Result<UserBadge, ProfilesError> {
        self.badges
            .grant_badge(user_id, badge_id)
            .await
            .map_err(Into::into)
    }

    async fn grant_badge_by_name(
        &self,
        user_id: Uuid,
        name: &str,
    ) -> Result<UserBadge, ProfilesError> {
        self.badges
            .grant_badge_by_name(user_id, name)
            .await
            .map_err(Into::into)
    }

    async fn list_user_badges(&self, user_id: Uuid) -> Result<Vec<UserBadge>, ProfilesError> {
        self.badges
            .list_user_badges(user_id)
            .await
            .map_err(Into::into)
    }

    async fn has_badge(&self, user_id: Uuid, badge_id: Uuid) -> Result<bool, ProfilesError> {
        self.badges
            .has_badge(user_id, badge_id)
            .await
            .map_err(Into::into)
    }
}
