//! Object-safe boundary of the profiles module, consumed as
//! `Arc<dyn ProfilesApi>`.

use async_trait::async_trait;
use storekit::{ListOptions, Page};
use uuid::Uuid;

use crate::errors::ProfilesError;
use crate::models::{
    AvatarUpload, Badge, BadgePatch, IdentityDocument, NewBadge, NewProfile, NewUser, ProfilePatch,
    User, UserBadge, UserPatch, UserProfile,
};

#[async_trait]
pub trait ProfilesApi: Send + Sync {
    // ==================== Users ====================

    async fn create_user(&self, new_user: NewUser) -> Result<User, ProfilesError>;

    async fn get_user(&self, id: Uuid) -> Result<User, ProfilesError>;

    async fn update_user(&self, id: Uuid, patch: UserPatch) -> Result<User, ProfilesError>;

    async fn delete_user(&self, id: Uuid) -> Result<(), ProfilesError>;

    async fn list_users(&self, opts: ListOptions) -> Result<Page<User>, ProfilesError>;

    async fn search_users(&self, opts: ListOptions) -> Result<Page<User>, ProfilesError>;

    // ==================== Profiles ====================

    /// Create the single profile of an existing user. Awards the profile
    /// creation badge as a side effect.
    async fn create_profile(&self, new_profile: NewProfile) -> Result<UserProfile, ProfilesError>;

    async fn get_profile(&self, id: Uuid) -> Result<UserProfile, ProfilesError>;

    async fn get_profile_by_user(&self, user_id: Uuid) -> Result<UserProfile, ProfilesError>;

    async fn update_profile(
        &self,
        id: Uuid,
        patch: ProfilePatch,
    ) -> Result<UserProfile, ProfilesError>;

    async fn delete_profile(&self, id: Uuid) -> Result<(), ProfilesError>;

    async fn list_profiles(&self, opts: ListOptions) -> Result<Page<UserProfile>, ProfilesError>;

    async fn search_profiles(&self, opts: ListOptions)
    -> Result<Page<UserProfile>, ProfilesError>;

    async fn upload_avatar(
        &self,
        user_id: Uuid,
        upload: AvatarUpload,
    ) -> Result<UserProfile, ProfilesError>;

    async fn verify_identity(
        &self,
        user_id: Uuid,
        document: IdentityDocument,
    ) -> Result<UserProfile, ProfilesError>;

    // ==================== Badges ====================

    async fn create_badge(&self, new_badge: NewBadge) -> Result<Badge, ProfilesError>;

    async fn get_badge(&self, id: Uuid) -> Result<Badge, ProfilesError>;

    async fn get_badge_by_name(&self, name: &str) -> Result<Badge, ProfilesError>;

    async fn update_badge(&self, id: Uuid, patch: BadgePatch) -> Result<Badge, ProfilesError>;

    async fn delete_badge(&self, id: Uuid) -> Result<(), ProfilesError>;

    async fn list_badges(&self, opts: ListOptions) -> Result<Page<Badge>, ProfilesError>;

    async fn search_badges(&self, opts: ListOptions) -> Result<Page<Badge>, ProfilesError>;

    /// Fails with `Conflict` when the user already holds the badge.
    async fn grant_badge(&self, user_id: Uuid, badge_id: Uuid)
    -> Result<UserBadge, ProfilesError>;

    async fn grant_badge_by_name(
        &self,
        user_id: Uuid,
        name: &str,
    ) -> Result<UserBadge, ProfilesError>;

    async fn list_user_badges(&self, user_id: Uuid) -> Result<Vec<UserBadge>, ProfilesError>;

    async fn has_badge(&self, user_id: Uuid, badge_id: Uuid) -> Result<bool, ProfilesError>;
}
