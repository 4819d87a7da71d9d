//! Public models of the profiles module.
//!
//! Read models carry generated ids and timestamps. Write models carry only
//! caller-provided fields and validate themselves.

use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use storekit::validate::{Rule, Validate, ValidationErrors, Validator};
use uuid::Uuid;

pub const USERNAME_RULES: &[Rule] = &[Rule::Min(3), Rule::Max(30)];
pub const DISPLAY_NAME_RULES: &[Rule] = &[Rule::Min(2), Rule::Max(64)];
pub const BADGE_NAME_RULES: &[Rule] = &[Rule::Min(2), Rule::Max(50)];
const LOCALE_RULES: &[Rule] = &[Rule::Min(2), Rule::Max(10)];
const URL_RULES: &[Rule] = &[Rule::Max(2048)];

/* ---------- users ---------- */

/// Directory-backed account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub display_name: Option<String>,
    pub phone: Option<String>,
    pub email_confirmed: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub last_sign_in_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewUser {
    pub email: String,
    pub password: String,
    pub display_name: Option<String>,
    pub phone: Option<String>,
}

impl Validate for NewUser {
    fn validate(&self) -> Result<(), ValidationErrors> {
        Validator::new()
            .field("email", &self.email, &[Rule::Required, Rule::Email])
            .field("password", &self.password, &[Rule::Required, Rule::Password])
            .field("display_name", &self.display_name, DISPLAY_NAME_RULES)
            .field("phone", &self.phone, &[Rule::Max(32)])
            .finish()
    }
}

/// Partial update; `None` and blank fields leave the stored value alone.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct UserPatch {
    pub email: Option<String>,
    pub password: Option<String>,
    pub display_name: Option<String>,
    pub phone: Option<String>,
}

impl Validate for UserPatch {
    fn validate(&self) -> Result<(), ValidationErrors> {
        Validator::new()
            .field("email", &self.email, &[Rule::Email])
            .field("password", &self.password, &[Rule::Password])
            .field("display_name", &self.display_name, DISPLAY_NAME_RULES)
            .field("phone", &self.phone, &[Rule::Max(32)])
            .finish()
    }
}

/* ---------- profiles ---------- */

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: Uuid,
    pub user_id: Uuid,
    pub username: String,
    pub full_name: Option<String>,
    pub bio: Option<String>,
    pub location: Option<String>,
    pub locale: Option<String>,
    pub avatar_url: Option<String>,
    #[serde(default)]
    pub is_verified: bool,
    pub verified_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewProfile {
    pub user_id: Uuid,
    pub username: String,
    pub full_name: Option<String>,
    pub bio: Option<String>,
    pub location: Option<String>,
    pub locale: Option<String>,
}

impl Validate for NewProfile {
    fn validate(&self) -> Result<(), ValidationErrors> {
        Validator::new()
            .field("user_id", &self.user_id, &[Rule::Required, Rule::Identifier])
            .field("username", &self.username, &[Rule::Required])
            .field("username", &self.username, USERNAME_RULES)
            .field("full_name", &self.full_name, &[Rule::Max(100)])
            .field("bio", &self.bio, &[Rule::Max(500)])
            .field("location", &self.location, &[Rule::Max(100)])
            .field("locale", &self.locale, LOCALE_RULES)
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ProfilePatch {
    pub username: Option<String>,
    pub full_name: Option<String>,
    pub bio: Option<String>,
    pub location: Option<String>,
    pub locale: Option<String>,
}

impl Validate for ProfilePatch {
    fn validate(&self) -> Result<(), ValidationErrors> {
        Validator::new()
            .field("username", &self.username, USERNAME_RULES)
            .field("full_name", &self.full_name, &[Rule::Max(100)])
            .field("bio", &self.bio, &[Rule::Max(500)])
            .field("location", &self.location, &[Rule::Max(100)])
            .field("locale", &self.locale, LOCALE_RULES)
            .finish()
    }
}

/// Image uploaded as a profile avatar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AvatarUpload {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Bytes,
}

impl Validate for AvatarUpload {
    fn validate(&self) -> Result<(), ValidationErrors> {
        Validator::new()
            .field("file_name", &self.file_name, &[Rule::Required, Rule::Max(255)])
            .field("content_type", &self.content_type, &[Rule::Required])
            .field("bytes", &self.bytes, &[Rule::Required])
            .finish()
    }
}

/// Identity document submitted for verification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentityDocument {
    pub document_type: String,
    /// Locale the document was issued for, copied onto the profile.
    pub locale: Option<String>,
    pub file_name: String,
    pub content_type: String,
    pub bytes: Bytes,
}

impl Validate for IdentityDocument {
    fn validate(&self) -> Result<(), ValidationErrors> {
        Validator::new()
            .field("document_type", &self.document_type, &[Rule::Required, Rule::Max(50)])
            .field("locale", &self.locale, LOCALE_RULES)
            .field("file_name", &self.file_name, &[Rule::Required, Rule::Max(255)])
            .field("content_type", &self.content_type, &[Rule::Required])
            .field("bytes", &self.bytes, &[Rule::Required])
            .finish()
    }
}

/* ---------- badges ---------- */

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Badge {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub icon_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewBadge {
    pub name: String,
    pub description: Option<String>,
    pub icon_url: Option<String>,
}

impl NewBadge {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            icon_url: None,
        }
    }

    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

impl Validate for NewBadge {
    fn validate(&self) -> Result<(), ValidationErrors> {
        Validator::new()
            .field("name", &self.name, &[Rule::Required])
            .field("name", &self.name, BADGE_NAME_RULES)
            .field("description", &self.description, &[Rule::Max(255)])
            .field("icon_url", &self.icon_url, URL_RULES)
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BadgePatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub icon_url: Option<String>,
}

impl Validate for BadgePatch {
    fn validate(&self) -> Result<(), ValidationErrors> {
        Validator::new()
            .field("name", &self.name, BADGE_NAME_RULES)
            .field("description", &self.description, &[Rule::Max(255)])
            .field("icon_url", &self.icon_url, URL_RULES)
            .finish()
    }
}

/// A badge held by a user. At most one per (user, badge) pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserBadge {
    pub id: Uuid,
    pub user_id: Uuid,
    pub badge_id: Uuid,
    pub awarded_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Joined badge, present when the lookup embeds it.
    #[serde(default)]
    pub badge: Option<Badge>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_user() -> NewUser {
        NewUser {
            email: "ada@example.com".to_owned(),
            password: "Engine#1843".to_owned(),
            display_name: None,
            phone: None,
        }
    }

    #[test]
    fn new_user_checks_every_field() {
        assert!(new_user().validate().is_ok());

        let err = NewUser {
            email: "ada".to_owned(),
            password: "weak".to_owned(),
            display_name: Some("A".to_owned()),
            phone: None,
        }
        .validate()
        .unwrap_err();
        assert!(err.has_field("email"));
        assert!(err.has_field("password"));
        assert!(err.has_field("display_name"));
        assert!(!err.has_field("phone"));
    }

    #[test]
    fn empty_patches_are_valid() {
        assert!(UserPatch::default().validate().is_ok());
        assert!(ProfilePatch::default().validate().is_ok());
        assert!(BadgePatch::default().validate().is_ok());
    }

    #[test]
    fn profile_requires_a_real_user_id() {
        let err = NewProfile {
            user_id: Uuid::nil(),
            username: "ada".to_owned(),
            full_name: None,
            bio: None,
            location: None,
            locale: Some("x".to_owned()),
        }
        .validate()
        .unwrap_err();
        assert_eq!(err.for_field("user_id")[0].rule, "required");
        assert_eq!(err.for_field("locale")[0].rule, "min");
    }

    #[test]
    fn empty_upload_is_rejected() {
        let err = AvatarUpload {
            file_name: "me.png".to_owned(),
            content_type: "image/png".to_owned(),
            bytes: Bytes::new(),
        }
        .validate()
        .unwrap_err();
        assert_eq!(err.errors().len(), 1);
        assert_eq!(err.errors()[0].field, "bytes");
    }

    #[test]
    fn user_badge_decodes_without_embed() {
        let json = serde_json::json!({
            "id": Uuid::new_v4(),
            "user_id": Uuid::new_v4(),
            "badge_id": Uuid::new_v4(),
            "awarded_at": "2024-05-01T10:00:00Z",
            "created_at": "2024-05-01T10:00:00Z",
            "updated_at": "2024-05-01T10:00:00.123456Z",
        });
        let grant: UserBadge = serde_json::from_value(json).unwrap();
        assert!(grant.badge.is_none());
    }
}
