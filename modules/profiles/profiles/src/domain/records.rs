//! Stored write records. Generated ids and timestamps are added by the
//! repository adapters.

use chrono::{DateTime, Utc};
use profiles_sdk::{Badge, NewBadge, NewProfile, NewUser, UserPatch, UserProfile};
use serde::Serialize;
use uuid::Uuid;

/// Full `profiles` row minus generated columns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProfileRecord {
    pub user_id: Uuid,
    pub username: String,
    pub full_name: Option<String>,
    pub bio: Option<String>,
    pub location: Option<String>,
    pub locale: Option<String>,
    pub avatar_url: Option<String>,
    pub is_verified: bool,
    pub verified_at: Option<DateTime<Utc>>,
}

impl From<NewProfile> for ProfileRecord {
    fn from(p: NewProfile) -> Self {
        Self {
            user_id: p.user_id,
            username: p.username.trim().to_owned(),
            full_name: p.full_name,
            bio: p.bio,
            location: p.location,
            locale: p.locale,
            avatar_url: None,
            is_verified: false,
            verified_at: None,
        }
    }
}

impl From<UserProfile> for ProfileRecord {
    fn from(p: UserProfile) -> Self {
        Self {
            user_id: p.user_id,
            username: p.username,
            full_name: p.full_name,
            bio: p.bio,
            location: p.location,
            locale: p.locale,
            avatar_url: p.avatar_url,
            is_verified: p.is_verified,
            verified_at: p.verified_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BadgeRecord {
    pub name: String,
    pub description: Option<String>,
    pub icon_url: Option<String>,
}

impl From<NewBadge> for BadgeRecord {
    fn from(b: NewBadge) -> Self {
        Self {
            name: b.name.trim().to_owned(),
            description: b.description,
            icon_url: b.icon_url,
        }
    }
}

impl From<Badge> for BadgeRecord {
    fn from(b: Badge) -> Self {
        Self {
            name: b.name,
            description: b.description,
            icon_url: b.icon_url,
        }
    }
}

/// A (user, badge) grant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GrantRecord {
    pub user_id: Uuid,
    pub badge_id: Uuid,
    pub awarded_at: DateTime<Utc>,
}

/// Directory write. `None` leaves the attribute untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserRecord {
    pub email: Option<String>,
    pub password: Option<String>,
    pub display_name: Option<String>,
    pub phone: Option<String>,
}

impl From<NewUser> for UserRecord {
    fn from(u: NewUser) -> Self {
        Self {
            email: Some(u.email.trim().to_owned()),
            password: Some(u.password),
            display_name: u.display_name,
            phone: u.phone,
        }
    }
}

impl From<UserPatch> for UserRecord {
    fn from(p: UserPatch) -> Self {
        use crate::domain::merge::present;
        Self {
            email: present(p.email).map(|e| e.trim().to_owned()),
            password: present(p.password),
            display_name: present(p.display_name),
            phone: present(p.phone),
        }
    }
}
