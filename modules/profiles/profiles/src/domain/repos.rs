//! Repository handles the services depend on.

use std::sync::Arc;

use profiles_sdk::{Badge, User, UserBadge, UserProfile};
use storekit::Repository;

use crate::domain::records::{BadgeRecord, GrantRecord, ProfileRecord, UserRecord};

pub type UsersRepo = Arc<dyn Repository<UserRecord, User>>;
pub type ProfilesRepo = Arc<dyn Repository<ProfileRecord, UserProfile>>;
pub type BadgesRepo = Arc<dyn Repository<BadgeRecord, Badge>>;
pub type GrantsRepo = Arc<dyn Repository<GrantRecord, UserBadge>>;
