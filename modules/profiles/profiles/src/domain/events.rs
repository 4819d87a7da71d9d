use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Transport-agnostic domain event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProfileDomainEvent {
    ProfileCreated {
        user_id: Uuid,
        profile_id: Uuid,
        at: DateTime<Utc>,
    },
    IdentityVerified {
        user_id: Uuid,
        profile_id: Uuid,
        locale: Option<String>,
        at: DateTime<Utc>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    ProfileCreated,
    IdentityVerified,
}

impl EventKind {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::ProfileCreated => "profile_created",
            Self::IdentityVerified => "identity_verified",
        }
    }
}

impl ProfileDomainEvent {
    #[must_use]
    pub fn kind(&self) -> EventKind {
        match self {
            Self::ProfileCreated { .. } => EventKind::ProfileCreated,
            Self::IdentityVerified { .. } => EventKind::IdentityVerified,
        }
    }

    #[must_use]
    pub fn user_id(&self) -> Uuid {
        match self {
            Self::ProfileCreated { user_id, .. } | Self::IdentityVerified { user_id, .. } => {
                *user_id
            }
        }
    }
}
