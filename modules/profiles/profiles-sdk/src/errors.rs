//! Public error type of the profiles module.
//!
//! Safe to hand to callers: backend and internal causes are reduced to a
//! generic message.

use thiserror::Error;

pub use storekit::ErrorKind;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProfilesError {
    #[error("{entity} not found: {key}")]
    NotFound { entity: String, key: String },

    #[error("Conflict: {message}")]
    Conflict { message: String },

    #[error("Validation error: {message}")]
    Validation { message: String },

    #[error("Storage temporarily unavailable")]
    Unavailable,

    #[error("Internal error")]
    Internal,
}

impl ProfilesError {
    pub fn not_found(entity: impl Into<String>, key: impl ToString) -> Self {
        Self::NotFound {
            entity: entity.into(),
            key: key.to_string(),
        }
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict {
            message: message.into(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    #[must_use]
    pub fn unavailable() -> Self {
        Self::Unavailable
    }

    #[must_use]
    pub fn internal() -> Self {
        Self::Internal
    }

    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::Conflict { .. } => ErrorKind::Conflict,
            Self::Validation { .. } => ErrorKind::Validation,
            Self::Unavailable => ErrorKind::Backend,
            Self::Internal => ErrorKind::Internal,
        }
    }
}
