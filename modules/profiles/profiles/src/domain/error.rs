use profiles_sdk::ProfilesError;
use storekit::{ErrorKind, QueryError, RepoError, ValidationErrors};
use thiserror::Error;

/// Domain-specific errors using thiserror
#[derive(Error, Debug)]
pub enum DomainError {
    #[error("{entity} not found: {key}")]
    NotFound { entity: &'static str, key: String },

    #[error("{entity} conflict: {message}")]
    Conflict {
        entity: &'static str,
        message: String,
    },

    #[error(transparent)]
    Validation(#[from] ValidationErrors),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("storage unavailable: {0}")]
    Unavailable(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl DomainError {
    pub fn not_found(entity: &'static str, key: impl ToString) -> Self {
        Self::NotFound {
            entity,
            key: key.to_string(),
        }
    }

    pub fn conflict(entity: &'static str, message: impl Into<String>) -> Self {
        Self::Conflict {
            entity,
            message: message.into(),
        }
    }

    pub fn invalid(field: &str, rule: &'static str, message: impl Into<String>) -> Self {
        Self::Validation(ValidationErrors::single(field, rule, message))
    }

    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::Conflict { .. } => ErrorKind::Conflict,
            Self::Validation(_) | Self::InvalidInput(_) => ErrorKind::Validation,
            Self::Unavailable(_) => ErrorKind::Backend,
            Self::Internal(_) => ErrorKind::Internal,
        }
    }
}

impl From<RepoError> for DomainError {
    fn from(err: RepoError) -> Self {
        match err {
            RepoError::NotFound { entity, key } => Self::NotFound { entity, key },
            RepoError::Conflict { entity, message } => Self::Conflict { entity, message },
            RepoError::Validation(message) => Self::InvalidInput(message),
            e @ RepoError::Backend { .. } => Self::Unavailable(e.to_string()),
            RepoError::Internal(message) => Self::Internal(message),
            RepoError::Bulk { index, source } => match Self::from(*source) {
                Self::Conflict { entity, message } => Self::Conflict {
                    entity,
                    message: format!("element {index}: {message}"),
                },
                Self::InvalidInput(message) => {
                    Self::InvalidInput(format!("element {index}: {message}"))
                }
                other => other,
            },
        }
    }
}

impl From<QueryError> for DomainError {
    fn from(err: QueryError) -> Self {
        Self::InvalidInput(err.to_string())
    }
}

/// Convert domain errors to SDK errors for public API consumption.
impl From<DomainError> for ProfilesError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::NotFound { entity, key } => ProfilesError::not_found(entity, key),
            DomainError::Conflict { entity, message } => {
                ProfilesError::conflict(format!("{entity}: {message}"))
            }
            DomainError::Validation(errors) => ProfilesError::validation(errors.to_string()),
            DomainError::InvalidInput(message) => ProfilesError::validation(message),
            DomainError::Unavailable(message) => {
                tracing::warn!(%message, "storage unavailable");
                ProfilesError::unavailable()
            }
            DomainError::Internal(message) => {
                tracing::error!(%message, "internal error");
                ProfilesError::internal()
            }
        }
    }
}
