//! Error taxonomy shared by every repository adapter.

use thiserror::Error;

use crate::query::QueryError;
use crate::validate::ValidationErrors;

/// Coarse classification every repository failure maps into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Validation,
    NotFound,
    Conflict,
    Backend,
    Internal,
}

impl ErrorKind {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorKind::Validation => "validation",
            ErrorKind::NotFound => "not_found",
            ErrorKind::Conflict => "conflict",
            ErrorKind::Backend => "backend",
            ErrorKind::Internal => "internal",
        }
    }
}

/// Failure reported by a backend client.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BackendError {
    #[error("unique constraint '{constraint}' violated")]
    UniqueViolation { constraint: String },

    #[error("record not found")]
    NotFound,

    #[error("backend unavailable: {0}")]
    Unavailable(String),

    #[error("request rejected: {0}")]
    Rejected(String),

    #[error("malformed backend response: {0}")]
    Decode(String),
}

#[derive(Error, Debug)]
pub enum RepoError {
    #[error("{entity} not found: {key}")]
    NotFound { entity: &'static str, key: String },

    #[error("{entity} conflict: {message}")]
    Conflict {
        entity: &'static str,
        message: String,
    },

    #[error("validation failed: {0}")]
    Validation(String),

    #[error("backend error: {message}")]
    Backend {
        message: String,
        #[source]
        source: BackendError,
    },

    #[error("internal error: {0}")]
    Internal(String),

    #[error("element {index}: {source}")]
    Bulk {
        index: usize,
        #[source]
        source: Box<RepoError>,
    },
}

pub type RepoResult<T> = Result<T, RepoError>;

impl RepoError {
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

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Map a backend client failure into exactly one kind.
    #[must_use]
    pub fn from_backend(entity: &'static str, err: BackendError) -> Self {
        match err {
            BackendError::UniqueViolation { constraint } => Self::Conflict {
                entity,
                message: format!("duplicate value for {constraint}"),
            },
            BackendError::NotFound => Self::NotFound {
                entity,
                key: String::new(),
            },
            BackendError::Rejected(message) => Self::Validation(message),
            BackendError::Decode(message) => {
                Self::Internal(format!("cannot decode {entity}: {message}"))
            }
            err @ BackendError::Unavailable(_) => Self::Backend {
                message: format!("{entity} backend call failed"),
                source: err,
            },
        }
    }

    /// Tag the error with the position of the failing element of a bulk call.
    #[must_use]
    pub fn at_index(self, index: usize) -> Self {
        Self::Bulk {
            index,
            source: Box::new(self),
        }
    }

    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::Conflict { .. } => ErrorKind::Conflict,
            Self::Validation(_) => ErrorKind::Validation,
            Self::Backend { .. } => ErrorKind::Backend,
            Self::Internal(_) => ErrorKind::Internal,
            Self::Bulk { source, .. } => source.kind(),
        }
    }

    /// Index of the failing element for bulk errors.
    #[must_use]
    pub fn bulk_index(&self) -> Option<usize> {
        match self {
            Self::Bulk { index, .. } => Some(*index),
            _ => None,
        }
    }
}

impl From<QueryError> for RepoError {
    fn from(err: QueryError) -> Self {
        Self::Validation(err.to_string())
    }
}

impl From<ValidationErrors> for RepoError {
    fn from(err: ValidationErrors) -> Self {
        Self::Validation(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backend_failures_map_to_one_kind_each() {
        let cases = [
            (
                BackendError::UniqueViolation {
                    constraint: "badges_name_key".to_owned(),
                },
                ErrorKind::Conflict,
            ),
            (BackendError::NotFound, ErrorKind::NotFound),
            (BackendError::Unavailable("timeout".to_owned()), ErrorKind::Backend),
            (BackendError::Rejected("bad column".to_owned()), ErrorKind::Validation),
            (BackendError::Decode("eof".to_owned()), ErrorKind::Internal),
        ];
        for (err, kind) in cases {
            assert_eq!(RepoError::from_backend("badge", err).kind(), kind);
        }
    }

    #[test]
    fn bulk_errors_keep_kind_and_index() {
        let err = RepoError::conflict("badge", "name taken").at_index(2);
        assert_eq!(err.kind(), ErrorKind::Conflict);
        assert_eq!(err.bulk_index(), Some(2));
        assert_eq!(err.to_string(), "element 2: badge conflict: name taken");
    }

    #[test]
    fn query_errors_are_validation() {
        let err: RepoError = QueryError::EmptyField.into();
        assert_eq!(err.kind(), ErrorKind::Validation);
    }
}
