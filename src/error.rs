use rusqlite::ErrorCode;
use thiserror::Error as ThisError;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, ThisError)]
pub enum Error {
    /// Malformed submission, rejected before it reaches the store.
    #[error("validation failed: {0}")]
    Validation(String),

    /// A uniqueness or referential failure the locking protocol should have
    /// prevented. Never retried.
    #[error("constraint violation: {0}")]
    ConstraintViolation(String),

    /// Busy/locked store, timeout or lost connectivity. The whole unit of
    /// work may be retried.
    #[error("transient store failure: {0}")]
    Transient(String),

    #[error("result mapping failed: {0}")]
    Mapping(String),

    #[error("invalid identifier: {0:?}")]
    InvalidIdentifier(String),

    #[error("store error: {0}")]
    Store(rusqlite::Error),

    #[error("internal error: {0}")]
    Internal(String),
}

impl Error {
    pub fn validation<M: Into<String>>(message: M) -> Self {
        Self::Validation(message.into())
    }

    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Transient(_))
    }

    /// Short machine-readable code used in HTTP error bodies.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation_error",
            Self::ConstraintViolation(_) => "constraint_violation",
            Self::Transient(_) => "store_unavailable",
            Self::Mapping(_) => "mapping_error",
            Self::InvalidIdentifier(_) => "invalid_identifier",
            Self::Store(_) => "store_error",
            Self::Internal(_) => "internal_error",
        }
    }
}

impl From<rusqlite::Error> for Error {
    fn from(err: rusqlite::Error) -> Self {
        let code = match &err {
            rusqlite::Error::SqliteFailure(failure, _) => Some(failure.code),
            _ => None,
        };

        match code {
            Some(ErrorCode::ConstraintViolation) => Self::ConstraintViolation(err.to_string()),
            Some(
                ErrorCode::DatabaseBusy
                | ErrorCode::DatabaseLocked
                | ErrorCode::CannotOpen
                | ErrorCode::SystemIoFailure,
            ) => Self::Transient(err.to_string()),
            _ => Self::Store(err),
        }
    }
}
