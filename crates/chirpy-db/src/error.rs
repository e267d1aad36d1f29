use thiserror::Error;

/// Failures surfaced by the store and its repositories.
#[derive(Debug, Error)]
pub enum DbError {
    #[error("store I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("store document is malformed: {0}")]
    Format(#[from] serde_json::Error),

    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Conflict(String),

    #[error("invalid email or password")]
    Auth,

    #[error("{0}")]
    Forbidden(String),

    #[error("{0} not found")]
    NotFound(String),

    #[error("password hashing failed: {0}")]
    Hash(String),

    #[error("store lock poisoned")]
    LockPoisoned,
}

pub type Result<T> = std::result::Result<T, DbError>;
