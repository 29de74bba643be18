//! Common error types for YaMDb

use thiserror::Error;

/// Common result type for YaMDb operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error taxonomy shared by the store, the auth flow and the HTTP layer
#[derive(Error, Debug)]
pub enum Error {
    /// Database operation error (wraps sqlx::Error)
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Bad or duplicate input: reserved usernames, wrong confirmation code,
    /// out-of-range year or score
    #[error("{0}")]
    Validation(String),

    /// Requested resource not found
    #[error("{0}")]
    NotFound(String),

    /// Actor is authenticated but a permission check failed
    #[error("{0}")]
    Forbidden(String),

    /// No actor, or the access token was rejected
    #[error("{0}")]
    Unauthorized(String),

    /// Uniqueness constraint on (title, author) violated
    #[error("{0}")]
    Conflict(String),

    /// Mail collaborator failed to dispatch a confirmation code
    #[error("Mail error: {0}")]
    Mail(String),

    /// Token signing failed
    #[error("Token error: {0}")]
    Token(String),

    /// Internal server error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// True if the wrapped database error is a UNIQUE constraint violation
    pub fn is_unique_violation(&self) -> bool {
        match self {
            Error::Database(sqlx::Error::Database(db_err)) => db_err.is_unique_violation(),
            _ => false,
        }
    }
}
