//! Error types for the endpoint layer.

use crate::domain::Username;

/// Domain-level errors (business rule violations).
#[derive(Debug, thiserror::Error)]
pub enum DomainError {
    #[error("User already exists: {0}")]
    UserExists(Username),

    #[error("User not found: {0}")]
    UserNotFound(Username),

    #[error("Invalid username: {0}")]
    InvalidUsername(String),

    #[error("Password cannot be empty")]
    EmptyPassword,

    #[error("Invalid rate spec: {0}")]
    InvalidRateSpec(String),
}

/// Store-level errors (persistence and hashing failures).
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error("Credential file error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed credential file: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Password hashing failed: {0}")]
    Hashing(String),
}

/// Application-level errors (for HTTP responses).
///
/// Maps cleanly to HTTP status codes.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Incorrect username or password")]
    Unauthorized,

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<DomainError> for AppError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::UserExists(name) => {
                AppError::Conflict(format!("User already exists: {}", name))
            }
            DomainError::UserNotFound(name) => {
                AppError::NotFound(format!("User not found: {}", name))
            }
            e => AppError::BadRequest(e.to_string()),
        }
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Domain(e) => e.into(),
            StoreError::Io(e) => AppError::Internal(e.to_string()),
            StoreError::Serialization(e) => AppError::Internal(e.to_string()),
            StoreError::Hashing(e) => AppError::Internal(e),
        }
    }
}
