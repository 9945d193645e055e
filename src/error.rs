//! Error types for the Libris domain core

use thiserror::Error;

/// Main application error type
///
/// Every fallible registry or lifecycle operation returns one of these
/// through [`AppResult`] so callers can branch on the outcome instead of
/// unwinding. Lookups that merely probe for existence return `Option`.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Authentication failed: {0}")]
    Authentication(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    /// A state transition the loan state machine does not permit,
    /// e.g. reviving a record that was already returned.
    #[error("Invariant violation: {0}")]
    InvariantViolation(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<serde_json::Error> for AppError {
    fn from(e: serde_json::Error) -> Self {
        AppError::Storage(format!("Snapshot serialization failed: {}", e))
    }
}

/// Result type alias for application operations
pub type AppResult<T> = Result<T, AppError>;
