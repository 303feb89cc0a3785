//! # AppError
//!
//! Centralized error handling for the Complaint Box services.
//! Maps domain-specific failures to actionable error types.

use thiserror::Error;

/// The primary error type for all cb-core operations.
#[derive(Error, Debug)]
pub enum AppError {
    /// Resource not found (e.g., Complaint, User)
    #[error("{0} not found")]
    NotFound(&'static str),

    /// Validation failure (e.g., missing title, unknown status)
    #[error("{0}")]
    Validation(String),

    /// Missing or invalid credentials
    #[error("{0}")]
    Unauthorized(String),

    /// Authenticated, but not allowed (e.g., student calling an admin route)
    #[error("{0}")]
    Forbidden(String),

    /// Resource already exists (e.g., duplicate email)
    #[error("{0}")]
    Conflict(String),

    /// Infrastructure failure (e.g., DB down, hashing failure)
    #[error("internal service error: {0}")]
    Internal(String),
}

/// Port implementations may raise an `AppError` through `anyhow`; it is kept as is.
/// Anything else is an infrastructure failure.
impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        match err.downcast::<AppError>() {
            Ok(app) => app,
            Err(err) => AppError::Internal(format!("{err:#}")),
        }
    }
}


/// A specialized Result type for Complaint Box logic.
pub type Result<T> = std::result::Result<T, AppError>;
