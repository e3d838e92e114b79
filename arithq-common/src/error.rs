//! Common error types for arithq

use crate::question::validator::ValidationFailure;
use thiserror::Error;

/// Common result type for arithq operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types across the arithq crates
#[derive(Error, Debug)]
pub enum Error {
    /// An import row or question string could not be broken into its fields
    #[error("Malformed line: {0}")]
    MalformedLine(String),

    /// A candidate record failed one or more validation checks
    #[error("Validation failed: {0}")]
    ValidationFailed(ValidationFailure),

    /// Record store operation error (wraps sqlx::Error)
    #[error("Store error: {0}")]
    Store(#[from] sqlx::Error),

    /// Request parameters did not identify a single question
    #[error("No question identity could be resolved from the request")]
    IdentityUnresolved,

    /// Requested resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Write collided with an existing record
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Invalid user input or request parameter
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Internal error (e.g. corrupt stored data)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<ValidationFailure> for Error {
    fn from(failure: ValidationFailure) -> Self {
        Error::ValidationFailed(failure)
    }
}
