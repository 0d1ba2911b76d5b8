//! # AppError
//!
//! Centralized error handling for the Hall of Fame/Shame crates.
//! Store, codec and wrapper failures all surface through this type.

use thiserror::Error;

/// The primary error type for all hof-core operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AppError {
    /// Object not found (e.g., Submission, File) by kind and URI
    #[error("{0} not found with URI {1}")]
    NotFound(String, String),

    /// The object exists but does not conform to the requested schema
    #[error("schema mismatch: {0}")]
    SchemaMismatch(String),

    /// Malformed input (e.g., bad form field, invalid schema, bad actor name)
    #[error("validation error: {0}")]
    ValidationError(String),

    /// Missing session or writing someone else's object
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// Reading a file payload failed or produced nothing encodable
    #[error("file read failed: {0}")]
    FileRead(String),

    /// A stored file value could not be decoded back into bytes
    #[error("invalid data URL: {0}")]
    InvalidDataUrl(String),

    /// Infrastructure failure (e.g., snapshot write failed)
    #[error("internal service error: {0}")]
    Internal(String),
}

/// A specialized Result type for hall-of-fame logic.
pub type Result<T> = std::result::Result<T, AppError>;
