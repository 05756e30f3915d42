// Central Error Type for the Application

use crate::domain::{DomainError, FetchMode};
use crate::port::{ExtractorError, NavigationError, PersistError};
use thiserror::Error;

/// Application-level error type
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Domain error: {0}")]
    Domain(#[from] DomainError),

    #[error("Validation error: {0}")]
    Validation(String),

    /// No extractor registered for the (mode, category, source) triple.
    /// Raised before any execution context is acquired.
    #[error("Unsupported source: no {mode} extractor registered for {category}/{source_id}")]
    UnsupportedSource {
        mode: FetchMode,
        category: String,
        source_id: String,
    },

    #[error("Extraction failed: {0}")]
    Extraction(#[from] ExtractorError),

    #[error("Navigation failed: {0}")]
    Navigation(#[from] NavigationError),

    #[error("Run timed out after {0} ms")]
    Timeout(u64),

    #[error("Run cancelled")]
    Cancelled,

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("Service unavailable: {0}")]
    Unavailable(String),

    #[error("Persistence failed: {0}")]
    Persistence(#[from] PersistError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias using AppError
pub type Result<T> = std::result::Result<T, AppError>;
