//! Error types for amem-db.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for amem-db operations.
pub type DbResult<T> = Result<T, DbError>;

/// Errors that can occur in amem-db operations.
#[derive(Debug, Error)]
pub enum DbError {
    // ========================================================================
    // Vector index errors
    // ========================================================================
    /// Vector index I/O error.
    #[error("Vector index I/O error at {path}: {message}")]
    VectorIo { path: PathBuf, message: String },

    /// Vector index parse error.
    #[error("Vector index parse error at {path}: {message}")]
    VectorParse { path: PathBuf, message: String },

    /// Vector dimension mismatch.
    #[error("Vector dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// Vector index not found.
    #[error("Vector index not found at {path}")]
    IndexNotFound { path: PathBuf },

    /// Vector index incompatible.
    #[error("Vector index incompatible for collection '{collection}': {reason}")]
    IndexIncompatible { collection: String, reason: String },

    // ========================================================================
    // Record errors
    // ========================================================================
    /// A record with this id already exists. Ids are never reused.
    #[error("Record '{id}' already exists")]
    DuplicateId { id: String },

    /// No record with this id.
    #[error("Record '{id}' not found")]
    RecordNotFound { id: String },

    // ========================================================================
    // General errors
    // ========================================================================
    /// Configuration error.
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// IO error wrapper.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error wrapper.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic internal error.
    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl DbError {
    /// Create a vector I/O error.
    pub fn vector_io(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::VectorIo {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create a vector parse error.
    pub fn vector_parse(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::VectorParse {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create an index incompatible error.
    pub fn index_incompatible(collection: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::IndexIncompatible {
            collection: collection.into(),
            reason: reason.into(),
        }
    }

    /// Create a record-not-found error.
    pub fn record_not_found(id: impl Into<String>) -> Self {
        Self::RecordNotFound { id: id.into() }
    }

    /// Create an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }
}
