//! Error types for amem-core.

use std::path::PathBuf;

use thiserror::Error;

/// Domain-specific errors for memory store operations.
///
/// Only a few of these ever escape `add_memory`: commit failures and a
/// failure to embed the new note. Completion and parse failures inside the
/// pipeline are logged and replaced with defaults.
#[derive(Error, Debug)]
pub enum AmemError {
    // -------------------------------------------------------------------------
    // Configuration
    // -------------------------------------------------------------------------
    /// Configuration file could not be read or parsed.
    #[error("Config invalid: {0}")]
    InvalidConfig(String),

    /// A configuration value is invalid.
    #[error("Invalid configuration: {message}. {hint}")]
    InvalidConfiguration {
        /// Description of the invalid configuration.
        message: String,
        /// Actionable hint on how to fix it.
        hint: String,
    },

    // -------------------------------------------------------------------------
    // Providers
    // -------------------------------------------------------------------------
    /// The embedding provider could not be created or used.
    #[error("Embedding provider `{provider}` unavailable: {reason}")]
    EmbeddingProviderUnavailable {
        /// Provider or model name.
        provider: String,
        /// Description of the failure.
        reason: String,
    },

    /// The completion provider failed to produce text.
    #[error("Completion provider `{provider}` failed: {reason}")]
    CompletionFailed {
        /// Provider or model name.
        provider: String,
        /// Description of the failure.
        reason: String,
    },

    // -------------------------------------------------------------------------
    // Vector index
    // -------------------------------------------------------------------------
    /// I/O failure in the vector index.
    #[error("Vector index I/O error at {path}: {message}")]
    VectorIndexIo {
        /// Collection or file path.
        path: PathBuf,
        /// Description of the failure.
        message: String,
    },

    /// Stored index data could not be parsed.
    #[error("Vector index parse error at {path}: {message}")]
    VectorIndexParse {
        /// Collection or file path.
        path: PathBuf,
        /// Description of the failure.
        message: String,
    },

    /// An existing collection does not match the requested settings.
    #[error("Vector index for `{collection}` is incompatible: {reason}")]
    VectorIndexIncompatible {
        /// Collection name.
        collection: String,
        /// Why it is incompatible.
        reason: String,
    },

    /// The configured vector index backend cannot be used.
    #[error("Vector index backend `{backend}` unavailable: {reason}")]
    VectorIndexBackendUnavailable {
        /// Backend name.
        backend: String,
        /// Description of the failure.
        reason: String,
    },

    /// A vector does not have the index dimension.
    #[error("Embedding dimension mismatch: index expects {expected}, got {actual}")]
    DimensionMismatch {
        /// Dimension of the index.
        expected: usize,
        /// Dimension of the offending vector.
        actual: usize,
    },

    // -------------------------------------------------------------------------
    // Notes
    // -------------------------------------------------------------------------
    /// No note with this id exists.
    #[error("Memory note `{0}` not found.")]
    NoteNotFound(String),

    /// The new note could not be written to the index.
    #[error("Failed to commit memory note `{id}`: {reason}")]
    CommitFailed {
        /// Id generated for the note.
        id: String,
        /// Description of the failure.
        reason: String,
    },

    /// An I/O error occurred.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML serialization/deserialization error.
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// A wrapped generic error.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl AmemError {
    /// Create a completion failure.
    pub fn completion_failed(provider: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::CompletionFailed {
            provider: provider.into(),
            reason: reason.into(),
        }
    }

    /// Create an invalid configuration error.
    pub fn invalid_configuration(message: impl Into<String>, hint: impl Into<String>) -> Self {
        Self::InvalidConfiguration {
            message: message.into(),
            hint: hint.into(),
        }
    }
}
