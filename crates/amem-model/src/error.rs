//! Error types for amem-model.
//!
//! Model discovery errors carry enough context to tell the user where models
//! were searched for and how to install them.

use std::path::PathBuf;
use thiserror::Error;

use crate::model_locator::AMEM_MODELS_DIR_ENV;

/// Result type alias for amem-model operations.
pub type ModelResult<T> = Result<T, ModelError>;

/// Errors that can occur in amem-model operations.
#[derive(Debug, Error)]
pub enum ModelError {
    // ========================================================================
    // Model discovery errors
    // ========================================================================
    /// No models directory found in any search location.
    #[error("{}", format_models_dir_not_found(.searched))]
    ModelsDirectoryNotFound { searched: Vec<PathBuf> },

    /// Model files not found at expected location.
    #[error("Model not found: {model_id}\n\nExpected at: {}\nThe directory must contain config.json, model.safetensors and tokenizer.json.", .path.display())]
    ModelNotFound { model_id: String, path: PathBuf },

    /// Model directory exists but is missing required files.
    #[error("Incomplete model installation at {}: missing {}", .path.display(), .missing.join(", "))]
    IncompleteModelFiles {
        path: PathBuf,
        missing: Vec<&'static str>,
    },

    // ========================================================================
    // Embedding errors
    // ========================================================================
    /// Failed to load model.
    #[error("Failed to load model '{model_id}': {message}")]
    ModelLoad { model_id: String, message: String },

    /// Architecture other than BERT.
    #[error("Unsupported architecture '{architecture}' for model '{model_id}'. Only BERT-family sentence transformers are supported.")]
    UnsupportedArchitecture {
        model_id: String,
        architecture: String,
    },

    /// Tokenization failed.
    #[error("Tokenization failed: {message}")]
    Tokenization { message: String },

    /// Embedding generation failed.
    #[error("Embedding failed for model '{model_id}': {message}")]
    EmbeddingFailed { model_id: String, message: String },

    /// Device not available.
    #[error("Compute device not available: {reason}\n\nSet `embedding.device: cpu` in ~/.amem/config.yaml to use CPU-only inference.")]
    DeviceNotAvailable { reason: String },

    // ========================================================================
    // Completion errors
    // ========================================================================
    /// The HTTP request did not complete.
    #[error("Completion request to {endpoint} failed: {message}")]
    CompletionRequest { endpoint: String, message: String },

    /// The service answered with a non-success status.
    #[error("Completion service returned {status}: {body}")]
    CompletionStatus { status: u16, body: String },

    /// The response carried no message content.
    #[error("Completion from model '{model_id}' had no content")]
    EmptyCompletion { model_id: String },

    // ========================================================================
    // Provider errors
    // ========================================================================
    /// Provider not available.
    #[error("Provider '{provider}' not available: {reason}")]
    ProviderNotAvailable { provider: String, reason: String },

    // ========================================================================
    // I/O errors
    // ========================================================================
    /// File I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

fn format_models_dir_not_found(searched: &[PathBuf]) -> String {
    let list = searched
        .iter()
        .enumerate()
        .map(|(i, p)| format!("  {}. {}", i + 1, p.display()))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "Models directory not found.\n\n\
        Searched:\n\
        {list}\n\n\
        Set ${AMEM_MODELS_DIR_ENV} or copy the model into ~/.amem/models/embeddings/."
    )
}

// ============================================================================
// Error constructors
// ============================================================================

impl ModelError {
    /// Create a model load error.
    pub fn model_load(model_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ModelLoad {
            model_id: model_id.into(),
            message: message.into(),
        }
    }

    /// Create an embedding failed error.
    pub fn embedding_failed(model_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self::EmbeddingFailed {
            model_id: model_id.into(),
            message: message.into(),
        }
    }

    /// Create a tokenization error.
    pub fn tokenization(message: impl Into<String>) -> Self {
        Self::Tokenization {
            message: message.into(),
        }
    }

    /// Create a completion request error.
    pub fn completion_request(endpoint: impl Into<String>, message: impl Into<String>) -> Self {
        Self::CompletionRequest {
            endpoint: endpoint.into(),
            message: message.into(),
        }
    }

    /// Whether the failure is likely transient (network or server side).
    pub fn is_transient(&self) -> bool {
        match self {
            Self::CompletionRequest { .. } => true,
            Self::CompletionStatus { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }
}
