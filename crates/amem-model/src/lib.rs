//! # amem-model
//!
//! Inference layer for associative memory: sentence embeddings and chat
//! completions.
//!
//! - **Embedding models**: local Candle BERT sentence transformers
//! - **Completion models**: OpenAI-compatible chat completion APIs
//! - **Model locator**: runtime path resolution for embedding weights
//!
//! Test doubles live in the consuming crates; everything here talks to a real
//! model or service.
//!
//! ## Model Location
//!
//! Embedding models are searched in this order:
//! 1. `$AMEM_MODELS_DIR` environment variable
//! 2. `~/.amem/models` user directory
//! 3. `{exe_dir}/models` next to the binary
//!
//! ## Features
//!
//! - `embedded` (default): Local Candle inference with disk-based models
//! - `openai` (default): Blocking HTTP client for `/chat/completions`
//! - `metal` / `cuda`: GPU acceleration for Candle
//!
//! ## Usage
//!
//! ```ignore
//! use amem_model::{create_completion_model, create_embedding_model, CompletionRequest};
//!
//! let embedder = create_embedding_model(&EmbeddingConfig::default())?;
//! let vectors = embedder.embed(&["Judy became a police officer"])?;
//!
//! let completer = create_completion_model(&CompletionConfig::default())?;
//! let json = completer.complete(&CompletionRequest::new(prompt).structured())?;
//! ```

pub mod config;
pub mod error;
pub mod model_locator;

#[cfg(feature = "embedded")]
mod embedding;

#[cfg(feature = "openai")]
mod completion;

pub use error::{ModelError, ModelResult};

pub use config::{
    CompletionConfig, DevicePreference, EmbeddingConfig, EmbeddingProviderKind,
    HuggingFaceModelConfig, ModelArchitecture, ModelInfo, DEFAULT_API_KEY_ENV,
    DEFAULT_COMPLETION_BASE_URL,
};

pub use model_locator::{
    model_short_name, ModelLocator, AMEM_MODELS_DIR_ENV, DEFAULT_EMBEDDING_MODEL_NAME,
    EMBEDDINGS_SUBDIR, REQUIRED_MODEL_FILES,
};

/// Default embedding model (full Hugging Face id).
pub const DEFAULT_EMBEDDING_MODEL_ID: &str = "sentence-transformers/all-MiniLM-L6-v2";

/// Default completion model name.
pub const DEFAULT_COMPLETION_MODEL_ID: &str = "Qwen/Qwen2.5-7B-Instruct";

// ============================================================================
// Embedding Model Trait
// ============================================================================

/// Trait for embedding models (bi-encoders).
///
/// Implementations must be deterministic for identical input and return
/// L2-normalized vectors of length `dimension()`.
pub trait EmbeddingModel: Send + Sync + std::fmt::Debug {
    /// Generate embeddings for a batch of texts, one per input.
    fn embed(&self, texts: &[&str]) -> ModelResult<Vec<Vec<f32>>>;

    /// Embed a single text.
    fn embed_one(&self, text: &str) -> ModelResult<Vec<f32>> {
        self.embed(&[text])?
            .into_iter()
            .next()
            .ok_or_else(|| ModelError::embedding_failed(self.model_id(), "no embedding returned"))
    }

    /// Get the embedding dimension.
    fn dimension(&self) -> usize;

    /// Get the maximum sequence length supported.
    fn max_sequence_length(&self) -> usize;

    /// Get model information (ID, dimension, architecture).
    fn model_info(&self) -> &ModelInfo;

    /// Get the model ID.
    fn model_id(&self) -> &str {
        &self.model_info().model_id
    }
}

// ============================================================================
// Completion Model Trait
// ============================================================================

/// A single-turn completion request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompletionRequest {
    /// User prompt.
    pub prompt: String,

    /// System message. Falls back to the model's configured default.
    pub system_role: Option<String>,

    /// The caller expects machine-readable (JSON) output.
    pub structured: bool,
}

impl CompletionRequest {
    /// Create a free-form request.
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            system_role: None,
            structured: false,
        }
    }

    /// Set the system message.
    pub fn with_system_role(mut self, role: impl Into<String>) -> Self {
        self.system_role = Some(role.into());
        self
    }

    /// Mark the request as expecting structured output.
    pub fn structured(mut self) -> Self {
        self.structured = true;
        self
    }
}

/// Trait for chat completion models.
///
/// A structured request is only a hint; the returned text may still be
/// malformed.
pub trait CompletionModel: Send + Sync + std::fmt::Debug {
    /// Run one completion and return the assistant text.
    fn complete(&self, request: &CompletionRequest) -> ModelResult<String>;

    /// Get the model ID.
    fn model_id(&self) -> &str;
}

// ============================================================================
// Factory Functions
// ============================================================================

/// Create an embedding model from configuration.
///
/// # Errors
///
/// Returns `ModelError` if the model cannot be found or loaded.
#[cfg(feature = "embedded")]
pub fn create_embedding_model(config: &EmbeddingConfig) -> ModelResult<Box<dyn EmbeddingModel>> {
    match config.provider {
        EmbeddingProviderKind::Candle => Ok(Box::new(embedding::CandleEmbeddingModel::new(config)?)),
    }
}

#[cfg(not(feature = "embedded"))]
pub fn create_embedding_model(config: &EmbeddingConfig) -> ModelResult<Box<dyn EmbeddingModel>> {
    Err(ModelError::ProviderNotAvailable {
        provider: config.provider.to_string(),
        reason: "amem-model was built without the 'embedded' feature".to_string(),
    })
}

/// Create a completion model from configuration.
#[cfg(feature = "openai")]
pub fn create_completion_model(config: &CompletionConfig) -> ModelResult<Box<dyn CompletionModel>> {
    Ok(Box::new(completion::OpenAiCompletionModel::new(config)?))
}

#[cfg(not(feature = "openai"))]
pub fn create_completion_model(
    _config: &CompletionConfig,
) -> ModelResult<Box<dyn CompletionModel>> {
    Err(ModelError::ProviderNotAvailable {
        provider: "openai".to_string(),
        reason: "amem-model was built without the 'openai' feature".to_string(),
    })
}

#[cfg(feature = "embedded")]
pub use embedding::CandleEmbeddingModel;

#[cfg(feature = "openai")]
pub use completion::OpenAiCompletionModel;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_completion_request_builder() {
        let request = CompletionRequest::new("Summarize")
            .with_system_role("analyst")
            .structured();
        assert_eq!(request.prompt, "Summarize");
        assert_eq!(request.system_role.as_deref(), Some("analyst"));
        assert!(request.structured);

        let plain = CompletionRequest::new("Hello");
        assert!(!plain.structured);
        assert!(plain.system_role.is_none());
    }

    #[test]
    fn test_missing_model_is_reported() {
        let temp = tempfile::TempDir::new().unwrap();
        let config = EmbeddingConfig::default().with_local_path(temp.path().join("absent"));
        let err = create_embedding_model(&config).unwrap_err();
        assert!(matches!(
            err,
            ModelError::ModelNotFound { .. } | ModelError::ProviderNotAvailable { .. }
        ));
    }
}
