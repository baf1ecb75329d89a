//! Adapter layer for amem-model infrastructure.
//!
//! This module bridges amem-model implementations with amem-core's domain
//! traits. It provides:
//!
//! - Error conversion from `ModelError` to `AmemError`
//! - `ModelEmbeddingProvider`, implementing [`EmbeddingProvider`]
//! - `ModelCompletionProvider`, implementing [`CompletionProvider`]
//!
//! ## Architecture
//!
//! ```text
//! amem-core domain code (store, constructor, linker, evolver)
//!        ↓
//!   model_adapter (this module) - wrappers + conversions
//!        ↓
//!     amem-model implementations (Candle embeddings, HTTP completions)
//! ```

use amem_model::{CompletionConfig, CompletionRequest, EmbeddingConfig};

use crate::completion::CompletionProvider;
use crate::embedding::EmbeddingProvider;
use crate::errors::AmemError;

// ============================================================================
// Error Conversion
// ============================================================================

/// Convert an amem-model error to an amem-core error.
pub fn from_model_error(err: amem_model::ModelError) -> AmemError {
    use amem_model::ModelError;

    match err {
        err @ ModelError::ModelsDirectoryNotFound { .. } => {
            AmemError::EmbeddingProviderUnavailable {
                provider: "model-locator".to_string(),
                reason: err.to_string(),
            }
        }

        ModelError::ModelNotFound { model_id, path } => AmemError::EmbeddingProviderUnavailable {
            provider: model_id,
            reason: format!("Model not found at {}", path.display()),
        },

        ModelError::IncompleteModelFiles { path, missing } => {
            AmemError::EmbeddingProviderUnavailable {
                provider: path.display().to_string(),
                reason: format!("Missing model files: {}", missing.join(", ")),
            }
        }

        ModelError::ModelLoad { model_id, message } => AmemError::EmbeddingProviderUnavailable {
            provider: model_id,
            reason: message,
        },

        ModelError::UnsupportedArchitecture {
            model_id,
            architecture,
        } => AmemError::EmbeddingProviderUnavailable {
            provider: model_id,
            reason: format!("Unsupported architecture '{}'", architecture),
        },

        ModelError::Tokenization { message } => AmemError::EmbeddingProviderUnavailable {
            provider: "tokenizer".to_string(),
            reason: message,
        },

        ModelError::EmbeddingFailed { model_id, message } => {
            AmemError::EmbeddingProviderUnavailable {
                provider: model_id,
                reason: message,
            }
        }

        ModelError::DeviceNotAvailable { reason } => AmemError::EmbeddingProviderUnavailable {
            provider: "device".to_string(),
            reason,
        },

        ModelError::CompletionRequest { endpoint, message } => {
            AmemError::completion_failed(endpoint, message)
        }

        ModelError::CompletionStatus { status, body } => {
            AmemError::completion_failed("chat-completions", format!("HTTP {}: {}", status, body))
        }

        ModelError::EmptyCompletion { model_id } => {
            AmemError::completion_failed(model_id, "response had no content")
        }

        ModelError::ProviderNotAvailable { provider, reason } => {
            AmemError::EmbeddingProviderUnavailable { provider, reason }
        }

        ModelError::Io(io_err) => AmemError::Io(io_err),

        ModelError::Json(json_err) => AmemError::Json(json_err),
    }
}

/// Extension trait to convert amem-model Result to Result<T, AmemError>.
pub trait IntoAmemResult<T> {
    /// Convert an amem-model result to an AmemError result.
    fn into_amem_result(self) -> Result<T, AmemError>;
}

impl<T> IntoAmemResult<T> for Result<T, amem_model::ModelError> {
    fn into_amem_result(self) -> Result<T, AmemError> {
        self.map_err(from_model_error)
    }
}

// ============================================================================
// Embedding Provider Wrapper
// ============================================================================

/// Wrapper around an amem-model embedding model for amem-core.
pub struct ModelEmbeddingProvider {
    inner: Box<dyn amem_model::EmbeddingModel>,
}

impl std::fmt::Debug for ModelEmbeddingProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelEmbeddingProvider")
            .field("model_id", &self.inner.model_id())
            .field("dimension", &self.inner.dimension())
            .finish()
    }
}

impl ModelEmbeddingProvider {
    /// Create a new wrapper from an amem-model embedding model.
    pub fn new(model: Box<dyn amem_model::EmbeddingModel>) -> Self {
        Self { inner: model }
    }

    /// Load the configured local model.
    pub fn from_config(config: &EmbeddingConfig) -> Result<Self, AmemError> {
        let model = amem_model::create_embedding_model(config).into_amem_result()?;
        Ok(Self::new(model))
    }
}

impl EmbeddingProvider for ModelEmbeddingProvider {
    fn name(&self) -> &str {
        self.inner.model_id()
    }

    fn dimension(&self) -> usize {
        self.inner.dimension()
    }

    fn embed(&self, text: &str) -> Result<Vec<f32>, AmemError> {
        self.inner.embed_one(text).into_amem_result()
    }
}

// ============================================================================
// Completion Provider Wrapper
// ============================================================================

/// Wrapper around an amem-model completion model for amem-core.
pub struct ModelCompletionProvider {
    inner: Box<dyn amem_model::CompletionModel>,
}

impl std::fmt::Debug for ModelCompletionProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelCompletionProvider")
            .field("model_id", &self.inner.model_id())
            .finish()
    }
}

impl ModelCompletionProvider {
    /// Create a new wrapper from an amem-model completion model.
    pub fn new(model: Box<dyn amem_model::CompletionModel>) -> Self {
        Self { inner: model }
    }

    /// Build the configured HTTP client.
    pub fn from_config(config: &CompletionConfig) -> Result<Self, AmemError> {
        let model = amem_model::create_completion_model(config).into_amem_result()?;
        Ok(Self::new(model))
    }
}

impl CompletionProvider for ModelCompletionProvider {
    fn name(&self) -> &str {
        self.inner.model_id()
    }

    fn complete(
        &self,
        prompt: &str,
        system_role: Option<&str>,
        structured: bool,
    ) -> Result<String, AmemError> {
        let mut request = CompletionRequest::new(prompt);
        if let Some(role) = system_role {
            request = request.with_system_role(role);
        }
        if structured {
            request = request.structured();
        }
        self.inner.complete(&request).into_amem_result()
    }
}

// ============================================================================
// Tests
// ============================================================================
