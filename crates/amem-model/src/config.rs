//! Configuration types for amem-model.
//!
//! These are the canonical embedding and completion settings; `amem-core`
//! embeds them in its own `MemoryConfig` rather than redefining them.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::model_locator::{model_short_name, ModelLocator};
use crate::{DEFAULT_COMPLETION_MODEL_ID, DEFAULT_EMBEDDING_MODEL_ID};

// ============================================================================
// DevicePreference
// ============================================================================

/// Preference for compute device.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DevicePreference {
    /// Auto-select best device (GPU if available, else CPU).
    #[default]
    Auto,
    /// Force GPU (Metal on macOS, CUDA on Linux).
    Gpu,
    /// Force CPU only.
    Cpu,
}

impl std::fmt::Display for DevicePreference {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Auto => write!(f, "auto"),
            Self::Gpu => write!(f, "gpu"),
            Self::Cpu => write!(f, "cpu"),
        }
    }
}

impl std::str::FromStr for DevicePreference {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "auto" => Ok(Self::Auto),
            "gpu" | "metal" | "cuda" => Ok(Self::Gpu),
            "cpu" => Ok(Self::Cpu),
            _ => Err(format!(
                "Unknown device: '{}'. Use 'auto', 'gpu', or 'cpu'.",
                s
            )),
        }
    }
}

// ============================================================================
// ModelArchitecture / ModelInfo
// ============================================================================

/// Model architecture family, as read from `config.json`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelArchitecture {
    #[default]
    Bert,
    Roberta,
    Mpnet,
    Unknown,
}

impl std::fmt::Display for ModelArchitecture {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Bert => write!(f, "bert"),
            Self::Roberta => write!(f, "roberta"),
            Self::Mpnet => write!(f, "mpnet"),
            Self::Unknown => write!(f, "unknown"),
        }
    }
}

/// Information about a loaded embedding model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelInfo {
    /// Model identifier.
    pub model_id: String,
    /// Embedding dimension.
    pub dimension: usize,
    /// Maximum sequence length.
    pub max_seq_len: usize,
    /// Model architecture.
    #[serde(default)]
    pub architecture: ModelArchitecture,
}

impl ModelInfo {
    /// Create new model info.
    pub fn new(model_id: impl Into<String>, dimension: usize, max_seq_len: usize) -> Self {
        Self {
            model_id: model_id.into(),
            dimension,
            max_seq_len,
            architecture: ModelArchitecture::default(),
        }
    }

    /// Set architecture.
    pub fn with_architecture(mut self, arch: ModelArchitecture) -> Self {
        self.architecture = arch;
        self
    }
}

/// The subset of a Hugging Face `config.json` needed before loading weights.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HuggingFaceModelConfig {
    #[serde(default)]
    pub architectures: Vec<String>,
    #[serde(default)]
    pub hidden_size: usize,
    #[serde(default = "default_max_position")]
    pub max_position_embeddings: usize,
    #[serde(default)]
    pub model_type: String,
}

fn default_max_position() -> usize {
    512
}

impl HuggingFaceModelConfig {
    /// Infer the architecture, preferring `architectures` over `model_type`.
    pub fn infer_architecture(&self) -> ModelArchitecture {
        for arch in &self.architectures {
            let lower = arch.to_lowercase();
            if lower.contains("roberta") {
                return ModelArchitecture::Roberta;
            }
            if lower.contains("mpnet") {
                return ModelArchitecture::Mpnet;
            }
            if lower.contains("bert") {
                return ModelArchitecture::Bert;
            }
        }

        match self.model_type.to_lowercase().as_str() {
            "bert" => ModelArchitecture::Bert,
            "roberta" | "xlm-roberta" => ModelArchitecture::Roberta,
            "mpnet" => ModelArchitecture::Mpnet,
            _ => ModelArchitecture::Unknown,
        }
    }
}

// ============================================================================
// EmbeddingConfig
// ============================================================================

/// Embedding provider type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum EmbeddingProviderKind {
    /// Local Candle inference.
    #[default]
    Candle,
}

impl std::fmt::Display for EmbeddingProviderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Candle => write!(f, "candle"),
        }
    }
}

impl std::str::FromStr for EmbeddingProviderKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "candle" | "local" | "embedded" => Ok(Self::Candle),
            _ => Err(format!("Unknown embedding provider: '{}'. Use 'candle'.", s)),
        }
    }
}

/// Configuration for the embedding model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    /// Provider type.
    #[serde(default)]
    pub provider: EmbeddingProviderKind,

    /// Model ID (e.g., "sentence-transformers/all-MiniLM-L6-v2").
    #[serde(default = "default_embedding_model_id")]
    pub model_id: String,

    /// Device preference.
    #[serde(default)]
    pub device: DevicePreference,

    /// Explicit model directory. Overrides the locator search.
    #[serde(default)]
    pub local_path: Option<PathBuf>,

    /// Maximum sequence length in tokens.
    #[serde(default = "default_max_seq_len")]
    pub max_sequence_length: usize,
}

fn default_embedding_model_id() -> String {
    DEFAULT_EMBEDDING_MODEL_ID.to_string()
}

fn default_max_seq_len() -> usize {
    256
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: EmbeddingProviderKind::default(),
            model_id: default_embedding_model_id(),
            device: DevicePreference::default(),
            local_path: None,
            max_sequence_length: default_max_seq_len(),
        }
    }
}

impl EmbeddingConfig {
    /// Resolve the model directory.
    ///
    /// Uses `local_path` when set, otherwise the [`ModelLocator`] search
    /// order. When nothing is found, returns the path under
    /// `~/.amem/models/embeddings` where the model is expected, so callers
    /// can report it.
    pub fn effective_model_path(&self) -> PathBuf {
        if let Some(path) = &self.local_path {
            return path.clone();
        }

        ModelLocator::new()
            .embedding_model_path(&self.model_id)
            .unwrap_or_else(|_| {
                dirs::home_dir()
                    .unwrap_or_else(|| PathBuf::from("."))
                    .join(".amem")
                    .join("models")
                    .join(crate::model_locator::EMBEDDINGS_SUBDIR)
                    .join(model_short_name(&self.model_id))
            })
    }

    /// Set an explicit model directory.
    pub fn with_local_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.local_path = Some(path.into());
        self
    }

    /// Set the model ID.
    pub fn with_model_id(mut self, model_id: impl Into<String>) -> Self {
        self.model_id = model_id.into();
        self
    }
}

// ============================================================================
// CompletionConfig
// ============================================================================

/// Default OpenAI-compatible endpoint.
pub const DEFAULT_COMPLETION_BASE_URL: &str = "https://api-inference.modelscope.cn/v1";

/// Default environment variable holding the API key.
pub const DEFAULT_API_KEY_ENV: &str = "AMEM_API_KEY";

/// Configuration for the completion model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionConfig {
    /// Base URL of the OpenAI-compatible API; `/chat/completions` is appended.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Model name sent with each request.
    #[serde(default = "default_completion_model_id")]
    pub model: String,

    /// Environment variable to read the API key from.
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,

    /// API key given directly. Takes precedence over `api_key_env`.
    #[serde(default, skip_serializing)]
    pub api_key: Option<String>,

    /// System message used when a request does not carry its own.
    #[serde(default)]
    pub default_system_prompt: Option<String>,

    /// Sampling temperature for free-form requests.
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Sampling temperature for requests that expect structured output.
    #[serde(default = "default_structured_temperature")]
    pub structured_temperature: f32,

    /// Upper bound on generated tokens, if any.
    #[serde(default)]
    pub max_tokens: Option<u32>,

    /// Send `response_format: {"type": "json_object"}` on structured requests.
    #[serde(default)]
    pub json_response_format: bool,

    /// Request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Extra top-level fields merged into every request body.
    #[serde(default = "default_extra_body")]
    pub extra_body: serde_json::Map<String, serde_json::Value>,
}

fn default_base_url() -> String {
    DEFAULT_COMPLETION_BASE_URL.to_string()
}

fn default_completion_model_id() -> String {
    DEFAULT_COMPLETION_MODEL_ID.to_string()
}

fn default_api_key_env() -> String {
    DEFAULT_API_KEY_ENV.to_string()
}

fn default_temperature() -> f32 {
    0.7
}

fn default_structured_temperature() -> f32 {
    0.1
}

fn default_timeout_secs() -> u64 {
    60
}

fn default_extra_body() -> serde_json::Map<String, serde_json::Value> {
    let mut extra = serde_json::Map::new();
    extra.insert("enable_thinking".to_string(), serde_json::Value::Bool(false));
    extra
}

impl Default for CompletionConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            model: default_completion_model_id(),
            api_key_env: default_api_key_env(),
            api_key: None,
            default_system_prompt: None,
            temperature: default_temperature(),
            structured_temperature: default_structured_temperature(),
            max_tokens: None,
            json_response_format: false,
            timeout_secs: default_timeout_secs(),
            extra_body: default_extra_body(),
        }
    }
}

impl CompletionConfig {
    /// Full URL of the chat completions endpoint.
    pub fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url.trim_end_matches('/'))
    }

    /// API key from the config or the configured environment variable.
    pub fn resolve_api_key(&self) -> Option<String> {
        self.api_key
            .clone()
            .filter(|k| !k.is_empty())
            .or_else(|| std::env::var(&self.api_key_env).ok())
            .filter(|k| !k.is_empty())
    }

    /// Set the base URL.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Set the model name.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Set the API key directly.
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    /// Set the default system prompt.
    pub fn with_default_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.default_system_prompt = Some(prompt.into());
        self
    }
}
