//! Configuration types for amem.
//!
//! [`MemoryConfig`] is the user-level configuration stored in
//! `~/.amem/config.yaml`. Every field has a default, so a missing file or an
//! empty one gives a working setup.

use std::fs;
use std::path::{Path, PathBuf};

use amem_db::vector::{available_backends, VectorIndexConfig, VectorMetric, DEFAULT_BACKEND};
use amem_model::{CompletionConfig, EmbeddingConfig};
use serde::{Deserialize, Serialize};

use crate::constants::{
    AMEM_HOME_DIR, ANALYSIS_SYSTEM_PROMPT, CONFIG_FILENAME, CONTEXT_FALLBACK_CHARS, DB_DIR,
    DEFAULT_NEIGHBOR_K, DEFAULT_RETRIEVE_K,
};
use crate::errors::AmemError;

/// Neighbor counts above this make the link and evolution prompts long.
const LARGE_NEIGHBOR_K: usize = 20;

// ============================================================================
// MemoryConfig
// ============================================================================

/// User-level configuration for memory stores.
///
/// # Example YAML
///
/// ```yaml
/// data_dir: /var/lib/amem
/// neighbor_k: 3
/// default_retrieve_k: 5
/// vector_index:
///   backend: simple
///   metric: cosine
/// embedding:
///   model_id: sentence-transformers/all-MiniLM-L6-v2
///   device: cpu
/// completion:
///   base_url: https://api-inference.modelscope.cn/v1
///   model: Qwen/Qwen2.5-7B-Instruct
///   api_key_env: AMEM_API_KEY
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryConfig {
    /// Root directory for per-agent collections. Defaults to `~/.amem/db`.
    #[serde(default)]
    pub data_dir: Option<PathBuf>,

    /// Neighbors fetched for linking and evolution during `add_memory`.
    #[serde(default = "default_neighbor_k")]
    pub neighbor_k: usize,

    /// Results returned by `retrieve_default`.
    #[serde(default = "default_retrieve_k")]
    pub default_retrieve_k: usize,

    /// Characters of content used as the context when analysis fails.
    #[serde(default = "default_context_fallback_chars")]
    pub context_fallback_chars: usize,

    /// System role sent with every analysis prompt.
    #[serde(default = "default_analysis_system_prompt")]
    pub analysis_system_prompt: String,

    /// Vector index backend and metric.
    #[serde(default)]
    pub vector_index: VectorIndexSettings,

    /// Local embedding model.
    #[serde(default)]
    pub embedding: EmbeddingConfig,

    /// OpenAI-compatible completion service.
    #[serde(default)]
    pub completion: CompletionConfig,
}

fn default_neighbor_k() -> usize {
    DEFAULT_NEIGHBOR_K
}

fn default_retrieve_k() -> usize {
    DEFAULT_RETRIEVE_K
}

fn default_context_fallback_chars() -> usize {
    CONTEXT_FALLBACK_CHARS
}

fn default_analysis_system_prompt() -> String {
    ANALYSIS_SYSTEM_PROMPT.to_string()
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            data_dir: None,
            neighbor_k: default_neighbor_k(),
            default_retrieve_k: default_retrieve_k(),
            context_fallback_chars: default_context_fallback_chars(),
            analysis_system_prompt: default_analysis_system_prompt(),
            vector_index: VectorIndexSettings::default(),
            embedding: EmbeddingConfig::default(),
            completion: CompletionConfig::default(),
        }
    }
}

impl MemoryConfig {
    /// Load the configuration from the default location (`~/.amem/config.yaml`).
    ///
    /// If the file does not exist, returns the defaults.
    ///
    /// # Errors
    ///
    /// Returns [`AmemError::InvalidConfig`] if the file exists but cannot be parsed.
    pub fn load_default() -> Result<Self, AmemError> {
        match Self::default_path() {
            Some(path) => Self::from_path(&path),
            None => {
                tracing::debug!("Could not determine home directory, using default config");
                Ok(Self::default())
            }
        }
    }

    /// Load the configuration from a specific path.
    ///
    /// If the file does not exist, returns the defaults.
    ///
    /// # Errors
    ///
    /// Returns [`AmemError::InvalidConfig`] if the file exists but cannot be parsed.
    /// Returns [`AmemError::InvalidConfiguration`] if validation fails.
    pub fn from_path(path: &Path) -> Result<Self, AmemError> {
        if !path.exists() {
            tracing::debug!("Config not found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path).map_err(|e| {
            AmemError::InvalidConfig(format!("Failed to read {}: {}", path.display(), e))
        })?;

        // An empty file parses as YAML null.
        let config: Self = if content.trim().is_empty() {
            Self::default()
        } else {
            serde_yaml::from_str(&content).map_err(|e| {
                AmemError::InvalidConfig(format!("Failed to parse {}: {}", path.display(), e))
            })?
        };

        for warning in config.validate()? {
            tracing::warn!("Config warning: {}", warning);
        }

        Ok(config)
    }

    /// Get the default config directory (`~/.amem`).
    pub fn default_dir() -> Option<PathBuf> {
        dirs::home_dir().map(|h| h.join(AMEM_HOME_DIR))
    }

    /// Get the default config file path (`~/.amem/config.yaml`).
    pub fn default_path() -> Option<PathBuf> {
        Self::default_dir().map(|d| d.join(CONFIG_FILENAME))
    }

    /// Root directory for per-agent collections.
    pub fn resolve_data_dir(&self) -> Result<PathBuf, AmemError> {
        if let Some(dir) = &self.data_dir {
            return Ok(dir.clone());
        }
        Self::default_dir()
            .map(|d| d.join(DB_DIR))
            .ok_or_else(|| {
                AmemError::invalid_configuration(
                    "Could not determine the home directory for the default data_dir",
                    "Set data_dir in the config file",
                )
            })
    }

    /// Index configuration for an agent's collection.
    pub fn index_config(
        &self,
        agent_name: &str,
        dimension: usize,
    ) -> Result<VectorIndexConfig, AmemError> {
        let root = self.resolve_data_dir()?;
        Ok(VectorIndexConfig::for_agent(&root, agent_name, dimension)
            .with_backend(&self.vector_index.backend)
            .with_metric(self.vector_index.metric))
    }

    /// Validate the configuration.
    ///
    /// Returns the first critical error as [`AmemError::InvalidConfiguration`].
    /// Non-fatal issues are returned as warnings for the caller to log.
    pub fn validate(&self) -> Result<Vec<String>, AmemError> {
        let mut warnings = Vec::new();

        if self.neighbor_k == 0 {
            return Err(AmemError::invalid_configuration(
                "neighbor_k cannot be 0",
                "Set neighbor_k to at least 1 (default: 3)",
            ));
        }

        if self.context_fallback_chars == 0 {
            return Err(AmemError::invalid_configuration(
                "context_fallback_chars cannot be 0",
                "Set context_fallback_chars to at least 1 (default: 50)",
            ));
        }

        let backends = available_backends();
        if !backends.iter().any(|b| *b == self.vector_index.backend) {
            return Err(AmemError::invalid_configuration(
                format!("Unknown vector_index.backend '{}'", self.vector_index.backend),
                format!("Use one of: {}", backends.join(", ")),
            ));
        }

        if self.neighbor_k > LARGE_NEIGHBOR_K {
            warnings.push(format!(
                "neighbor_k={} is large; link and evolution prompts will be long (recommended: 3-10)",
                self.neighbor_k
            ));
        }

        if self.default_retrieve_k == 0 {
            warnings.push("default_retrieve_k=0; retrieve_default will return nothing".to_string());
        }

        if self.analysis_system_prompt.trim().is_empty() {
            warnings.push(
                "analysis_system_prompt is empty; analysis prompts will be sent without a system role"
                    .to_string(),
            );
        }

        if self.completion.resolve_api_key().is_none() {
            warnings.push(format!(
                "No completion API key found in ${}; requests will be sent unauthenticated",
                self.completion.api_key_env
            ));
        }

        Ok(warnings)
    }
}

// ============================================================================
// VectorIndexSettings
// ============================================================================

/// Vector index backend selection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VectorIndexSettings {
    /// Backend name: `simple` (JSONL on disk) or `memory`.
    #[serde(default = "default_backend")]
    pub backend: String,

    /// Distance metric for new collections.
    #[serde(default)]
    pub metric: VectorMetric,
}

fn default_backend() -> String {
    DEFAULT_BACKEND.to_string()
}

impl Default for VectorIndexSettings {
    fn default() -> Self {
        Self {
            backend: default_backend(),
            metric: VectorMetric::default(),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
