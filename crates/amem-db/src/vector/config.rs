//! Vector index configuration, collection naming and on-disk metadata.

use super::traits::VectorMetric;
use crate::error::{DbError, DbResult};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

// ============================================================================
// Constants
// ============================================================================

/// Default backend name.
pub const DEFAULT_BACKEND: &str = "simple";

/// Backend name for the non-persistent index.
pub const MEMORY_BACKEND: &str = "memory";

/// Filename for index metadata.
pub const INDEX_META_FILENAME: &str = "index.meta.json";

/// Prefix for per-agent collection directories.
pub const COLLECTION_PREFIX: &str = "amem_";

/// Current on-disk schema version.
pub const SCHEMA_VERSION: u32 = 1;

// ============================================================================
// Collection naming
// ============================================================================

/// Build the collection name for an agent.
///
/// Every character outside `[A-Za-z0-9_-]` is replaced with `_`, so
/// `"Judy Hopps"` becomes `amem_Judy_Hopps`.
pub fn collection_name(agent_name: &str) -> String {
    let safe: String = agent_name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' || c == '-' {
                c
            } else {
                '_'
            }
        })
        .collect();
    format!("{}{}", COLLECTION_PREFIX, safe)
}

// ============================================================================
// VectorIndexConfig
// ============================================================================

/// Configuration for creating or opening a vector index.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VectorIndexConfig {
    /// Dimension of vectors in the index.
    pub dimension: usize,

    /// Path to the collection directory. Ignored by the `memory` backend.
    pub path: PathBuf,

    /// Backend to use (`simple` or `memory`).
    #[serde(default = "default_backend")]
    pub backend: String,

    /// Distance metric for similarity search.
    #[serde(default)]
    pub metric: VectorMetric,

    /// Whether to create the index if it doesn't exist.
    #[serde(default = "default_create_if_missing")]
    pub create_if_missing: bool,
}

fn default_backend() -> String {
    DEFAULT_BACKEND.to_string()
}

fn default_create_if_missing() -> bool {
    true
}

impl VectorIndexConfig {
    /// Create a new config with required fields.
    pub fn new(dimension: usize, path: impl Into<PathBuf>) -> Self {
        Self {
            dimension,
            path: path.into(),
            backend: DEFAULT_BACKEND.to_string(),
            metric: VectorMetric::Cosine,
            create_if_missing: true,
        }
    }

    /// Config for an agent's collection under a data root.
    pub fn for_agent(root: &Path, agent_name: &str, dimension: usize) -> Self {
        Self::new(dimension, root.join(collection_name(agent_name)))
    }

    /// Config for a non-persistent index.
    pub fn in_memory(dimension: usize) -> Self {
        Self::new(dimension, PathBuf::new()).with_backend(MEMORY_BACKEND)
    }

    /// Set the backend.
    pub fn with_backend(mut self, backend: impl Into<String>) -> Self {
        self.backend = backend.into();
        self
    }

    /// Set the distance metric.
    pub fn with_metric(mut self, metric: VectorMetric) -> Self {
        self.metric = metric;
        self
    }

    /// Set whether to create the index if missing.
    pub fn with_create_if_missing(mut self, create: bool) -> Self {
        self.create_if_missing = create;
        self
    }

    /// Whether this config describes a non-persistent index.
    pub fn is_in_memory(&self) -> bool {
        self.backend == MEMORY_BACKEND
    }

    /// The collection name (last path component).
    pub fn collection(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

// ============================================================================
// VectorIndexMeta
// ============================================================================

/// Metadata for a persisted vector index.
///
/// This is stored in `index.meta.json` alongside the index data.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VectorIndexMeta {
    /// Backend used for this index.
    pub backend: String,

    /// Dimension of vectors.
    pub dimension: usize,

    /// Distance metric.
    pub metric: VectorMetric,

    /// Schema version for future migrations.
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,

    /// Creation timestamp (ISO 8601).
    #[serde(default)]
    pub created_at: Option<String>,
}

fn default_schema_version() -> u32 {
    SCHEMA_VERSION
}

impl VectorIndexMeta {
    /// Create new metadata.
    pub fn new(backend: impl Into<String>, dimension: usize, metric: VectorMetric) -> Self {
        Self {
            backend: backend.into(),
            dimension,
            metric,
            schema_version: SCHEMA_VERSION,
            created_at: Some(chrono::Utc::now().to_rfc3339()),
        }
    }

    /// Metadata describing the given config.
    pub fn from_config(config: &VectorIndexConfig) -> Self {
        Self::new(&config.backend, config.dimension, config.metric)
    }
}

// ============================================================================
// VectorIndexCompatibility
// ============================================================================

/// Result of checking index compatibility.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VectorIndexCompatibility {
    /// Index is compatible and can be opened.
    Compatible,

    /// Index doesn't exist and should be created.
    NotFound,

    /// Index exists but has incompatible dimension.
    IncompatibleDimension { expected: usize, actual: usize },

    /// Index exists but uses a different backend.
    IncompatibleBackend { expected: String, actual: String },

    /// Index exists but uses a different metric.
    IncompatibleMetric {
        expected: VectorMetric,
        actual: VectorMetric,
    },

    /// Index metadata is corrupted or unreadable.
    Corrupted(String),
}

impl VectorIndexCompatibility {
    /// Check if the index is compatible.
    pub fn is_compatible(&self) -> bool {
        matches!(self, VectorIndexCompatibility::Compatible)
    }

    /// Check if the index doesn't exist.
    pub fn is_not_found(&self) -> bool {
        matches!(self, VectorIndexCompatibility::NotFound)
    }
}

// ============================================================================
// Helper Functions
// ============================================================================

/// Check if an existing index is compatible with the given config.
pub fn check_index_compatibility(config: &VectorIndexConfig) -> VectorIndexCompatibility {
    if config.is_in_memory() {
        return VectorIndexCompatibility::Compatible;
    }

    let meta_path = config.path.join(INDEX_META_FILENAME);

    if !meta_path.exists() {
        if config.path.is_dir() {
            let entries = config.path.read_dir().map(|rd| rd.count()).unwrap_or(0);
            if entries == 0 {
                return VectorIndexCompatibility::NotFound;
            }
            return VectorIndexCompatibility::Corrupted(
                "Collection directory exists but has no metadata".to_string(),
            );
        }
        return VectorIndexCompatibility::NotFound;
    }

    match load_index_meta(&config.path) {
        Ok(meta) => {
            if meta.dimension != config.dimension {
                return VectorIndexCompatibility::IncompatibleDimension {
                    expected: config.dimension,
                    actual: meta.dimension,
                };
            }

            if meta.backend != config.backend {
                return VectorIndexCompatibility::IncompatibleBackend {
                    expected: config.backend.clone(),
                    actual: meta.backend,
                };
            }

            if meta.metric != config.metric {
                return VectorIndexCompatibility::IncompatibleMetric {
                    expected: config.metric,
                    actual: meta.metric,
                };
            }

            VectorIndexCompatibility::Compatible
        }
        Err(e) => VectorIndexCompatibility::Corrupted(e.to_string()),
    }
}

/// Load index metadata from a collection directory.
pub fn load_index_meta(path: &Path) -> DbResult<VectorIndexMeta> {
    let meta_path = path.join(INDEX_META_FILENAME);
    debug!("Loading index metadata from {:?}", meta_path);

    let content = fs::read_to_string(&meta_path)
        .map_err(|e| DbError::vector_io(&meta_path, format!("Failed to read metadata: {}", e)))?;

    serde_json::from_str(&content)
        .map_err(|e| DbError::vector_parse(&meta_path, format!("Failed to parse metadata: {}", e)))
}

/// Write index metadata to a collection directory.
pub fn write_index_meta(path: &Path, meta: &VectorIndexMeta) -> DbResult<()> {
    let meta_path = path.join(INDEX_META_FILENAME);
    debug!("Writing index metadata to {:?}", meta_path);

    fs::create_dir_all(path)?;
    let content = serde_json::to_string_pretty(meta)?;
    fs::write(&meta_path, content)?;

    Ok(())
}

// ============================================================================
// Tests
// ============================================================================
