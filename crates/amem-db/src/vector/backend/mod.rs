//! Vector index backend implementations.
//!
//! ## Available Backends
//!
//! - `simple` (default): JSONL file per collection, linear scan
//! - `memory`: same engine without persistence, for tests and scratch agents

#[cfg(feature = "simple")]
mod simple;

#[cfg(feature = "simple")]
pub use simple::{SimpleFileVectorIndex, DATA_FILENAME};

use super::config::{
    check_index_compatibility, write_index_meta, VectorIndexCompatibility, VectorIndexConfig,
    VectorIndexMeta, MEMORY_BACKEND,
};
use super::traits::VectorIndexBackend;
use crate::error::{DbError, DbResult};
use std::sync::Arc;
use tracing::{debug, info};

/// Open a vector index with the given configuration.
///
/// This is the main factory function for creating vector index instances.
/// It will:
/// 1. Check if an existing collection is compatible
/// 2. Create a new collection if needed (and `create_if_missing` is true)
/// 3. Open the appropriate backend
///
/// # Errors
///
/// Returns an error if:
/// - The collection exists but is incompatible
/// - The backend is not supported
/// - The collection cannot be created or opened
pub fn open_vector_index(config: &VectorIndexConfig) -> DbResult<Arc<dyn VectorIndexBackend>> {
    debug!("Opening vector index at {:?}", config.path);

    let collection = config.collection();
    match check_index_compatibility(config) {
        VectorIndexCompatibility::Compatible => {}
        VectorIndexCompatibility::NotFound => {
            if !config.create_if_missing {
                return Err(DbError::IndexNotFound {
                    path: config.path.clone(),
                });
            }
            info!("Collection not found, creating new index at {:?}", config.path);
            std::fs::create_dir_all(&config.path)?;
            write_index_meta(&config.path, &VectorIndexMeta::from_config(config))?;
        }
        VectorIndexCompatibility::IncompatibleDimension { expected, actual } => {
            return Err(DbError::DimensionMismatch { expected, actual });
        }
        VectorIndexCompatibility::IncompatibleBackend { expected, actual } => {
            return Err(DbError::index_incompatible(
                collection,
                format!("Backend mismatch: expected '{}', found '{}'", expected, actual),
            ));
        }
        VectorIndexCompatibility::IncompatibleMetric { expected, actual } => {
            return Err(DbError::index_incompatible(
                collection,
                format!("Metric mismatch: expected '{}', found '{}'", expected, actual),
            ));
        }
        VectorIndexCompatibility::Corrupted(msg) => {
            return Err(DbError::index_incompatible(
                collection,
                format!("Index corrupted: {}", msg),
            ));
        }
    }

    match config.backend.as_str() {
        #[cfg(feature = "simple")]
        "simple" => Ok(Arc::new(SimpleFileVectorIndex::open(config)?)),

        #[cfg(feature = "simple")]
        MEMORY_BACKEND => Ok(Arc::new(SimpleFileVectorIndex::in_memory(
            config.dimension,
            config.metric,
        ))),

        backend => Err(DbError::Config {
            message: format!(
                "Unknown backend: '{}'. Available backends: {}",
                backend,
                available_backends().join(", ")
            ),
        }),
    }
}

/// Get a list of available backend names.
#[allow(clippy::vec_init_then_push)]
pub fn available_backends() -> Vec<&'static str> {
    let mut backends = Vec::new();

    #[cfg(feature = "simple")]
    {
        backends.push("simple");
        backends.push(MEMORY_BACKEND);
    }

    backends
}

// ============================================================================
// Tests
// ============================================================================
