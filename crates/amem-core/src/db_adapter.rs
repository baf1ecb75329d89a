//! Adapter layer for amem-db infrastructure.
//!
//! This module bridges amem-db implementations with amem-core's domain types.
//! It provides:
//!
//! - Error conversion from `DbError` to `AmemError`
//! - `DbVectorIndex`, which implements [`VectorIndex`] on top of an amem-db backend
//!
//! ## Architecture
//!
//! ```text
//! amem-core domain code (store, evolver)
//!        ↓
//!   db_adapter (this module) - wrapper + conversions
//!        ↓
//!     amem-db implementations (JSONL / in-memory vector storage)
//! ```

use std::sync::Arc;

use amem_db::vector::{
    open_vector_index, VectorId, VectorIndexBackend, VectorIndexConfig, VectorInsert,
};
use serde_json::Value;

use crate::errors::AmemError;
use crate::note::NoteId;
use crate::vector_index::{IndexEntry, IndexHit, IndexRecord, VectorIndex};

// ============================================================================
// Error Conversion
// ============================================================================

/// Convert an amem-db error to an amem-core error.
pub fn from_db_error(err: amem_db::DbError) -> AmemError {
    use amem_db::DbError;

    match err {
        DbError::Io(io_err) => AmemError::Io(io_err),

        DbError::VectorIo { path, message } => AmemError::VectorIndexIo { path, message },

        DbError::VectorParse { path, message } => AmemError::VectorIndexParse { path, message },

        DbError::DimensionMismatch { expected, actual } => {
            AmemError::DimensionMismatch { expected, actual }
        }

        DbError::IndexNotFound { path } => AmemError::VectorIndexIo {
            message: format!("Collection not found at {}", path.display()),
            path,
        },

        DbError::IndexIncompatible { collection, reason } => {
            AmemError::VectorIndexIncompatible { collection, reason }
        }

        DbError::DuplicateId { id } => AmemError::CommitFailed {
            id,
            reason: "a record with this id already exists".to_string(),
        },

        DbError::RecordNotFound { id } => AmemError::NoteNotFound(id),

        DbError::Config { message } => AmemError::InvalidConfig(message),

        DbError::Json(json_err) => AmemError::Json(json_err),

        DbError::Internal { message } => AmemError::Other(anyhow::anyhow!(message)),
    }
}

/// Extension trait to convert DbResult to Result<T, AmemError>.
pub trait IntoAmemResult<T> {
    /// Convert a DbResult to an AmemError result.
    fn into_amem_result(self) -> Result<T, AmemError>;
}

impl<T> IntoAmemResult<T> for amem_db::DbResult<T> {
    fn into_amem_result(self) -> Result<T, AmemError> {
        self.map_err(from_db_error)
    }
}

// ============================================================================
// Vector Index Wrapper
// ============================================================================

/// Wrapper around an amem-db vector index for amem-core.
///
/// amem-db backends lock internally, so every operation takes `&self`.
pub struct DbVectorIndex {
    inner: Arc<dyn VectorIndexBackend>,
    collection: String,
}

impl std::fmt::Debug for DbVectorIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DbVectorIndex")
            .field("collection", &self.collection)
            .field("dimension", &self.inner.dimension())
            .field("metric", &self.inner.metric())
            .finish()
    }
}

impl DbVectorIndex {
    /// Create a new wrapper from an amem-db backend.
    pub fn new(backend: Arc<dyn VectorIndexBackend>, collection: impl Into<String>) -> Self {
        Self {
            inner: backend,
            collection: collection.into(),
        }
    }

    /// Open (or create) a collection using amem-db configuration.
    pub fn open(config: &VectorIndexConfig) -> Result<Self, AmemError> {
        let backend = open_vector_index(config).into_amem_result()?;
        Ok(Self::new(backend, config.collection()))
    }

    /// Collection name, e.g. `amem_Judy`.
    pub fn collection(&self) -> &str {
        &self.collection
    }

    /// Get the underlying amem-db backend.
    pub fn inner(&self) -> &dyn VectorIndexBackend {
        self.inner.as_ref()
    }
}

fn to_db_id(id: &NoteId) -> VectorId {
    VectorId::new(id.as_str())
}

impl VectorIndex for DbVectorIndex {
    fn insert(&self, record: IndexRecord) -> Result<(), AmemError> {
        let insert = VectorInsert::new(to_db_id(&record.id), record.embedding)
            .with_document(record.document)
            .with_metadata(record.metadata);
        self.inner.insert(&[insert]).into_amem_result()
    }

    fn query(&self, embedding: &[f32], k: usize) -> Result<Vec<IndexHit>, AmemError> {
        let results = self.inner.query(embedding, k).into_amem_result()?;
        Ok(results
            .into_iter()
            .map(|r| IndexHit {
                id: NoteId::new(r.id.0),
                document: r.document,
                metadata: r.metadata,
                distance: r.distance,
            })
            .collect())
    }

    fn get(&self, ids: &[NoteId]) -> Result<Vec<IndexEntry>, AmemError> {
        let db_ids: Vec<_> = ids.iter().map(to_db_id).collect();
        let records = self.inner.get(&db_ids).into_amem_result()?;
        Ok(records
            .into_iter()
            .map(|r| IndexEntry {
                id: NoteId::new(r.id.0),
                document: r.document,
                metadata: r.metadata,
            })
            .collect())
    }

    fn update_metadata(&self, id: &NoteId, metadata: Value) -> Result<(), AmemError> {
        self.inner
            .update_metadata(&to_db_id(id), metadata)
            .into_amem_result()
    }

    fn len(&self) -> Result<usize, AmemError> {
        self.inner.len().into_amem_result()
    }

    fn dimension(&self) -> usize {
        self.inner.dimension()
    }
}

// ============================================================================
// Tests
// ============================================================================
