//! Vector index abstraction for memory notes.
//!
//! Each agent owns one collection of `(id, embedding, document, metadata)`
//! records. The document is the note content; the metadata map holds
//! context, keywords, tags, linked ids and the timestamp.
//!
//! The production implementation is [`DbVectorIndex`](crate::db_adapter::DbVectorIndex),
//! backed by `amem-db`.

use serde_json::Value;

use crate::errors::AmemError;
use crate::note::NoteId;

/// A record to insert.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexRecord {
    pub id: NoteId,
    pub embedding: Vec<f32>,
    pub document: String,
    pub metadata: Value,
}

/// A nearest-neighbor hit.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexHit {
    pub id: NoteId,
    pub document: String,
    pub metadata: Value,
    /// Lower is closer.
    pub distance: f32,
}

/// A record fetched by id.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexEntry {
    pub id: NoteId,
    pub document: String,
    pub metadata: Value,
}

/// Trait for vector index backends.
///
/// Implementations must be `Send + Sync`. Concurrent reads are fine; the
/// store assumes a single writer per collection.
pub trait VectorIndex: Send + Sync {
    /// Insert a new record. Fails if the id already exists.
    fn insert(&self, record: IndexRecord) -> Result<(), AmemError>;

    /// Up to `k` nearest records, ascending by distance.
    fn query(&self, embedding: &[f32], k: usize) -> Result<Vec<IndexHit>, AmemError>;

    /// Records for the given ids. Unknown ids are skipped.
    fn get(&self, ids: &[NoteId]) -> Result<Vec<IndexEntry>, AmemError>;

    /// Replace a record's metadata. The embedding and document are untouched.
    fn update_metadata(&self, id: &NoteId, metadata: Value) -> Result<(), AmemError>;

    /// Number of records.
    fn len(&self) -> Result<usize, AmemError>;

    /// Whether the collection holds no records.
    fn is_empty(&self) -> Result<bool, AmemError> {
        Ok(self.len()? == 0)
    }

    /// Dimension of stored vectors.
    fn dimension(&self) -> usize;
}
