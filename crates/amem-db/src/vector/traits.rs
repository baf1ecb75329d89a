//! Vector index traits and core types.
//!
//! This module defines the core abstraction for vector storage backends.

use crate::error::DbResult;
use serde::{Deserialize, Serialize};

// ============================================================================
// VectorId
// ============================================================================

/// Unique identifier for a record in the index.
///
/// Memory notes use opaque string ids (UUIDs), so the index does too.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VectorId(pub String);

impl VectorId {
    /// Create a new vector ID.
    pub fn new(id: impl Into<String>) -> Self {
        VectorId(id.into())
    }

    /// Get the underlying ID value.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for VectorId {
    fn from(id: String) -> Self {
        VectorId(id)
    }
}

impl From<&str> for VectorId {
    fn from(id: &str) -> Self {
        VectorId(id.to_string())
    }
}

impl std::fmt::Display for VectorId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// VectorMetric
// ============================================================================

/// Distance metric for vector similarity search.
///
/// Every metric is reported as a *distance*: lower means more similar.
///
/// | Metric | Distance |
/// |---|---|
/// | `cosine` | `1 - cos(a, b)` (0 for identical direction, up to 2) |
/// | `dot` | `1 - a·b` |
/// | `l2` | squared Euclidean distance |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VectorMetric {
    /// Cosine distance (default).
    #[default]
    Cosine,
    /// Inner-product distance.
    Dot,
    /// Squared Euclidean (L2) distance.
    L2,
}

impl VectorMetric {
    /// Get the metric name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            VectorMetric::Cosine => "cosine",
            VectorMetric::Dot => "dot",
            VectorMetric::L2 => "l2",
        }
    }

    /// Distance between two vectors under this metric (lower is closer).
    pub fn distance(&self, a: &[f32], b: &[f32]) -> f32 {
        match self {
            VectorMetric::Cosine => 1.0 - cosine_similarity(a, b),
            VectorMetric::Dot => 1.0 - dot_product(a, b),
            VectorMetric::L2 => squared_euclidean(a, b),
        }
    }
}

impl std::fmt::Display for VectorMetric {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for VectorMetric {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "cosine" => Ok(VectorMetric::Cosine),
            "dot" | "ip" => Ok(VectorMetric::Dot),
            "l2" | "euclidean" => Ok(VectorMetric::L2),
            _ => Err(format!(
                "Unknown metric: '{}'. Use 'cosine', 'dot', or 'l2'.",
                s
            )),
        }
    }
}

// ============================================================================
// VectorInsert
// ============================================================================

/// A record to insert into the index.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VectorInsert {
    /// Unique identifier for this record.
    pub id: VectorId,

    /// The embedding vector.
    pub vector: Vec<f32>,

    /// Document text stored alongside the vector.
    #[serde(default)]
    pub document: String,

    /// JSON metadata map.
    #[serde(default)]
    pub metadata: serde_json::Value,
}

impl VectorInsert {
    /// Create a new insert with an empty document and metadata.
    pub fn new(id: impl Into<VectorId>, vector: Vec<f32>) -> Self {
        Self {
            id: id.into(),
            vector,
            document: String::new(),
            metadata: serde_json::Value::Null,
        }
    }

    /// Set the document text.
    pub fn with_document(mut self, document: impl Into<String>) -> Self {
        self.document = document.into();
        self
    }

    /// Set the metadata.
    pub fn with_metadata(mut self, metadata: serde_json::Value) -> Self {
        self.metadata = metadata;
        self
    }
}

// ============================================================================
// VectorSearchResult / VectorRecord
// ============================================================================

/// A single result from a nearest-neighbor query.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VectorSearchResult {
    /// Identifier of the matched record.
    pub id: VectorId,

    /// Distance to the query under the index metric (lower is closer).
    pub distance: f32,

    /// Stored document text.
    pub document: String,

    /// Stored metadata.
    pub metadata: serde_json::Value,
}

/// A record returned by point lookup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VectorRecord {
    /// Identifier of the record.
    pub id: VectorId,

    /// Stored document text.
    pub document: String,

    /// Stored metadata.
    pub metadata: serde_json::Value,
}

// ============================================================================
// VectorIndexBackend Trait
// ============================================================================

/// Core trait for vector index backends.
///
/// ## Implementation Notes
///
/// - Backends must be thread-safe (`Send + Sync`); reads may run concurrently.
/// - `query` returns results sorted by ascending distance.
/// - `insert` rejects ids that already exist.
/// - `update_metadata` replaces the metadata map and never touches the vector.
pub trait VectorIndexBackend: Send + Sync {
    /// Insert new records.
    fn insert(&self, records: &[VectorInsert]) -> DbResult<()>;

    /// Query the index for the `limit` nearest records.
    fn query(&self, embedding: &[f32], limit: usize) -> DbResult<Vec<VectorSearchResult>>;

    /// Fetch records by id. Unknown ids are skipped.
    fn get(&self, ids: &[VectorId]) -> DbResult<Vec<VectorRecord>>;

    /// Replace the metadata of an existing record.
    ///
    /// Returns [`DbError::RecordNotFound`](crate::DbError::RecordNotFound) if
    /// the id does not exist.
    fn update_metadata(&self, id: &VectorId, metadata: serde_json::Value) -> DbResult<()>;

    /// Delete records by id. Unknown ids are ignored.
    fn delete(&self, ids: &[VectorId]) -> DbResult<()>;

    /// Flush pending writes to persistent storage.
    fn flush(&self) -> DbResult<()>;

    /// Get the number of records in the index.
    fn len(&self) -> DbResult<usize>;

    /// Check if the index is empty.
    fn is_empty(&self) -> DbResult<bool> {
        Ok(self.len()? == 0)
    }

    /// Get the dimension of vectors in this index.
    fn dimension(&self) -> usize;

    /// Get the distance metric used by this index.
    fn metric(&self) -> VectorMetric;
}

// ============================================================================
// Similarity Functions
// ============================================================================

/// Compute cosine similarity between two vectors.
pub(crate) fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot / (norm_a * norm_b)
}

/// Compute dot product between two vectors.
pub(crate) fn dot_product(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b.iter()).map(|(x, y)| x * y).sum()
}

/// Compute squared Euclidean distance between two vectors.
pub(crate) fn squared_euclidean(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b.iter()).map(|(x, y)| (x - y).powi(2)).sum()
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vector_id() {
        let id = VectorId::new("note-1");
        assert_eq!(id.as_str(), "note-1");
        assert_eq!(id.to_string(), "note-1");

        let from_str: VectorId = "note-2".into();
        assert_eq!(from_str.as_str(), "note-2");
    }

    #[test]
    fn test_vector_metric() {
        assert_eq!(VectorMetric::Cosine.as_str(), "cosine");
        assert_eq!(VectorMetric::Dot.as_str(), "dot");
        assert_eq!(VectorMetric::L2.as_str(), "l2");
        assert_eq!(VectorMetric::default(), VectorMetric::Cosine);
        assert_eq!("ip".parse::<VectorMetric>().unwrap(), VectorMetric::Dot);
        assert!("manhattan".parse::<VectorMetric>().is_err());
    }

    #[test]
    fn test_cosine_distance() {
        let a = vec![1.0, 0.0, 0.0];
        assert!(VectorMetric::Cosine.distance(&a, &a).abs() < 1e-6);

        let orthogonal = vec![0.0, 1.0, 0.0];
        assert!((VectorMetric::Cosine.distance(&a, &orthogonal) - 1.0).abs() < 1e-6);

        let opposite = vec![-1.0, 0.0, 0.0];
        assert!((VectorMetric::Cosine.distance(&a, &opposite) - 2.0).abs() < 1e-6);
    }

    #[test]
    fn test_dot_distance() {
        let a = vec![1.0, 2.0, 3.0];
        let b = vec![4.0, 5.0, 6.0];
        assert!((VectorMetric::Dot.distance(&a, &b) - (1.0 - 32.0)).abs() < 1e-6);
    }

    #[test]
    fn test_l2_distance() {
        let a = vec![0.0, 0.0, 0.0];
        let b = vec![3.0, 4.0, 0.0];
        assert!((VectorMetric::L2.distance(&a, &b) - 25.0).abs() < 1e-6);
    }

    #[test]
    fn test_zero_vector_cosine() {
        let zero = vec![0.0, 0.0];
        let a = vec![1.0, 0.0];
        assert!((VectorMetric::Cosine.distance(&zero, &a) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_vector_insert_builder() {
        let insert = VectorInsert::new("note-1", vec![1.0, 2.0, 3.0])
            .with_document("Nick sold pawpsicles")
            .with_metadata(serde_json::json!({"context": "a hustle"}));

        assert_eq!(insert.id.as_str(), "note-1");
        assert_eq!(insert.document, "Nick sold pawpsicles");
        assert_eq!(insert.metadata["context"], "a hustle");
    }
}
