//! Simple vector index backend.
//!
//! Records live in an in-memory map and, unless the index was opened with the
//! `memory` backend, are mirrored to a JSONL file after every write. Search is
//! a linear scan, which is fine for a single agent's memory stream.

use super::super::config::VectorIndexConfig;
use super::super::traits::{
    VectorId, VectorIndexBackend, VectorInsert, VectorMetric, VectorRecord, VectorSearchResult,
};
use crate::error::{DbError, DbResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::{debug, trace};

/// Filename for the JSONL data file.
pub const DATA_FILENAME: &str = "records.jsonl";

/// A stored record.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoredRecord {
    id: String,
    vector: Vec<f32>,
    #[serde(default)]
    document: String,
    #[serde(default)]
    metadata: serde_json::Value,
}

impl From<&VectorInsert> for StoredRecord {
    fn from(insert: &VectorInsert) -> Self {
        Self {
            id: insert.id.as_str().to_string(),
            vector: insert.vector.clone(),
            document: insert.document.clone(),
            metadata: insert.metadata.clone(),
        }
    }
}

/// Simple vector index with optional JSONL persistence.
pub struct SimpleFileVectorIndex {
    /// Data file, `None` for a non-persistent index.
    data_path: Option<PathBuf>,

    /// Dimension of vectors.
    dimension: usize,

    /// Distance metric.
    metric: VectorMetric,

    /// Records keyed by id. Ordered so ties in distance resolve deterministically.
    records: RwLock<BTreeMap<String, StoredRecord>>,
}

impl SimpleFileVectorIndex {
    /// Open or create a file-backed index in `config.path`.
    pub fn open(config: &VectorIndexConfig) -> DbResult<Self> {
        debug!("Opening SimpleFileVectorIndex at {:?}", config.path);

        let data_path = config.path.join(DATA_FILENAME);
        let index = Self {
            data_path: Some(data_path.clone()),
            dimension: config.dimension,
            metric: config.metric,
            records: RwLock::new(BTreeMap::new()),
        };

        if data_path.exists() {
            index.load_from_file(&data_path)?;
        }

        Ok(index)
    }

    /// Create an empty index that is never written to disk.
    pub fn in_memory(dimension: usize, metric: VectorMetric) -> Self {
        Self {
            data_path: None,
            dimension,
            metric,
            records: RwLock::new(BTreeMap::new()),
        }
    }

    fn read(&self) -> DbResult<RwLockReadGuard<'_, BTreeMap<String, StoredRecord>>> {
        self.records
            .read()
            .map_err(|e| DbError::internal(format!("Failed to acquire read lock: {}", e)))
    }

    fn write(&self) -> DbResult<RwLockWriteGuard<'_, BTreeMap<String, StoredRecord>>> {
        self.records
            .write()
            .map_err(|e| DbError::internal(format!("Failed to acquire write lock: {}", e)))
    }

    /// Load records from a JSONL file.
    fn load_from_file(&self, path: &Path) -> DbResult<()> {
        debug!("Loading records from {:?}", path);

        let reader = BufReader::new(File::open(path)?);
        let mut records = self.write()?;

        for (line_num, line) in reader.lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }

            match serde_json::from_str::<StoredRecord>(&line) {
                Ok(stored) => {
                    records.insert(stored.id.clone(), stored);
                }
                Err(e) => {
                    debug!("Skipping invalid line {}: {}", line_num + 1, e);
                }
            }
        }

        debug!("Loaded {} records", records.len());
        Ok(())
    }

    /// Rewrite the data file from the given snapshot.
    ///
    /// Writes a sibling temp file, then renames it over the data file.
    fn persist(&self, records: &BTreeMap<String, StoredRecord>) -> DbResult<()> {
        let Some(data_path) = &self.data_path else {
            return Ok(());
        };

        let tmp_path = data_path.with_extension("jsonl.tmp");
        {
            let mut writer = BufWriter::new(File::create(&tmp_path)?);
            for stored in records.values() {
                serde_json::to_writer(&mut writer, stored)?;
                writer.write_all(b"\n")?;
            }
            writer.flush()?;
        }
        fs::rename(&tmp_path, data_path)
            .map_err(|e| DbError::vector_io(data_path, format!("Failed to replace data file: {}", e)))?;

        trace!("Persisted {} records", records.len());
        Ok(())
    }

    fn check_dimension(&self, vector: &[f32]) -> DbResult<()> {
        if vector.len() != self.dimension {
            return Err(DbError::DimensionMismatch {
                expected: self.dimension,
                actual: vector.len(),
            });
        }
        Ok(())
    }
}

impl VectorIndexBackend for SimpleFileVectorIndex {
    fn insert(&self, inserts: &[VectorInsert]) -> DbResult<()> {
        debug!("Inserting {} records", inserts.len());

        let mut records = self.write()?;

        // A rejected batch leaves the index unchanged.
        for (i, insert) in inserts.iter().enumerate() {
            self.check_dimension(&insert.vector)?;
            let repeated = inserts[..i].iter().any(|prev| prev.id == insert.id);
            if repeated || records.contains_key(insert.id.as_str()) {
                return Err(DbError::DuplicateId {
                    id: insert.id.to_string(),
                });
            }
        }

        let mut next = records.clone();
        for insert in inserts {
            let stored = StoredRecord::from(insert);
            next.insert(stored.id.clone(), stored);
        }

        self.persist(&next)?;
        *records = next;
        Ok(())
    }

    fn query(&self, embedding: &[f32], limit: usize) -> DbResult<Vec<VectorSearchResult>> {
        trace!("Querying SimpleFileVectorIndex, limit={}", limit);
        self.check_dimension(embedding)?;

        let records = self.read()?;

        let mut scored: Vec<(f32, &StoredRecord)> = records
            .values()
            .map(|r| (self.metric.distance(embedding, &r.vector), r))
            .collect();

        // Ascending distance; the stable sort keeps id order among ties.
        scored.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(std::cmp::Ordering::Equal));

        let results: Vec<VectorSearchResult> = scored
            .into_iter()
            .take(limit)
            .map(|(distance, stored)| VectorSearchResult {
                id: VectorId::new(stored.id.clone()),
                distance,
                document: stored.document.clone(),
                metadata: stored.metadata.clone(),
            })
            .collect();

        trace!("Found {} results", results.len());
        Ok(results)
    }

    fn get(&self, ids: &[VectorId]) -> DbResult<Vec<VectorRecord>> {
        let records = self.read()?;
        Ok(ids
            .iter()
            .filter_map(|id| records.get(id.as_str()))
            .map(|stored| VectorRecord {
                id: VectorId::new(stored.id.clone()),
                document: stored.document.clone(),
                metadata: stored.metadata.clone(),
            })
            .collect())
    }

    fn update_metadata(&self, id: &VectorId, metadata: serde_json::Value) -> DbResult<()> {
        debug!("Updating metadata for {}", id);

        let mut records = self.write()?;
        if !records.contains_key(id.as_str()) {
            return Err(DbError::record_not_found(id.as_str()));
        }

        let mut next = records.clone();
        if let Some(stored) = next.get_mut(id.as_str()) {
            stored.metadata = metadata;
        }

        self.persist(&next)?;
        *records = next;
        Ok(())
    }

    fn delete(&self, ids: &[VectorId]) -> DbResult<()> {
        debug!("Deleting {} records", ids.len());

        let mut records = self.write()?;
        let mut next = records.clone();
        for id in ids {
            next.remove(id.as_str());
        }

        self.persist(&next)?;
        *records = next;
        Ok(())
    }

    fn flush(&self) -> DbResult<()> {
        let records = self.read()?;
        self.persist(&records)
    }

    fn len(&self) -> DbResult<usize> {
        Ok(self.read()?.len())
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn metric(&self) -> VectorMetric {
        self.metric
    }
}

// ============================================================================
// Tests
// ============================================================================
