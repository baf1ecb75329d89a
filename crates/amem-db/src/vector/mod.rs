//! Vector index module for amem-db.
//!
//! Stores `(id, vector, document, metadata)` records per agent collection and
//! answers nearest-neighbor queries, point lookups and in-place metadata
//! updates.
//!
//! ## Usage
//!
//! ```ignore
//! use amem_db::vector::{VectorIndexConfig, VectorInsert, open_vector_index};
//!
//! let config = VectorIndexConfig::for_agent(&data_dir, "Judy", 384);
//! let index = open_vector_index(&config)?;
//!
//! index.insert(&[VectorInsert::new(id, embedding).with_document(content)])?;
//! let hits = index.query(&query_embedding, 3)?;
//! ```

mod backend;
mod config;
mod traits;

pub use config::{
    check_index_compatibility, collection_name, load_index_meta, write_index_meta,
    VectorIndexCompatibility, VectorIndexConfig, VectorIndexMeta, COLLECTION_PREFIX,
    DEFAULT_BACKEND, INDEX_META_FILENAME, MEMORY_BACKEND, SCHEMA_VERSION,
};
pub use traits::{
    VectorId, VectorIndexBackend, VectorInsert, VectorMetric, VectorRecord, VectorSearchResult,
};

pub use backend::{available_backends, open_vector_index};

#[cfg(feature = "simple")]
pub use backend::{SimpleFileVectorIndex, DATA_FILENAME};
