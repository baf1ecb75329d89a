//! # amem-db
//!
//! Infrastructure layer for associative memory - vector storage for memory notes.
//!
//! This crate provides the storage implementations that are isolated from the
//! domain logic in `amem-core`. By separating these concerns:
//!
//! - Changes to `amem-core` compile fast (no storage deps)
//! - Vector storage backends can be swapped without changing domain logic
//! - Testing is easier with in-memory implementations
//!
//! ## Architecture
//!
//! ```text
//! amem-core → (traits)
//!    ↑
//! amem-db (implements traits for vector storage)
//! amem-model (implements traits for embeddings/completions)
//! ```
//!
//! ## Features
//!
//! - `simple` (default): JSONL file-backed vector index with linear scan
//!
//! ## Usage
//!
//! ```ignore
//! use amem_db::vector::{VectorIndexConfig, open_vector_index};
//!
//! let config = VectorIndexConfig::new(384, "/path/to/amem_judy");
//! let index = open_vector_index(&config)?;
//!
//! index.insert(&[insert])?;
//! let hits = index.query(&embedding, 3)?;
//! ```

pub mod error;
pub mod vector;

pub use error::{DbError, DbResult};
