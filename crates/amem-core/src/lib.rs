//! # amem-core
//!
//! **Associative memory store** – core library.
//!
//! A store keeps short notes for one agent. Each new note is analyzed by a
//! completion provider (context, keywords, tags), embedded, linked to its
//! nearest existing neighbors and used to revise those neighbors' context and
//! tags before it is committed to the agent's vector index.
//!
//! ## Main Types
//!
//! - [`MemoryStore`] – entry point: add and retrieve memories
//! - [`MemoryConfig`] – configuration loaded from `~/.amem/config.yaml`
//! - [`AmemError`] – domain-specific error type
//!
//! ## Provider seams
//!
//! - [`EmbeddingProvider`] – text to vector
//! - [`CompletionProvider`] – prompt to text
//! - [`VectorIndex`] – per-agent persistent index
//!
//! [`ModelEmbeddingProvider`], [`ModelCompletionProvider`] and
//! [`DbVectorIndex`] bridge these to `amem-model` and `amem-db`.
//!
//! ## Example
//!
//! ```ignore
//! use amem_core::{MemoryConfig, MemoryStore, ModelCompletionProvider, ModelEmbeddingProvider};
//! use std::sync::Arc;
//!
//! let config = MemoryConfig::load_default()?;
//! let embedder = Arc::new(ModelEmbeddingProvider::from_config(&config.embedding)?);
//! let completer = Arc::new(ModelCompletionProvider::from_config(&config.completion)?);
//! let store = MemoryStore::open("judy", &config, embedder, completer)?;
//!
//! store.add_memory("Judy graduated top of her class at the police academy", None)?;
//! let found = store.retrieve("police academy", 3)?;
//! println!("{}", amem_core::format_memories(&found));
//! ```

pub mod completion;
pub mod config;
pub mod constants;
pub mod constructor;
pub mod db_adapter;
pub mod embedding;
pub mod errors;
pub mod evolver;
pub mod linker;
pub mod model_adapter;
pub mod note;
pub mod parser;
pub mod prompts;
pub mod store;
pub mod vector_index;

#[cfg(test)]
mod testing;

pub use completion::CompletionProvider;
pub use config::{MemoryConfig, VectorIndexSettings};
pub use constants::{
    AMEM_HOME_DIR, ANALYSIS_SYSTEM_PROMPT, CONFIG_FILENAME, CONTEXT_FALLBACK_CHARS, DB_DIR,
    DEFAULT_NEIGHBOR_K, DEFAULT_RETRIEVE_K,
};
pub use constructor::{fields_from_response, NoteConstructor};
pub use embedding::EmbeddingProvider;
pub use errors::AmemError;
pub use evolver::{
    apply_update, apply_updates, parse_updates, ApplyOutcome, EvolutionUpdate, MemoryEvolver,
};
pub use linker::{select_links, LinkGenerator};
pub use note::{
    format_memories, rich_text, MemoryNote, NoteFields, NoteId, NoteMetadata, RetrievedMemory,
};
pub use parser::parse_response;
pub use store::{AddOutcome, MemoryStore, StoreSettings};
pub use vector_index::{IndexEntry, IndexHit, IndexRecord, VectorIndex};

// amem-db adapter - per-agent vector storage
pub use db_adapter::{from_db_error, DbVectorIndex};

// amem-model adapter - embeddings and completions
pub use model_adapter::{from_model_error, ModelCompletionProvider, ModelEmbeddingProvider};

// Infrastructure config types callers need to build providers and indexes
pub use amem_db::vector::{VectorIndexConfig, VectorMetric};
pub use amem_model::{CompletionConfig, EmbeddingConfig};
