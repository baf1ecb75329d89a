//! The memory store: one agent's stream of linked, evolving notes.
//!
//! [`MemoryStore::add_memory`] runs the write pipeline:
//!
//! 1. construct context, keywords and tags for the content
//! 2. embed the rich text
//! 3. fetch the nearest existing notes (the new note is not yet stored)
//! 4. choose links among them and propose/apply evolution updates
//! 5. commit the new note under a fresh id
//!
//! Completion and parse failures in steps 1 and 4 fall back to defaults and
//! never fail the call. Only a failure to embed the new note or to commit it
//! is returned to the caller.
//!
//! ## Concurrency
//!
//! A store expects one `add_memory` in flight at a time. Evolution reads a
//! neighbor's metadata and writes it back without compare-and-swap, so two
//! concurrent calls updating the same neighbor can lose one update.
//! Callers must serialize writes per store; `retrieve` may run concurrently
//! with anything.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::completion::CompletionProvider;
use crate::config::MemoryConfig;
use crate::constants::{
    ANALYSIS_SYSTEM_PROMPT, CONTEXT_FALLBACK_CHARS, DEFAULT_NEIGHBOR_K, DEFAULT_RETRIEVE_K,
};
use crate::constructor::NoteConstructor;
use crate::db_adapter::DbVectorIndex;
use crate::embedding::EmbeddingProvider;
use crate::errors::AmemError;
use crate::evolver::{apply_updates, MemoryEvolver};
use crate::linker::LinkGenerator;
use crate::note::{rich_text, MemoryNote, NoteId, NoteMetadata, RetrievedMemory};
use crate::vector_index::{IndexRecord, VectorIndex};

// ============================================================================
// StoreSettings
// ============================================================================

/// Tunables for the write and read paths.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreSettings {
    /// Neighbors fetched for linking and evolution.
    pub neighbor_k: usize,
    /// Results returned by [`MemoryStore::retrieve_default`].
    pub default_retrieve_k: usize,
    /// Characters of content used as context when analysis fails.
    pub context_fallback_chars: usize,
    /// System role for every analysis prompt.
    pub analysis_system_prompt: String,
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self {
            neighbor_k: DEFAULT_NEIGHBOR_K,
            default_retrieve_k: DEFAULT_RETRIEVE_K,
            context_fallback_chars: CONTEXT_FALLBACK_CHARS,
            analysis_system_prompt: ANALYSIS_SYSTEM_PROMPT.to_string(),
        }
    }
}

impl From<&MemoryConfig> for StoreSettings {
    fn from(config: &MemoryConfig) -> Self {
        Self {
            neighbor_k: config.neighbor_k,
            default_retrieve_k: config.default_retrieve_k,
            context_fallback_chars: config.context_fallback_chars,
            analysis_system_prompt: config.analysis_system_prompt.clone(),
        }
    }
}

// ============================================================================
// AddOutcome
// ============================================================================

/// Result of one `add_memory` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddOutcome {
    /// Id of the committed note.
    pub id: NoteId,
    /// Neighbors the note links to.
    pub linked_ids: Vec<NoteId>,
    /// Neighbors whose metadata was rewritten by evolution.
    pub updates_applied: usize,
}

// ============================================================================
// MemoryStore
// ============================================================================

/// One agent's associative memory.
pub struct MemoryStore {
    agent_name: String,
    embedder: Arc<dyn EmbeddingProvider>,
    completer: Arc<dyn CompletionProvider>,
    index: Arc<dyn VectorIndex>,
    constructor: NoteConstructor,
    linker: LinkGenerator,
    evolver: MemoryEvolver,
    settings: StoreSettings,
}

impl std::fmt::Debug for MemoryStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryStore")
            .field("agent_name", &self.agent_name)
            .field("embedder", &self.embedder.name())
            .field("completer", &self.completer.name())
            .field("settings", &self.settings)
            .finish()
    }
}

impl MemoryStore {
    /// Build a store from already constructed providers and index.
    pub fn new(
        agent_name: impl Into<String>,
        embedder: Arc<dyn EmbeddingProvider>,
        completer: Arc<dyn CompletionProvider>,
        index: Arc<dyn VectorIndex>,
    ) -> Self {
        let settings = StoreSettings::default();
        Self {
            agent_name: agent_name.into(),
            constructor: build_constructor(&completer, &settings),
            linker: LinkGenerator::new(completer.clone(), settings.analysis_system_prompt.clone()),
            evolver: MemoryEvolver::new(completer.clone(), settings.analysis_system_prompt.clone()),
            embedder,
            completer,
            index,
            settings,
        }
    }

    /// Open (or create) the agent's collection described by `config`.
    ///
    /// The collection dimension is taken from the embedder.
    pub fn open(
        agent_name: &str,
        config: &MemoryConfig,
        embedder: Arc<dyn EmbeddingProvider>,
        completer: Arc<dyn CompletionProvider>,
    ) -> Result<Self, AmemError> {
        for warning in config.validate()? {
            warn!("Config warning: {}", warning);
        }

        let index_config = config.index_config(agent_name, embedder.dimension())?;
        let index = DbVectorIndex::open(&index_config)?;
        info!(
            "[{}] Opened memory collection {} ({} notes)",
            agent_name,
            index.collection(),
            index.len()?
        );

        Ok(Self::new(agent_name, embedder, completer, Arc::new(index))
            .with_settings(StoreSettings::from(config)))
    }

    /// Replace the tunables.
    pub fn with_settings(mut self, settings: StoreSettings) -> Self {
        self.constructor = build_constructor(&self.completer, &settings);
        self.linker = LinkGenerator::new(
            self.completer.clone(),
            settings.analysis_system_prompt.clone(),
        );
        self.evolver = MemoryEvolver::new(
            self.completer.clone(),
            settings.analysis_system_prompt.clone(),
        );
        self.settings = settings;
        self
    }

    /// Name of the agent owning this memory.
    pub fn agent_name(&self) -> &str {
        &self.agent_name
    }

    /// Current tunables.
    pub fn settings(&self) -> &StoreSettings {
        &self.settings
    }

    /// Store new content and return its id.
    ///
    /// `timestamp` is seconds since the Unix epoch; defaults to now.
    pub fn add_memory(&self, content: &str, timestamp: Option<f64>) -> Result<NoteId, AmemError> {
        self.add_memory_detailed(content, timestamp)
            .map(|outcome| outcome.id)
    }

    /// Like [`add_memory`](Self::add_memory), also reporting links and evolution.
    pub fn add_memory_detailed(
        &self,
        content: &str,
        timestamp: Option<f64>,
    ) -> Result<AddOutcome, AmemError> {
        let timestamp = timestamp.unwrap_or_else(now_seconds);

        info!("[{}] Constructing memory note", self.agent_name);
        let fields = self.constructor.construct(content);

        let rich = rich_text(content, &fields.context, &fields.keywords);
        let embedding = self.embedder.embed(&rich)?;

        let neighbors = self.neighbors(&embedding);
        let linked_ids = self.linker.link(content, &fields, &neighbors);
        if !neighbors.is_empty() {
            info!(
                "[{}] Linked to {} of {} neighbors",
                self.agent_name,
                linked_ids.len(),
                neighbors.len()
            );
        }

        let updates = self.evolver.propose(content, &neighbors);
        let updates_applied = apply_updates(self.index.as_ref(), &updates);
        if !updates.is_empty() {
            info!(
                "[{}] Evolution applied {} of {} proposed updates",
                self.agent_name,
                updates_applied,
                updates.len()
            );
        }

        let id = NoteId::generate();
        let metadata = NoteMetadata::for_new_note(&fields, &linked_ids, timestamp);
        self.index
            .insert(IndexRecord {
                id: id.clone(),
                embedding,
                document: content.to_string(),
                metadata: metadata.to_value(),
            })
            .map_err(|e| AmemError::CommitFailed {
                id: id.to_string(),
                reason: e.to_string(),
            })?;

        info!(
            "[{}] Stored memory {} [tags: {}]",
            self.agent_name,
            id.short(),
            fields.tags.join(", ")
        );

        Ok(AddOutcome {
            id,
            linked_ids,
            updates_applied,
        })
    }

    /// The `k` stored notes nearest to `query`, closest first.
    ///
    /// `score` is the index distance: lower is more similar.
    pub fn retrieve(&self, query: &str, k: usize) -> Result<Vec<RetrievedMemory>, AmemError> {
        if k == 0 {
            return Ok(Vec::new());
        }
        let embedding = self.embedder.embed(query)?;
        self.search(&embedding, k)
    }

    /// [`retrieve`](Self::retrieve) with the configured default `k`.
    pub fn retrieve_default(&self, query: &str) -> Result<Vec<RetrievedMemory>, AmemError> {
        self.retrieve(query, self.settings.default_retrieve_k)
    }

    /// Look up a note by id. The returned note has an empty embedding.
    pub fn get(&self, id: &NoteId) -> Result<Option<MemoryNote>, AmemError> {
        Ok(self
            .index
            .get(std::slice::from_ref(id))?
            .into_iter()
            .next()
            .map(|entry| MemoryNote::from_stored(entry.id, entry.document, &entry.metadata)))
    }

    /// Number of stored notes.
    pub fn len(&self) -> Result<usize, AmemError> {
        self.index.len()
    }

    /// Whether no notes are stored.
    pub fn is_empty(&self) -> Result<bool, AmemError> {
        self.index.is_empty()
    }

    fn search(&self, embedding: &[f32], k: usize) -> Result<Vec<RetrievedMemory>, AmemError> {
        let hits = self.index.query(embedding, k)?;
        Ok(hits
            .into_iter()
            .map(|hit| RetrievedMemory::from_stored(hit.id, hit.document, &hit.metadata, hit.distance))
            .collect())
    }

    /// Neighbors for a new note's embedding; a failed query means none.
    fn neighbors(&self, embedding: &[f32]) -> Vec<RetrievedMemory> {
        match self.search(embedding, self.settings.neighbor_k) {
            Ok(neighbors) => {
                debug!("[{}] Found {} neighbors", self.agent_name, neighbors.len());
                neighbors
            }
            Err(e) => {
                warn!("[{}] Neighbor search failed: {}", self.agent_name, e);
                Vec::new()
            }
        }
    }
}

fn build_constructor(
    completer: &Arc<dyn CompletionProvider>,
    settings: &StoreSettings,
) -> NoteConstructor {
    NoteConstructor::new(completer.clone(), settings.analysis_system_prompt.clone())
        .with_fallback_chars(settings.context_fallback_chars)
}

fn now_seconds() -> f64 {
    chrono::Utc::now().timestamp_millis() as f64 / 1000.0
}
