//! Test doubles for unit tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use amem_db::vector::VectorIndexConfig;
use serde_json::Value;

use crate::completion::CompletionProvider;
use crate::db_adapter::DbVectorIndex;
use crate::embedding::{hash_to_embedding, EmbeddingProvider};
use crate::errors::AmemError;
use crate::note::NoteId;
use crate::vector_index::{IndexEntry, IndexHit, IndexRecord, VectorIndex};

// ============================================================================
// Embeddings
// ============================================================================

/// Embeds by prefix rule, falling back to a hash embedding.
pub(crate) struct MockEmbeddingProvider {
    dimension: usize,
    rules: Vec<(String, Vec<f32>)>,
    fail: bool,
}

impl MockEmbeddingProvider {
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension,
            rules: Vec::new(),
            fail: false,
        }
    }

    /// Texts starting with `prefix` embed to `vector`.
    pub fn with_rule(mut self, prefix: &str, vector: Vec<f32>) -> Self {
        self.rules.push((prefix.to_string(), vector));
        self
    }

    pub fn failing(dimension: usize) -> Self {
        Self {
            fail: true,
            ..Self::new(dimension)
        }
    }
}

impl EmbeddingProvider for MockEmbeddingProvider {
    fn name(&self) -> &str {
        "mock"
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn embed(&self, text: &str) -> Result<Vec<f32>, AmemError> {
        if self.fail {
            return Err(AmemError::EmbeddingProviderUnavailable {
                provider: "mock".to_string(),
                reason: "embedding disabled".to_string(),
            });
        }
        let ruled = self
            .rules
            .iter()
            .find(|(prefix, _)| text.starts_with(prefix.as_str()))
            .map(|(_, v)| v.clone());
        Ok(ruled.unwrap_or_else(|| hash_to_embedding(text, self.dimension)))
    }
}

// ============================================================================
// Completions
// ============================================================================

/// Which analysis prompt a completion call carried.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum PromptKind {
    Analysis,
    Links,
    Evolution,
    Other,
}

impl PromptKind {
    fn of(prompt: &str) -> Self {
        if prompt.contains("Content for analysis:") {
            Self::Analysis
        } else if prompt.contains("Nearest Neighbors:") {
            Self::Links
        } else if prompt.contains("\"updates\": [") {
            Self::Evolution
        } else {
            Self::Other
        }
    }
}

#[derive(Debug, Clone)]
pub(crate) struct RecordedCall {
    pub kind: PromptKind,
    pub prompt: String,
    pub system_role: Option<String>,
    pub structured: bool,
}

/// Replies with a fixed text per prompt kind and records every call.
#[derive(Default)]
pub(crate) struct ScriptedCompletion {
    analysis: Option<String>,
    links: Option<String>,
    evolution: Option<String>,
    fail: bool,
    calls: Mutex<Vec<RecordedCall>>,
}

impl ScriptedCompletion {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn with_analysis(mut self, reply: &str) -> Self {
        self.analysis = Some(reply.to_string());
        self
    }

    pub fn with_links(mut self, reply: &str) -> Self {
        self.links = Some(reply.to_string());
        self
    }

    pub fn with_evolution(mut self, reply: &str) -> Self {
        self.evolution = Some(reply.to_string());
        self
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn count(&self, kind: PromptKind) -> usize {
        self.calls().iter().filter(|c| c.kind == kind).count()
    }
}

impl CompletionProvider for ScriptedCompletion {
    fn name(&self) -> &str {
        "scripted"
    }

    fn complete(
        &self,
        prompt: &str,
        system_role: Option<&str>,
        structured: bool,
    ) -> Result<String, AmemError> {
        let kind = PromptKind::of(prompt);
        self.calls.lock().unwrap().push(RecordedCall {
            kind,
            prompt: prompt.to_string(),
            system_role: system_role.map(str::to_string),
            structured,
        });

        if self.fail {
            return Err(AmemError::completion_failed("scripted", "service unavailable"));
        }
        let reply = match kind {
            PromptKind::Analysis => self.analysis.clone(),
            PromptKind::Links => self.links.clone(),
            PromptKind::Evolution => self.evolution.clone(),
            PromptKind::Other => None,
        };
        Ok(reply.unwrap_or_else(|| "{}".to_string()))
    }
}

// ============================================================================
// Vector index
// ============================================================================

/// In-memory index that counts metadata writes and can refuse inserts.
pub(crate) struct RecordingIndex {
    inner: DbVectorIndex,
    updates: AtomicUsize,
    reject_inserts: bool,
}

impl RecordingIndex {
    pub fn new(dimension: usize) -> Self {
        let inner = DbVectorIndex::open(&VectorIndexConfig::in_memory(dimension)).unwrap();
        Self {
            inner,
            updates: AtomicUsize::new(0),
            reject_inserts: false,
        }
    }

    pub fn rejecting_inserts(dimension: usize) -> Self {
        Self {
            reject_inserts: true,
            ..Self::new(dimension)
        }
    }

    pub fn update_count(&self) -> usize {
        self.updates.load(Ordering::SeqCst)
    }

    /// Insert a record directly, bypassing the pipeline.
    pub fn seed(&self, id: &str, embedding: Vec<f32>, document: &str, metadata: Value) {
        self.inner
            .insert(IndexRecord {
                id: NoteId::new(id),
                embedding,
                document: document.to_string(),
                metadata,
            })
            .unwrap();
    }

    pub fn metadata(&self, id: &str) -> Value {
        self.inner.get(&[NoteId::new(id)]).unwrap()[0].metadata.clone()
    }
}

impl VectorIndex for RecordingIndex {
    fn insert(&self, record: IndexRecord) -> Result<(), AmemError> {
        if self.reject_inserts {
            return Err(AmemError::VectorIndexIo {
                path: "memory".into(),
                message: "disk full".to_string(),
            });
        }
        self.inner.insert(record)
    }

    fn query(&self, embedding: &[f32], k: usize) -> Result<Vec<IndexHit>, AmemError> {
        self.inner.query(embedding, k)
    }

    fn get(&self, ids: &[NoteId]) -> Result<Vec<IndexEntry>, AmemError> {
        self.inner.get(ids)
    }

    fn update_metadata(&self, id: &NoteId, metadata: Value) -> Result<(), AmemError> {
        self.updates.fetch_add(1, Ordering::SeqCst);
        self.inner.update_metadata(id, metadata)
    }

    fn len(&self) -> Result<usize, AmemError> {
        self.inner.len()
    }

    fn dimension(&self) -> usize {
        self.inner.dimension()
    }
}
