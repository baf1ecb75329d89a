//! Shared test doubles for amem-core integration tests.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use amem_core::{
    AmemError, CompletionProvider, DbVectorIndex, EmbeddingProvider, IndexEntry, IndexHit,
    IndexRecord, MemoryStore, NoteId, VectorIndex, VectorIndexConfig,
};
use serde_json::Value;

pub const DIM: usize = 16;

// ============================================================================
// Embedder
// ============================================================================

/// Deterministic embedder: prefix rules first, then a normalized hash vector.
pub struct HashEmbedder {
    dimension: usize,
    rules: Vec<(String, Vec<f32>)>,
    fail: bool,
}

impl HashEmbedder {
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension,
            rules: Vec::new(),
            fail: false,
        }
    }

    pub fn with_rule(mut self, prefix: &str, vector: Vec<f32>) -> Self {
        assert_eq!(vector.len(), self.dimension);
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

impl EmbeddingProvider for HashEmbedder {
    fn name(&self) -> &str {
        "hash"
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn embed(&self, text: &str) -> Result<Vec<f32>, AmemError> {
        if self.fail {
            return Err(AmemError::EmbeddingProviderUnavailable {
                provider: "hash".to_string(),
                reason: "offline".to_string(),
            });
        }
        if let Some((_, v)) = self.rules.iter().find(|(p, _)| text.starts_with(p.as_str())) {
            return Ok(v.clone());
        }
        Ok(hash_vector(text, self.dimension))
    }
}

fn hash_vector(text: &str, dimension: usize) -> Vec<f32> {
    let mut state: u64 = 1469598103934665603;
    for byte in text.bytes() {
        state ^= u64::from(byte);
        state = state.wrapping_mul(1099511628211);
    }

    let mut v: Vec<f32> = (0..dimension)
        .map(|_| {
            state = state
                .wrapping_mul(6364136223846793005)
                .wrapping_add(1442695040888963407);
            ((state >> 33) as f32 / u32::MAX as f32) - 0.25
        })
        .collect();
    let norm = v.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        v.iter_mut().for_each(|x| *x /= norm);
    }
    v
}

// ============================================================================
// Completer
// ============================================================================

/// Which analysis step a prompt belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Analysis,
    Links,
    Evolution,
}

impl Step {
    fn of(prompt: &str) -> Self {
        if prompt.contains("Content for analysis:") {
            Step::Analysis
        } else if prompt.contains("\"updates\": [") {
            Step::Evolution
        } else {
            Step::Links
        }
    }
}

type Responder = Box<dyn Fn(Step, &str) -> Option<String> + Send + Sync>;

/// Completion provider whose replies are computed from the prompt.
///
/// `None` from the responder is returned as a provider failure.
pub struct ScriptedCompleter {
    responder: Responder,
    calls: Mutex<Vec<(Step, String)>>,
}

impl ScriptedCompleter {
    pub fn new(responder: impl Fn(Step, &str) -> Option<String> + Send + Sync + 'static) -> Self {
        Self {
            responder: Box::new(responder),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Replies with the same text to every prompt.
    pub fn constant(reply: &str) -> Self {
        let reply = reply.to_string();
        Self::new(move |_, _| Some(reply.clone()))
    }

    /// Fails every call.
    pub fn unavailable() -> Self {
        Self::new(|_, _| None)
    }

    pub fn count(&self, step: Step) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|(s, _)| *s == step)
            .count()
    }

    pub fn last_prompt(&self, step: Step) -> Option<String> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .rev()
            .find(|(s, _)| *s == step)
            .map(|(_, p)| p.clone())
    }
}

impl CompletionProvider for ScriptedCompleter {
    fn name(&self) -> &str {
        "scripted"
    }

    fn complete(
        &self,
        prompt: &str,
        _system_role: Option<&str>,
        _structured: bool,
    ) -> Result<String, AmemError> {
        let step = Step::of(prompt);
        self.calls.lock().unwrap().push((step, prompt.to_string()));
        (self.responder)(step, prompt)
            .ok_or_else(|| AmemError::completion_failed("scripted", "connection refused"))
    }
}

/// Neighbor ids listed in a link or evolution prompt.
pub fn neighbor_ids(prompt: &str) -> Vec<String> {
    prompt
        .lines()
        .filter(|line| line.starts_with("[{"))
        .filter_map(|line| serde_json::from_str::<Vec<Value>>(line).ok())
        .flatten()
        .filter_map(|n| n.get("id").and_then(Value::as_str).map(str::to_string))
        .collect()
}

// ============================================================================
// Index
// ============================================================================

/// In-memory amem-db index that counts metadata writes.
pub struct RecordingIndex {
    inner: DbVectorIndex,
    updates: AtomicUsize,
}

impl RecordingIndex {
    pub fn new(dimension: usize) -> Self {
        Self {
            inner: DbVectorIndex::open(&VectorIndexConfig::in_memory(dimension)).unwrap(),
            updates: AtomicUsize::new(0),
        }
    }

    pub fn update_count(&self) -> usize {
        self.updates.load(Ordering::SeqCst)
    }

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

    pub fn metadata(&self, id: &NoteId) -> Value {
        self.inner.get(std::slice::from_ref(id)).unwrap()[0]
            .metadata
            .clone()
    }
}

impl VectorIndex for RecordingIndex {
    fn insert(&self, record: IndexRecord) -> Result<(), AmemError> {
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

/// A store over the given doubles for agent `test`.
pub fn store_with(
    embedder: HashEmbedder,
    completer: Arc<ScriptedCompleter>,
    index: Arc<RecordingIndex>,
) -> MemoryStore {
    MemoryStore::new("test", Arc::new(embedder), completer, index)
}
