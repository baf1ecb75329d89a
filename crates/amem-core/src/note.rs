//! Memory note types and their stored metadata representation.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::constants::{META_CONTEXT, META_KEYWORDS, META_LINKED_IDS, META_TAGS, META_TIMESTAMP};

// ============================================================================
// NoteId
// ============================================================================

/// Opaque, never-reused identifier of a memory note.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NoteId(String);

impl NoteId {
    /// Generate a fresh random id.
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    /// Wrap an existing id.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Short prefix for log lines.
    pub fn short(&self) -> &str {
        self.0.get(..8).unwrap_or(&self.0)
    }
}

impl fmt::Display for NoteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for NoteId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<&str> for NoteId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl AsRef<str> for NoteId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

// ============================================================================
// MemoryNote
// ============================================================================

/// One persisted unit of experience.
///
/// `content`, `id` and `timestamp` are write-once. `embedding` is computed
/// from the rich text at creation and never recomputed; evolution changes
/// only `context` and `tags`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoryNote {
    pub id: NoteId,
    pub content: String,
    /// Empty when the note was read back from the index.
    #[serde(default)]
    pub embedding: Vec<f32>,
    pub context: String,
    pub keywords: Vec<String>,
    pub tags: Vec<String>,
    pub linked_ids: Vec<NoteId>,
    /// Seconds since the Unix epoch.
    pub timestamp: f64,
}

impl MemoryNote {
    /// Rebuild a note from its stored document and metadata.
    pub fn from_stored(id: NoteId, content: String, metadata: &Value) -> Self {
        let meta = NoteMetadata::from_value(metadata);
        Self {
            id,
            content,
            embedding: Vec::new(),
            context: meta.context,
            keywords: meta.keywords,
            tags: meta.tags,
            linked_ids: meta.linked_ids.into_iter().map(NoteId::from).collect(),
            timestamp: meta.timestamp,
        }
    }

    /// The embedding input for this note.
    pub fn rich_text(&self) -> String {
        rich_text(&self.content, &self.context, &self.keywords)
    }
}

/// Fields derived for new content by the note constructor.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NoteFields {
    pub context: String,
    pub keywords: Vec<String>,
    pub tags: Vec<String>,
}

/// Concatenation of content, context and keywords used as embedding input.
///
/// `"Judy joined the ZPD | Context: A rookie's first day | Keywords: Judy, ZPD"`
pub fn rich_text(content: &str, context: &str, keywords: &[String]) -> String {
    format!(
        "{} | Context: {} | Keywords: {}",
        content,
        context,
        keywords.join(", ")
    )
}

// ============================================================================
// NoteMetadata
// ============================================================================

/// The metadata map stored next to each note's vector.
///
/// Reading is lenient: missing keys, `null`s and wrong types become empty
/// values, and string lists may also be stored as comma-separated strings.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct NoteMetadata {
    pub context: String,
    pub keywords: Vec<String>,
    pub tags: Vec<String>,
    pub linked_ids: Vec<String>,
    pub timestamp: f64,
}

impl NoteMetadata {
    /// Read metadata from a stored JSON value. Never fails.
    pub fn from_value(value: &Value) -> Self {
        let empty = Map::new();
        let map = value.as_object().unwrap_or(&empty);
        Self {
            context: string_field(map, META_CONTEXT).unwrap_or_default(),
            keywords: string_list_field(map, META_KEYWORDS).unwrap_or_default(),
            tags: string_list_field(map, META_TAGS).unwrap_or_default(),
            linked_ids: string_list_field(map, META_LINKED_IDS).unwrap_or_default(),
            timestamp: map
                .get(META_TIMESTAMP)
                .and_then(Value::as_f64)
                .unwrap_or_default(),
        }
    }

    /// Metadata for a newly constructed note.
    pub fn for_new_note(fields: &NoteFields, linked_ids: &[NoteId], timestamp: f64) -> Self {
        Self {
            context: fields.context.clone(),
            keywords: fields.keywords.clone(),
            tags: fields.tags.clone(),
            linked_ids: linked_ids.iter().map(|id| id.to_string()).collect(),
            timestamp,
        }
    }

    /// Serialize into the JSON map stored in the index.
    pub fn to_value(&self) -> Value {
        let mut map = Map::new();
        map.insert(META_CONTEXT.to_string(), Value::from(self.context.as_str()));
        map.insert(META_KEYWORDS.to_string(), Value::from(self.keywords.clone()));
        map.insert(META_TAGS.to_string(), Value::from(self.tags.clone()));
        map.insert(META_LINKED_IDS.to_string(), Value::from(self.linked_ids.clone()));
        map.insert(META_TIMESTAMP.to_string(), Value::from(self.timestamp));
        Value::Object(map)
    }
}

/// A string value, or `None` when absent or not a string.
pub(crate) fn string_field(map: &Map<String, Value>, key: &str) -> Option<String> {
    map.get(key).and_then(Value::as_str).map(str::to_string)
}

/// A list of strings from a JSON array or a comma-separated string.
///
/// Non-string array items are skipped; items are trimmed and empty ones
/// dropped. `None` when the key is absent or of another type.
pub(crate) fn string_list_field(map: &Map<String, Value>, key: &str) -> Option<Vec<String>> {
    let clean = |s: &str| {
        let t = s.trim();
        (!t.is_empty()).then(|| t.to_string())
    };

    match map.get(key)? {
        Value::Array(items) => Some(items.iter().filter_map(Value::as_str).filter_map(clean).collect()),
        Value::String(joined) => Some(joined.split(',').filter_map(clean).collect()),
        _ => None,
    }
}

// ============================================================================
// RetrievedMemory
// ============================================================================

/// One similarity search hit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievedMemory {
    pub id: NoteId,
    pub content: String,
    pub context: String,
    pub tags: Vec<String>,
    /// Distance reported by the vector index. Lower is more similar.
    pub score: f32,
}

impl RetrievedMemory {
    /// Build a hit from stored document and metadata.
    pub fn from_stored(id: NoteId, content: String, metadata: &Value, score: f32) -> Self {
        let meta = NoteMetadata::from_value(metadata);
        Self {
            id,
            content,
            context: meta.context,
            tags: meta.tags,
            score,
        }
    }
}

/// Render hits as prompt-ready lines.
///
/// ```text
/// - [tags: police,rookie] Judy joined the ZPD (context: A rookie's first day)
/// ```
///
/// Returns an empty string for no hits.
pub fn format_memories(memories: &[RetrievedMemory]) -> String {
    memories
        .iter()
        .map(|m| {
            format!(
                "- [tags: {}] {} (context: {})",
                m.tags.join(","),
                m.content,
                m.context
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}
