//! Memory evolution: revise neighbors' context and tags after a new note.
//!
//! Evolution runs in two phases. [`MemoryEvolver::propose`] asks the
//! completion provider for updates and returns them as plain data.
//! [`apply_update`] then writes a single update: it re-reads the neighbor's
//! current metadata, compares field by field and writes only on change, so
//! applying the same update twice writes once.
//!
//! Proposals are decided on the neighbor snapshot taken before the new note
//! is committed, while application reads current state. Only `context` and
//! `tags` ever change; the embedding, content and keywords stay as created.

use std::collections::HashSet;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, info, warn};

use crate::completion::{complete_json, CompletionProvider};
use crate::constants::{META_CONTEXT, META_TAGS};
use crate::errors::AmemError;
use crate::note::{string_field, string_list_field, NoteId, NoteMetadata, RetrievedMemory};
use crate::parser::{parse_response, preview};
use crate::prompts;
use crate::vector_index::VectorIndex;

/// Response key holding the proposed updates.
const UPDATES_KEY: &str = "updates";

/// A proposed change to one neighbor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvolutionUpdate {
    pub id: NoteId,
    pub new_context: Option<String>,
    pub new_tags: Option<Vec<String>>,
}

/// What applying one update did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyOutcome {
    /// Metadata was written.
    Applied,
    /// The proposal matched current metadata; nothing written.
    Unchanged,
    /// The note no longer exists; skipped.
    Missing,
}

/// Asks the completion provider how neighbors should evolve.
pub struct MemoryEvolver {
    completer: Arc<dyn CompletionProvider>,
    system_role: String,
}

impl MemoryEvolver {
    pub fn new(completer: Arc<dyn CompletionProvider>, system_role: impl Into<String>) -> Self {
        Self {
            completer,
            system_role: system_role.into(),
        }
    }

    /// Proposed updates for `neighbors` in light of `content`. Has no side
    /// effects beyond the completion call; none at all for no neighbors.
    pub fn propose(&self, content: &str, neighbors: &[RetrievedMemory]) -> Vec<EvolutionUpdate> {
        if neighbors.is_empty() {
            return Vec::new();
        }

        let prompt = prompts::memory_evolution(content, neighbors);
        let raw = complete_json(
            self.completer.as_ref(),
            &prompt,
            &self.system_role,
            "Memory evolution",
        );
        parse_updates(&parse_response(&raw), neighbors)
    }
}

/// Read updates from a parsed evolution response.
///
/// Items without an id, with an id outside the neighbor snapshot, or
/// proposing neither a non-blank context nor a non-empty tag list are
/// dropped.
pub fn parse_updates(
    response: &Map<String, Value>,
    neighbors: &[RetrievedMemory],
) -> Vec<EvolutionUpdate> {
    let Some(items) = response.get(UPDATES_KEY).and_then(Value::as_array) else {
        return Vec::new();
    };
    let known: HashSet<&str> = neighbors.iter().map(|n| n.id.as_str()).collect();

    items
        .iter()
        .filter_map(Value::as_object)
        .filter_map(|item| {
            let id = string_field(item, "id")?.trim().to_string();
            if !known.contains(id.as_str()) {
                debug!("Dropping evolution update for unknown id '{}'", id);
                return None;
            }

            let new_context = string_field(item, "new_context")
                .map(|c| c.trim().to_string())
                .filter(|c| !c.is_empty());
            let new_tags = string_list_field(item, "new_tags").filter(|t| !t.is_empty());
            if new_context.is_none() && new_tags.is_none() {
                return None;
            }

            Some(EvolutionUpdate {
                id: NoteId::new(id),
                new_context,
                new_tags,
            })
        })
        .collect()
}

/// Apply one update against the note's current metadata.
///
/// Keys other than `context` and `tags` are written back unchanged.
pub fn apply_update(
    index: &dyn VectorIndex,
    update: &EvolutionUpdate,
) -> Result<ApplyOutcome, AmemError> {
    let Some(entry) = index.get(std::slice::from_ref(&update.id))?.into_iter().next() else {
        return Ok(ApplyOutcome::Missing);
    };

    let current = NoteMetadata::from_value(&entry.metadata);
    let mut map = entry.metadata.as_object().cloned().unwrap_or_default();
    let mut changed = false;

    if let Some(context) = &update.new_context {
        if *context != current.context {
            map.insert(META_CONTEXT.to_string(), Value::from(context.as_str()));
            changed = true;
        }
    }
    if let Some(tags) = &update.new_tags {
        if *tags != current.tags {
            map.insert(META_TAGS.to_string(), Value::from(tags.clone()));
            changed = true;
        }
    }

    if !changed {
        return Ok(ApplyOutcome::Unchanged);
    }

    match index.update_metadata(&update.id, Value::Object(map)) {
        Ok(()) => Ok(ApplyOutcome::Applied),
        Err(AmemError::NoteNotFound(_)) => Ok(ApplyOutcome::Missing),
        Err(e) => Err(e),
    }
}

/// Apply updates in order and return how many wrote metadata.
///
/// Failures are logged per update and do not stop the rest.
pub fn apply_updates(index: &dyn VectorIndex, updates: &[EvolutionUpdate]) -> usize {
    let mut applied = 0;
    for update in updates {
        match apply_update(index, update) {
            Ok(ApplyOutcome::Applied) => {
                applied += 1;
                info!(
                    "Evolved memory {}: context -> {}",
                    update.id.short(),
                    preview(update.new_context.as_deref().unwrap_or("(unchanged)"), 20)
                );
            }
            Ok(ApplyOutcome::Unchanged) => {
                debug!("Evolution of {} changed nothing", update.id.short());
            }
            Ok(ApplyOutcome::Missing) => {
                debug!("Skipping evolution of {}: note is gone", update.id.short());
            }
            Err(e) => {
                warn!("Failed to evolve memory {}: {}", update.id.short(), e);
            }
        }
    }
    applied
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{PromptKind, RecordingIndex, ScriptedCompletion};
    use serde_json::json;

    fn neighbor(id: &str) -> RetrievedMemory {
        RetrievedMemory {
            id: NoteId::new(id),
            content: format!("content of {}", id),
            context: "old".to_string(),
            tags: vec![],
            score: 0.1,
        }
    }

    fn seeded_index() -> RecordingIndex {
        let index = RecordingIndex::new(2);
        index.seed(
            "n-1",
            vec![1.0, 0.0],
            "Nick sells pawpsicles",
            json!({
                "context": "A hustle",
                "keywords": ["Nick"],
                "tags": ["fox", "hustle"],
                "linked_ids": [],
                "timestamp": 10.0,
                "source": "street"
            }),
        );
        index
    }

    fn update(id: &str, context: Option<&str>, tags: Option<&[&str]>) -> EvolutionUpdate {
        EvolutionUpdate {
            id: NoteId::new(id),
            new_context: context.map(str::to_string),
            new_tags: tags.map(|t| t.iter().map(|s| s.to_string()).collect()),
        }
    }

    #[test]
    fn test_parse_updates_filters() {
        let neighbors = vec![neighbor("a"), neighbor("b")];
        let response = json!({
            "updates": [
                {"id": "a", "new_context": "Revised", "new_tags": ["x", "y"]},
                {"id": "b", "new_tags": "p, q"},
                {"id": "ghost", "new_context": "nope"},
                {"id": "", "new_context": "nope"},
                {"id": "a"},
                {"id": "b", "new_context": "   ", "new_tags": []},
                "not an object"
            ]
        });
        let updates = parse_updates(response.as_object().unwrap(), &neighbors);
        assert_eq!(
            updates,
            vec![
                update("a", Some("Revised"), Some(&["x", "y"][..])),
                update("b", None, Some(&["p", "q"][..])),
            ]
        );

        assert!(parse_updates(&Map::new(), &neighbors).is_empty());
        let wrong = json!({"updates": {"id": "a"}});
        assert!(parse_updates(wrong.as_object().unwrap(), &neighbors).is_empty());
    }

    #[test]
    fn test_apply_is_idempotent() {
        let index = seeded_index();
        let u = update("n-1", Some("A hustle, later a cop"), Some(&["fox", "police"][..]));

        assert_eq!(apply_update(&index, &u).unwrap(), ApplyOutcome::Applied);
        assert_eq!(index.update_count(), 1);
        let after_first = index.metadata("n-1");

        assert_eq!(apply_update(&index, &u).unwrap(), ApplyOutcome::Unchanged);
        assert_eq!(index.update_count(), 1);
        assert_eq!(index.metadata("n-1"), after_first);
    }

    #[test]
    fn test_apply_writes_only_changed_fields() {
        let index = seeded_index();
        let u = update("n-1", Some("A hustle"), Some(&["fox", "hustle", "con"][..]));
        assert_eq!(apply_update(&index, &u).unwrap(), ApplyOutcome::Applied);

        let meta = index.metadata("n-1");
        assert_eq!(meta["context"], "A hustle");
        assert_eq!(meta["tags"], json!(["fox", "hustle", "con"]));
        assert_eq!(meta["keywords"], json!(["Nick"]));
        assert_eq!(meta["source"], "street");
        assert_eq!(meta["timestamp"], 10.0);
    }

    #[test]
    fn test_same_context_no_write() {
        let index = seeded_index();
        let u = update("n-1", Some("A hustle"), None);
        assert_eq!(apply_update(&index, &u).unwrap(), ApplyOutcome::Unchanged);
        assert_eq!(index.update_count(), 0);
    }

    #[test]
    fn test_missing_note_skipped() {
        let index = seeded_index();
        let updates = vec![
            update("gone", Some("whatever"), None),
            update("n-1", Some("Now a cop"), None),
        ];
        assert_eq!(apply_update(&index, &updates[0]).unwrap(), ApplyOutcome::Missing);
        assert_eq!(apply_updates(&index, &updates), 1);
        assert_eq!(index.update_count(), 1);
    }

    #[test]
    fn test_propose_uses_snapshot_ids() {
        let completer = Arc::new(ScriptedCompletion::new().with_evolution(
            r#"{"updates": [{"id": "a", "new_context": "Seen anew"}, {"id": "z", "new_context": "x"}]}"#,
        ));
        let evolver = MemoryEvolver::new(completer.clone(), "sys");

        let updates = evolver.propose("Bellwether was behind it", &[neighbor("a")]);
        assert_eq!(updates, vec![update("a", Some("Seen anew"), None)]);
        assert_eq!(completer.count(PromptKind::Evolution), 1);

        assert!(evolver.propose("anything", &[]).is_empty());
        assert_eq!(completer.count(PromptKind::Evolution), 1);
    }
}
