//! Link generation: choose which neighbors a new note references.

use std::collections::HashSet;
use std::sync::Arc;

use serde_json::{Map, Value};
use tracing::debug;

use crate::completion::{complete_json, CompletionProvider};
use crate::note::{string_list_field, NoteFields, NoteId, RetrievedMemory};
use crate::parser::parse_response;
use crate::prompts;

/// Response key holding the chosen neighbor ids.
const LINKED_IDS_KEY: &str = "linked_memory_ids";

/// Asks the completion provider which neighbors are related to a new note.
pub struct LinkGenerator {
    completer: Arc<dyn CompletionProvider>,
    system_role: String,
}

impl LinkGenerator {
    pub fn new(completer: Arc<dyn CompletionProvider>, system_role: impl Into<String>) -> Self {
        Self {
            completer,
            system_role: system_role.into(),
        }
    }

    /// Ids of `neighbors` the new note should link to.
    ///
    /// No neighbors means no completion call and no links.
    pub fn link(
        &self,
        content: &str,
        fields: &NoteFields,
        neighbors: &[RetrievedMemory],
    ) -> Vec<NoteId> {
        if neighbors.is_empty() {
            return Vec::new();
        }

        let prompt = prompts::link_generation(content, fields, neighbors);
        let raw = complete_json(
            self.completer.as_ref(),
            &prompt,
            &self.system_role,
            "Link generation",
        );
        select_links(&parse_response(&raw), neighbors)
    }
}

/// Proposed ids restricted to the neighbor snapshot, first occurrence kept.
pub fn select_links(response: &Map<String, Value>, neighbors: &[RetrievedMemory]) -> Vec<NoteId> {
    let proposed = string_list_field(response, LINKED_IDS_KEY).unwrap_or_default();
    let known: HashSet<&str> = neighbors.iter().map(|n| n.id.as_str()).collect();
    let mut seen = HashSet::new();

    proposed
        .into_iter()
        .filter(|id| {
            let keep = known.contains(id.as_str());
            if !keep {
                debug!("Dropping link to {}: not among neighbors", id);
            }
            keep
        })
        .filter(|id| seen.insert(id.clone()))
        .map(NoteId::from)
        .collect()
}
