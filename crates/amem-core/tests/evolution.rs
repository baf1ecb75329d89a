//! Integration tests for neighbor evolution.
//!
//! Proposals are plain data; `apply_update` is the only write path.

mod common;

use std::sync::{Arc, Mutex};

use amem_core::{apply_update, apply_updates, ApplyOutcome, EvolutionUpdate, NoteId};
use common::{neighbor_ids, store_with, HashEmbedder, RecordingIndex, ScriptedCompleter, Step, DIM};
use serde_json::json;

fn seeded() -> RecordingIndex {
    let index = RecordingIndex::new(DIM);
    index.seed(
        "flash",
        vec![0.25; DIM],
        "Flash works at the DMV",
        json!({
            "context": "A slow sloth",
            "keywords": ["Flash", "DMV"],
            "tags": ["sloth", "work"],
            "linked_ids": [],
            "timestamp": 42.0
        }),
    );
    index
}

fn update(context: Option<&str>, tags: Option<Vec<&str>>) -> EvolutionUpdate {
    EvolutionUpdate {
        id: NoteId::new("flash"),
        new_context: context.map(str::to_string),
        new_tags: tags.map(|t| t.into_iter().map(str::to_string).collect()),
    }
}

#[test]
fn test_second_apply_is_a_no_op() {
    let index = seeded();
    let u = update(Some("A sloth who street races"), Some(vec!["sloth", "racing"]));

    assert_eq!(apply_update(&index, &u).unwrap(), ApplyOutcome::Applied);
    let once = index.metadata(&NoteId::new("flash"));

    assert_eq!(apply_update(&index, &u).unwrap(), ApplyOutcome::Unchanged);
    assert_eq!(index.update_count(), 1);
    assert_eq!(index.metadata(&NoteId::new("flash")), once);
}

#[test]
fn test_unchanged_context_is_not_written() {
    let index = seeded();

    let same = update(Some("A slow sloth"), None);
    assert_eq!(apply_update(&index, &same).unwrap(), ApplyOutcome::Unchanged);

    let same_tags = update(None, Some(vec!["sloth", "work"]));
    assert_eq!(apply_update(&index, &same_tags).unwrap(), ApplyOutcome::Unchanged);

    assert_eq!(index.update_count(), 0);
}

#[test]
fn test_partial_update_keeps_other_fields() {
    let index = seeded();
    let u = update(None, Some(vec!["sloth", "work", "fast"]));
    assert_eq!(apply_update(&index, &u).unwrap(), ApplyOutcome::Applied);

    let meta = index.metadata(&NoteId::new("flash"));
    assert_eq!(meta["context"], "A slow sloth");
    assert_eq!(meta["tags"], json!(["sloth", "work", "fast"]));
    assert_eq!(meta["keywords"], json!(["Flash", "DMV"]));
    assert_eq!(meta["timestamp"], 42.0);
}

#[test]
fn test_missing_neighbor_is_skipped() {
    let index = seeded();
    let gone = EvolutionUpdate {
        id: NoteId::new("deleted-meanwhile"),
        new_context: Some("irrelevant".to_string()),
        new_tags: None,
    };
    assert_eq!(apply_update(&index, &gone).unwrap(), ApplyOutcome::Missing);

    let applied = apply_updates(&index, &[gone, update(Some("Faster than expected"), None)]);
    assert_eq!(applied, 1);
    assert_eq!(index.update_count(), 1);
}

#[test]
fn test_evolution_keeps_embedding() {
    // The first note's context is rewritten once the second arrives.
    let rewrite = Arc::new(Mutex::new(false));
    let enabled = rewrite.clone();
    let completer = Arc::new(ScriptedCompleter::new(move |step, prompt| {
        Some(match step {
            Step::Evolution if *enabled.lock().unwrap() => {
                let updates: Vec<_> = neighbor_ids(prompt)
                    .into_iter()
                    .map(|id| json!({"id": id, "new_context": "Completely different now", "new_tags": ["changed"]}))
                    .collect();
                json!({ "updates": updates }).to_string()
            }
            _ => "{}".to_string(),
        })
    }));
    let index = Arc::new(RecordingIndex::new(DIM));
    let store = store_with(HashEmbedder::new(DIM), completer, index.clone());

    let target = store.add_memory("Mr. Big runs Tundratown", None).unwrap();
    let query = "who is in charge of Tundratown";
    let score_of = |hits: &[amem_core::RetrievedMemory]| {
        hits.iter().find(|h| h.id == target).map(|h| h.score)
    };

    let before = score_of(&store.retrieve(query, 10).unwrap()).unwrap();

    *rewrite.lock().unwrap() = true;
    store.add_memory("Fru Fru is getting married", None).unwrap();
    assert_eq!(index.update_count(), 1);

    let hits = store.retrieve(query, 10).unwrap();
    let evolved = hits.iter().find(|h| h.id == target).unwrap();
    assert_eq!(evolved.context, "Completely different now");
    assert_eq!(score_of(&hits).unwrap(), before);
}
