//! Integration tests for `retrieve` and result formatting.

mod common;

use std::sync::Arc;

use amem_core::{format_memories, rich_text, NoteId, RetrievedMemory};
use common::{store_with, HashEmbedder, RecordingIndex, ScriptedCompleter, DIM};
use serde_json::json;

fn axis(values: &[f32]) -> Vec<f32> {
    let mut v = vec![0.0; DIM];
    v[..values.len()].copy_from_slice(values);
    v
}

/// Embedder placing notes A, B and C at known points.
fn abc_embedder() -> HashEmbedder {
    HashEmbedder::new(DIM)
        .with_rule("Alpha", axis(&[1.0, 0.0, 0.0]))
        .with_rule("Bravo", axis(&[0.8, 0.6, 0.0]))
        .with_rule("Charlie", axis(&[0.0, 0.0, 1.0]))
}

#[test]
fn test_ranking_by_distance() {
    let completer = Arc::new(ScriptedCompleter::constant("{}"));
    let store = store_with(abc_embedder(), completer, Arc::new(RecordingIndex::new(DIM)));

    let a = store.add_memory("Alpha: Judy meets Nick", None).unwrap();
    let b = store.add_memory("Bravo: Nick gets a badge", None).unwrap();
    store.add_memory("Charlie: Flash at the DMV", None).unwrap();

    let a_note = store.get(&a).unwrap().unwrap();
    let query = rich_text(&a_note.content, &a_note.context, &a_note.keywords);

    let hits = store.retrieve(&query, 2).unwrap();
    assert_eq!(hits.len(), 2);
    assert_eq!(hits[0].id, a);
    assert!(hits[0].score.abs() < 1e-6);
    assert_eq!(hits[1].id, b);
    assert!(hits[0].score <= hits[1].score);
}

#[test]
fn test_zero_k_and_empty_store() {
    let store = store_with(
        HashEmbedder::new(DIM),
        Arc::new(ScriptedCompleter::constant("{}")),
        Arc::new(RecordingIndex::new(DIM)),
    );
    assert!(store.retrieve("anything", 3).unwrap().is_empty());

    store.add_memory("Gazelle plays a concert", None).unwrap();
    assert!(store.retrieve("concert", 0).unwrap().is_empty());
    assert_eq!(store.retrieve("concert", 5).unwrap().len(), 1);
}

#[test]
fn test_default_k() {
    let store = store_with(
        HashEmbedder::new(DIM),
        Arc::new(ScriptedCompleter::constant("{}")),
        Arc::new(RecordingIndex::new(DIM)),
    );
    for i in 0..7 {
        store.add_memory(&format!("memory number {i}"), None).unwrap();
    }
    assert_eq!(store.len().unwrap(), 7);
    assert_eq!(store.retrieve_default("memory").unwrap().len(), 5);
}

#[test]
fn test_missing_metadata_defaults() {
    let index = Arc::new(RecordingIndex::new(DIM));
    index.seed("bare", axis(&[1.0]), "A note with no metadata", json!({}));
    index.seed(
        "odd",
        axis(&[0.9, 0.1]),
        "A note with legacy metadata",
        json!({"context": null, "tags": "sloth, dmv", "keywords": 3}),
    );
    let store = store_with(
        HashEmbedder::new(DIM).with_rule("probe", axis(&[1.0])),
        Arc::new(ScriptedCompleter::constant("{}")),
        index,
    );

    let hits = store.retrieve("probe", 2).unwrap();
    assert_eq!(hits[0].id, NoteId::new("bare"));
    assert_eq!(hits[0].context, "");
    assert!(hits[0].tags.is_empty());
    assert_eq!(hits[1].context, "");
    assert_eq!(hits[1].tags, vec!["sloth", "dmv"]);

    let note = store.get(&NoteId::new("odd")).unwrap().unwrap();
    assert!(note.keywords.is_empty());
    assert!(note.linked_ids.is_empty());
    assert!(store.get(&NoteId::new("nowhere")).unwrap().is_none());
}

#[test]
fn test_format_memories() {
    let hits = vec![
        RetrievedMemory {
            id: NoteId::new("1"),
            content: "Judy joined the ZPD".to_string(),
            context: "A rookie's first day".to_string(),
            tags: vec!["police".to_string(), "rookie".to_string()],
            score: 0.1,
        },
        RetrievedMemory {
            id: NoteId::new("2"),
            content: "Nick got his badge".to_string(),
            context: String::new(),
            tags: vec![],
            score: 0.4,
        },
    ];
    assert_eq!(
        format_memories(&hits),
        "- [tags: police,rookie] Judy joined the ZPD (context: A rookie's first day)\n\
         - [tags: ] Nick got his badge (context: )"
    );
    assert_eq!(format_memories(&[]), "");
}
