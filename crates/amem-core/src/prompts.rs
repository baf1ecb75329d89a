//! Prompt templates for note construction, link generation and evolution.
//!
//! Placeholders are `{name}`; literal JSON braces in the templates are left
//! alone because only known names are substituted.

use serde::Serialize;

use crate::note::{NoteFields, RetrievedMemory};

/// Asks for keywords, a one-sentence context and tags for new content.
pub const NOTE_CONSTRUCTION_PROMPT: &str = r#"
Generate a structured analysis of the following content by:
1. Identifying the most salient keywords (focus on nouns, verbs, and key concepts)
2. Extracting core themes and contextual elements
3. Creating relevant categorical tags

Format the response as a JSON object:
{
    "keywords": ["keyword1", "keyword2", ...], // Order from most to least important. At least 3.
    "context": "One sentence summarizing main topic, key arguments, and purpose.",
    "tags": ["tag1", "tag2", ...] // Broad categories/themes. At least 3.
}

Content for analysis:
{content}
"#;

/// Asks which neighbors the new note should link to.
pub const LINK_GENERATION_PROMPT: &str = r#"
You are an AI memory evolution agent. Analyze the new memory note and its nearest neighbors to determine meaningful connections.

New Memory:
Context: {new_context}
Content: {new_content}
Keywords: {new_keywords}

Nearest Neighbors:
{neighbors_info}

Determine if the new memory should be explicitly linked to any of the neighbors based on shared themes, causality, or contradiction.
Return a JSON object:
{
    "linked_memory_ids": ["id_1", "id_2"] // List of IDs from neighbors that should be linked. Empty list if none.
}
"#;

/// Asks whether neighbors' context or tags should change.
pub const MEMORY_EVOLUTION_PROMPT: &str = r#"
You are an AI memory evolution agent. Analyze the new memory and its neighbors.
Your goal is to "evolve" the neighbors - update their tags or context if the new information changes our understanding of them (e.g., adding a new perspective).

New Memory: {new_content}
Neighbors:
{neighbors_info}

Return a JSON object with updates for neighbors (only include if updates are needed):
{
    "updates": [
        {
            "id": "neighbor_id",
            "new_context": "Updated context summary...",
            "new_tags": ["tag1", "tag2", "new_tag"]
        }
    ]
}
"#;

/// Substitute `{name}` placeholders in a single pass.
///
/// Substituted values are never rescanned, so content containing
/// `{neighbors_info}` stays literal.
pub fn render(template: &str, vars: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let tail = &rest[open..];

        let hit = vars.iter().find_map(|(name, value)| {
            let inner = tail.strip_prefix('{')?.strip_prefix(*name)?;
            inner.strip_prefix('}').map(|after| (*value, after))
        });

        match hit {
            Some((value, after)) => {
                out.push_str(value);
                rest = after;
            }
            None => {
                out.push('{');
                rest = &tail[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

/// Note construction prompt for `content`.
pub fn note_construction(content: &str) -> String {
    render(NOTE_CONSTRUCTION_PROMPT, &[("content", content)])
}

/// Link generation prompt for a new note against its neighbors.
pub fn link_generation(content: &str, fields: &NoteFields, neighbors: &[RetrievedMemory]) -> String {
    let keywords = keywords_list(&fields.keywords);
    let neighbors_info = neighbors_info(neighbors);
    render(
        LINK_GENERATION_PROMPT,
        &[
            ("new_context", fields.context.as_str()),
            ("new_content", content),
            ("new_keywords", keywords.as_str()),
            ("neighbors_info", neighbors_info.as_str()),
        ],
    )
}

/// Memory evolution prompt for new content against its neighbors.
pub fn memory_evolution(content: &str, neighbors: &[RetrievedMemory]) -> String {
    let neighbors_info = neighbors_info(neighbors);
    render(
        MEMORY_EVOLUTION_PROMPT,
        &[
            ("new_content", content),
            ("neighbors_info", neighbors_info.as_str()),
        ],
    )
}

#[derive(Serialize)]
struct NeighborInfo<'a> {
    id: &'a str,
    content: &'a str,
    context: &'a str,
}

/// Neighbors as a JSON array of `{id, content, context}`, non-ASCII kept as is.
pub fn neighbors_info(neighbors: &[RetrievedMemory]) -> String {
    let infos: Vec<NeighborInfo<'_>> = neighbors
        .iter()
        .map(|n| NeighborInfo {
            id: n.id.as_str(),
            content: &n.content,
            context: &n.context,
        })
        .collect();
    serde_json::to_string(&infos).unwrap_or_else(|_| "[]".to_string())
}

fn keywords_list(keywords: &[String]) -> String {
    serde_json::to_string(keywords).unwrap_or_else(|_| "[]".to_string())
}
