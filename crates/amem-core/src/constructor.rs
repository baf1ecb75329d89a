//! Note construction: derive context, keywords and tags for new content.

use std::sync::Arc;

use serde_json::{Map, Value};
use tracing::debug;

use crate::completion::{complete_json, CompletionProvider};
use crate::constants::{CONTEXT_FALLBACK_CHARS, META_CONTEXT, META_KEYWORDS, META_TAGS};
use crate::note::{string_field, string_list_field, NoteFields};
use crate::parser::{parse_response, preview};
use crate::prompts;

/// Asks the completion provider to analyze new content.
pub struct NoteConstructor {
    completer: Arc<dyn CompletionProvider>,
    system_role: String,
    fallback_chars: usize,
}

impl NoteConstructor {
    pub fn new(completer: Arc<dyn CompletionProvider>, system_role: impl Into<String>) -> Self {
        Self {
            completer,
            system_role: system_role.into(),
            fallback_chars: CONTEXT_FALLBACK_CHARS,
        }
    }

    /// Characters of content used as context when analysis fails.
    pub fn with_fallback_chars(mut self, chars: usize) -> Self {
        self.fallback_chars = chars;
        self
    }

    /// Derive fields for `content`. Never fails.
    pub fn construct(&self, content: &str) -> NoteFields {
        let prompt = prompts::note_construction(content);
        let raw = complete_json(
            self.completer.as_ref(),
            &prompt,
            &self.system_role,
            "Note construction",
        );
        let fields = fields_from_response(&parse_response(&raw), content, self.fallback_chars);
        debug!(
            "Constructed note fields: {} keywords, {} tags",
            fields.keywords.len(),
            fields.tags.len()
        );
        fields
    }
}

/// Read fields from a parsed analysis, filling gaps with fallbacks.
///
/// A missing or blank context becomes the first `fallback_chars` characters
/// of `content`; missing keywords or tags become empty lists.
pub fn fields_from_response(
    response: &Map<String, Value>,
    content: &str,
    fallback_chars: usize,
) -> NoteFields {
    let context = string_field(response, META_CONTEXT)
        .map(|c| c.trim().to_string())
        .filter(|c| !c.is_empty())
        .unwrap_or_else(|| preview(content, fallback_chars).to_string());

    NoteFields {
        context,
        keywords: string_list_field(response, META_KEYWORDS).unwrap_or_default(),
        tags: string_list_field(response, META_TAGS).unwrap_or_default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::ANALYSIS_SYSTEM_PROMPT;
    use crate::testing::{PromptKind, ScriptedCompletion};
    use serde_json::json;

    fn as_map(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_fields_from_full_response() {
        let fields = fields_from_response(
            &as_map(json!({
                "keywords": ["Judy", "police", "Zootopia"],
                "context": "Judy becomes the first rabbit officer.",
                "tags": ["career", "milestone", "police"]
            })),
            "Judy graduated top of her class",
            50,
        );
        assert_eq!(fields.context, "Judy becomes the first rabbit officer.");
        assert_eq!(fields.keywords, vec!["Judy", "police", "Zootopia"]);
        assert_eq!(fields.tags.len(), 3);
    }

    #[test]
    fn test_fallback_context_truncates() {
        let content = "Nick Wilde sells pawpsicles to lemmings outside the Tundratown office";
        let fields = fields_from_response(&Map::new(), content, 50);
        assert_eq!(fields.context, &content[..50]);
        assert!(fields.keywords.is_empty());
        assert!(fields.tags.is_empty());

        let blank = fields_from_response(&as_map(json!({"context": "  "})), "hello", 50);
        assert_eq!(blank.context, "hello");
    }

    #[test]
    fn test_construct_uses_analysis_role() {
        let completer = Arc::new(
            ScriptedCompletion::new()
                .with_analysis("```json\n{\"context\": \"A chase\", \"tags\": \"chase, night\"}\n```"),
        );
        let constructor = NoteConstructor::new(completer.clone(), ANALYSIS_SYSTEM_PROMPT);

        let fields = constructor.construct("Judy chased a weasel through Little Rodentia");
        assert_eq!(fields.context, "A chase");
        assert_eq!(fields.tags, vec!["chase", "night"]);

        let calls = completer.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].kind, PromptKind::Analysis);
        assert_eq!(calls[0].system_role.as_deref(), Some(ANALYSIS_SYSTEM_PROMPT));
        assert!(calls[0].prompt.contains("Little Rodentia"));
    }

    #[test]
    fn test_construct_degrades_on_failure() {
        let constructor = NoteConstructor::new(Arc::new(ScriptedCompletion::failing()), "sys")
            .with_fallback_chars(4);
        let fields = constructor.construct("hello world");
        assert_eq!(fields.context, "hell");
        assert!(fields.keywords.is_empty());
    }
}
