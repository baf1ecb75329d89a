//! Lenient parsing of completion output into a JSON object.
//!
//! Completion providers often ignore "return JSON" instructions: they wrap
//! the object in markdown fences or surround it with prose. Parsing tries, in
//! order, and the first success wins:
//!
//! 1. the whole (trimmed) text
//! 2. the text with leading/trailing code fences removed
//! 3. the span from the first `{` to the last `}` inclusive
//!
//! Anything else yields an empty map. Parsing never fails.

use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::constants::PARSE_LOG_PREVIEW_CHARS;

/// Parse completion output into a JSON object, or an empty map.
pub fn parse_response(raw: &str) -> Map<String, Value> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        debug!("Empty completion output");
        return Map::new();
    }

    if let Some(map) = parse_object(trimmed) {
        return map;
    }

    let unfenced = strip_code_fences(trimmed);
    if let Some(map) = parse_object(unfenced) {
        debug!("Parsed completion output after removing code fences");
        return map;
    }

    if let Some(span) = brace_span(trimmed) {
        if let Some(map) = parse_object(span) {
            debug!("Parsed completion output from embedded object");
            return map;
        }
    }

    warn!(
        "JSON parsing failed. Raw: {}...",
        preview(trimmed, PARSE_LOG_PREVIEW_CHARS)
    );
    Map::new()
}

fn parse_object(text: &str) -> Option<Map<String, Value>> {
    match serde_json::from_str::<Value>(text) {
        Ok(Value::Object(map)) => Some(map),
        _ => None,
    }
}

/// Remove a leading ```` ``` ```` or ```` ```json ```` line and a trailing ```` ``` ````.
fn strip_code_fences(text: &str) -> &str {
    let mut body = text;
    if let Some(rest) = body.strip_prefix("```") {
        // Drop the info string (e.g. `json`) up to the end of the fence line.
        body = match rest.find('\n') {
            Some(pos) => &rest[pos + 1..],
            None => rest.trim_start_matches(|c: char| c.is_ascii_alphanumeric()),
        };
    }
    if let Some(rest) = body.trim_end().strip_suffix("```") {
        body = rest;
    }
    body.trim()
}

/// Span from the first `{` to the last `}`, inclusive.
fn brace_span(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (end > start).then(|| &text[start..=end])
}

/// First `max_chars` characters of `text`, on a char boundary.
pub(crate) fn preview(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_json() {
        let map = parse_response(r#"{"context": "A rookie cop", "tags": ["police"]}"#);
        assert_eq!(map["context"], "A rookie cop");
        assert_eq!(map["tags"][0], "police");
    }

    #[test]
    fn test_fenced_json() {
        let raw = "```json\n{\"linked_memory_ids\": [\"a\", \"b\"]}\n```";
        let map = parse_response(raw);
        assert_eq!(map["linked_memory_ids"].as_array().unwrap().len(), 2);

        let bare_fence = "```\n{\"updates\": []}\n```";
        assert!(parse_response(bare_fence).contains_key("updates"));

        let one_line = "```json{\"a\": 1}```";
        assert_eq!(parse_response(one_line)["a"], 1);
    }

    #[test]
    fn test_prose_wrapped_json() {
        let raw = "Sure! Here is the analysis:\n{\"context\": \"x\", \"nested\": {\"k\": 1}}\nHope this helps.";
        let map = parse_response(raw);
        assert_eq!(map["context"], "x");
        assert_eq!(map["nested"]["k"], 1);
    }

    #[test]
    fn test_unparseable_yields_empty() {
        assert!(parse_response("I cannot help with that.").is_empty());
        assert!(parse_response("").is_empty());
        assert!(parse_response("   \n").is_empty());
        assert!(parse_response("} backwards {").is_empty());
        assert!(parse_response("{not: json}").is_empty());
    }

    #[test]
    fn test_non_object_json_yields_empty() {
        assert!(parse_response("[1, 2, 3]").is_empty());
        assert!(parse_response("\"just a string\"").is_empty());
        assert!(parse_response("42").is_empty());
    }

    #[test]
    fn test_preview_respects_char_boundaries() {
        assert_eq!(preview("朱迪警官", 2), "朱迪");
        assert_eq!(preview("short", 50), "short");
    }
}
