//! Pulls a JSON object out of messy oracle output.
//!
//! Oracles wrap JSON in code fences, prepend prose, or return garbage.
//! The parser never errors: it strips fences, scans for the first
//! `{...}` span, falls back to decoding the whole trimmed text, and
//! degrades to an empty map when nothing decodes. Validating and
//! defaulting individual fields is the caller's job.

use std::sync::OnceLock;

use regex::Regex;
use serde_json::{Map, Value};

fn fence_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"```(?:json)?\s*").unwrap())
}

fn object_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    // Greedy: first `{` through last `}`, spanning newlines
    RE.get_or_init(|| Regex::new(r"\{[\s\S]*\}").unwrap())
}

/// Extract a JSON object from raw oracle text. Empty map on failure.
pub fn extract_payload(raw: &str) -> Map<String, Value> {
    let cleaned = fence_regex().replace_all(raw, "");

    if let Some(span) = object_regex().find(&cleaned) {
        if let Ok(Value::Object(map)) = serde_json::from_str::<Value>(span.as_str()) {
            return map;
        }
    }

    match serde_json::from_str::<Value>(cleaned.trim()) {
        Ok(Value::Object(map)) => map,
        _ => Map::new(),
    }
}
