//! Text discovery over a parsed legacy document.
//!
//! Parsers disagree about where paragraph text lives. The walker tries three
//! passes in order and returns the first that yields usable text:
//!
//! 1. **Known shapes**: `sections[]` (or `bodyText.sections[]`), where each
//!    section holds arrays of items with a string `text`, or items whose
//!    `content[]` is a run of `{ value }` characters.
//! 2. **Flat fields**: a top-level `text`, `content` or `body` string, each
//!    kept whole as one entry.
//! 3. **Every string**: an exhaustive traversal collecting every string
//!    longer than 5 characters that contains Hangul.
//!
//! Entries of 3 characters or fewer, or without Hangul, are dropped and the
//! rest deduplicated before joining with newlines. A flat document is a
//! single entry.

use super::ParsedDocument;
use crate::script;
use serde_json::Value;

const MIN_ENTRY_CHARS: usize = 3;
const MIN_DISCOVERED_CHARS: usize = 5;

/// Extract newline-joined text from `doc`. Empty when nothing qualifies.
pub fn walk(doc: &ParsedDocument) -> String {
    match doc {
        ParsedDocument::Flat(text) => finish(vec![text.clone()]),
        ParsedDocument::Tree(value) => {
            let passes: [fn(&Value) -> Vec<String>; 3] = [known_shapes, flat_fields, every_string];
            passes
                .iter()
                .map(|pass| finish(pass(value)))
                .find(|text| !text.is_empty())
                .unwrap_or_default()
        }
    }
}

fn finish(entries: Vec<String>) -> String {
    let mut kept: Vec<String> = Vec::new();
    for entry in entries {
        let entry = entry.trim();
        if entry.chars().count() > MIN_ENTRY_CHARS
            && script::contains_hangul(entry)
            && !kept.iter().any(|k| k == entry)
        {
            kept.push(entry.to_string());
        }
    }
    kept.join("\n")
}

// ── Pass 1: known shapes ─────────────────────────────────────────────────────

fn sections_of(value: &Value) -> Option<&Vec<Value>> {
    value
        .get("sections")
        .and_then(Value::as_array)
        .or_else(|| value.get("bodyText")?.get("sections")?.as_array())
}

fn known_shapes(value: &Value) -> Vec<String> {
    let Some(sections) = sections_of(value) else {
        return Vec::new();
    };
    let mut out = Vec::new();
    for section in sections {
        let Some(fields) = section.as_object() else {
            continue;
        };
        for items in fields.values().filter_map(Value::as_array) {
            for item in items {
                if let Some(text) = item.get("text").and_then(Value::as_str) {
                    out.push(text.to_string());
                } else if let Some(chars) = item.get("content").and_then(Value::as_array) {
                    let text = join_char_values(chars);
                    if !text.is_empty() {
                        out.push(text);
                    }
                }
            }
        }
    }
    out
}

/// Concatenate `{ value }` character records; numeric values are code points.
fn join_char_values(chars: &[Value]) -> String {
    let mut text = String::new();
    for c in chars {
        match c.get("value") {
            Some(Value::String(s)) => text.push_str(s),
            Some(Value::Number(n)) => {
                if let Some(ch) = n
                    .as_u64()
                    .and_then(|u| u32::try_from(u).ok())
                    .and_then(char::from_u32)
                    .filter(|ch| !ch.is_control())
                {
                    text.push(ch);
                }
            }
            _ => {}
        }
    }
    text
}

// ── Pass 2: flat fields ──────────────────────────────────────────────────────

fn flat_fields(value: &Value) -> Vec<String> {
    ["text", "content", "body"]
        .iter()
        .filter_map(|key| value.get(key).and_then(Value::as_str))
        .map(str::to_string)
        .collect()
}

// ── Pass 3: every string ─────────────────────────────────────────────────────

fn every_string(value: &Value) -> Vec<String> {
    let mut out = Vec::new();
    let mut pending = vec![value];
    while let Some(v) = pending.pop() {
        match v {
            Value::String(s)
                if s.chars().count() > MIN_DISCOVERED_CHARS && script::contains_hangul(s) =>
            {
                out.push(s.clone());
            }
            Value::Array(items) => pending.extend(items.iter().rev()),
            Value::Object(map) => pending.extend(map.values().rev()),
            _ => {}
        }
    }
    out
}
