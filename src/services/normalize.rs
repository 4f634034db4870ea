//! Normalization adapter for the analysis service's inconsistent reply
//! shapes. Each caller-facing function runs an explicit, ordered list of
//! shape matchers and only reports `MalformedResponse` when none of them
//! locates a usable payload. Pipeline code never inspects raw values itself.

use crate::core::error::ServiceError;
use crate::core::state::CharacterRecord;
use crate::services::gateway::RawResult;
use serde_json::Value;

const CHUNK_MARKER: &str = "---CHUNK";

pub fn strip_code_blocks(s: &str) -> String {
    let s = s.trim();
    if s.starts_with("```json") {
        s.trim_start_matches("```json")
            .trim_end_matches("```")
            .trim()
            .to_string()
    } else if s.starts_with("```") {
        s.trim_start_matches("```")
            .trim_end_matches("```")
            .trim()
            .to_string()
    } else {
        s.to_string()
    }
}

/// Canonical roster from a JSON fetch. Shapes tried in order:
/// a `characters` wrapper object, a list whose entries are wrapper objects or
/// JSON-encoded wrapper strings, a bare list of character objects, and a
/// (possibly code-fenced) JSON-encoded wrapper string.
pub fn roster_from_result(object: &str, raw: &RawResult) -> Result<Vec<CharacterRecord>, ServiceError> {
    let value = raw.value.as_ref().ok_or_else(|| malformed(object, "reply carried no value"))?;
    roster_from_value(value).ok_or_else(|| malformed(object, "no roster field in any recognized shape"))
}

fn malformed(object: &str, detail: &str) -> ServiceError {
    ServiceError::MalformedResponse {
        object: object.to_string(),
        detail: detail.to_string(),
    }
}

fn roster_from_value(value: &Value) -> Option<Vec<CharacterRecord>> {
    if let Some(roster) = roster_wrapper(value) {
        return Some(roster);
    }
    if let Some(items) = value.as_array() {
        for item in items {
            let parsed = match item {
                Value::String(s) => roster_from_str(s),
                other => roster_wrapper(other),
            };
            if parsed.is_some() {
                return parsed;
            }
        }
        if !items.is_empty() && items.iter().all(|i| i.get("name").is_some()) {
            return records_from_array(items);
        }
        return None;
    }
    if let Some(s) = value.as_str() {
        return roster_from_str(s);
    }
    None
}

fn roster_from_str(s: &str) -> Option<Vec<CharacterRecord>> {
    let parsed: Value = serde_json::from_str(&strip_code_blocks(s)).ok()?;
    roster_wrapper(&parsed)
}

fn roster_wrapper(value: &Value) -> Option<Vec<CharacterRecord>> {
    let items = value.get("characters")?.as_array()?;
    records_from_array(items)
}

fn records_from_array(items: &[Value]) -> Option<Vec<CharacterRecord>> {
    let records: Vec<CharacterRecord> = items
        .iter()
        .filter_map(|item| serde_json::from_value(item.clone()).ok())
        .collect();
    // a wrapper whose entries all failed to parse is not a roster
    if records.is_empty() && !items.is_empty() {
        return None;
    }
    Some(records)
}

/// Ordered segment list from a JSON fetch of tagged text. Strings pass
/// through, objects contribute their `text` field, anything else is
/// re-encoded. Blank segments are dropped, not null-padded.
pub fn segments_from_value(value: &Value) -> Vec<String> {
    let segments = match value {
        Value::Array(items) => items.iter().map(segment_text).collect(),
        Value::String(s) => vec![s.clone()],
        other => vec![other.to_string()],
    };
    drop_blank(segments)
}

fn segment_text(item: &Value) -> String {
    match item {
        Value::String(s) => s.clone(),
        Value::Object(map) => match map.get("text").and_then(Value::as_str) {
            Some(text) => text.to_string(),
            None => item.to_string(),
        },
        other => other.to_string(),
    }
}

/// Split formatted text on service chunk markers (`---CHUNK ...---`).
/// Returns `None` when no marker is present, which signals the caller to
/// fall back to the JSON fetch path for per-chunk granularity.
pub fn split_chunk_markers(text: &str) -> Option<Vec<String>> {
    if !text.contains(CHUNK_MARKER) {
        return None;
    }
    let mut segments = Vec::new();
    let mut rest = text;
    while let Some(start) = rest.find(CHUNK_MARKER) {
        segments.push(rest[..start].to_string());
        let after = &rest[start + CHUNK_MARKER.len()..];
        match after.find("---") {
            Some(end) => rest = &after[end + 3..],
            None => {
                rest = "";
                break;
            }
        }
    }
    segments.push(rest.to_string());
    Some(drop_blank(segments))
}

fn drop_blank(segments: Vec<String>) -> Vec<String> {
    segments
        .into_iter()
        .filter(|s| !s.trim().is_empty())
        .collect()
}
