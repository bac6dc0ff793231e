//! Best-effort parsing of JSON-shaped model output.
//!
//! Models are asked to answer with a JSON object but frequently wrap it in a
//! fenced code block or drift into prose. Normalization never fails: when the
//! text does not parse as a JSON object, the raw text is folded into a
//! degraded result instead.

use crate::types::SocialCues;
use log::debug;
use serde_json::{Map, Value};

const FENCE: &str = "```";
const JSON_FENCE: &str = "```json";

/// Structured fields recovered from a recognition response.
#[derive(Debug, Clone, PartialEq)]
pub struct RecognitionFields {
    pub objects_detected: Vec<Map<String, Value>>,
    pub description: String,
    pub suggestions: Vec<String>,
}

/// Strip a surrounding fenced code block, with or without a `json` tag.
pub fn strip_code_fence(raw: &str) -> &str {
    let mut text = raw.trim();
    if let Some(rest) = text.strip_prefix(JSON_FENCE) {
        text = rest;
    }
    if let Some(rest) = text.strip_prefix(FENCE) {
        text = rest;
    }
    if let Some(rest) = text.strip_suffix(FENCE) {
        text = rest;
    }
    text
}

/// Parse model output as a JSON object, tolerating code fences.
///
/// Returns `None` for malformed JSON and for JSON values that are not objects.
pub fn parse_json_object(raw: &str) -> Option<Map<String, Value>> {
    match serde_json::from_str::<Value>(strip_code_fence(raw)) {
        Ok(Value::Object(object)) => Some(object),
        Ok(other) => {
            debug!("model output is JSON but not an object (kind={})", kind(&other));
            None
        }
        Err(err) => {
            debug!("model output is not JSON: {err}");
            None
        }
    }
}

/// Normalize an object-recognition response.
pub fn normalize_recognition(raw: &str) -> RecognitionFields {
    let Some(parsed) = parse_json_object(raw) else {
        let mut unknown = Map::new();
        unknown.insert("name".to_string(), Value::from("Unknown"));
        unknown.insert("description".to_string(), Value::from(raw));
        unknown.insert("confidence".to_string(), Value::from("medium"));
        return RecognitionFields {
            objects_detected: vec![unknown],
            description: raw.to_string(),
            suggestions: Vec::new(),
        };
    };

    let objects_detected = match parsed.get("objects") {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|item| item.as_object().cloned())
            .collect(),
        _ => Vec::new(),
    };
    let description = parsed
        .get("scene_description")
        .and_then(Value::as_str)
        .map_or_else(|| raw.to_string(), str::to_string);
    RecognitionFields {
        objects_detected,
        description,
        suggestions: string_list(&parsed, "suggestions"),
    }
}

/// Normalize a social-cues response.
pub fn normalize_social_cues(raw: &str) -> SocialCues {
    match parse_json_object(raw) {
        Some(parsed) => SocialCues {
            prompts: string_list(&parsed, "prompts"),
            cultural_tips: string_list(&parsed, "cultural_tips"),
            common_phrases: string_list(&parsed, "common_phrases"),
        },
        None => SocialCues {
            prompts: vec![raw.to_string()],
            cultural_tips: Vec::new(),
            common_phrases: Vec::new(),
        },
    }
}

/// Read a list of strings; non-string entries keep their compact JSON text.
fn string_list(object: &Map<String, Value>, key: &str) -> Vec<String> {
    match object.get(key) {
        Some(Value::Array(items)) => items
            .iter()
            .map(|item| match item {
                Value::String(text) => text.clone(),
                other => other.to_string(),
            })
            .collect(),
        Some(Value::String(single)) => vec![single.clone()],
        _ => Vec::new(),
    }
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
