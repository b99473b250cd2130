//! Structured-output extraction with prose fallback.
//!
//! Models are asked for JSON but frequently wrap it in markdown fences or
//! surrounding prose. Every step consumes the same tagged result instead of
//! re-sniffing the text, and absence of structure is an ordinary outcome,
//! never an error.

use std::sync::OnceLock;

use regex::Regex;
use serde_json::{Map, Value};

/// Outcome of trying to read a model's output as structured data.
#[derive(Debug, Clone, PartialEq)]
pub enum Extracted {
    /// A JSON object was found.
    Structured(Map<String, Value>),
    /// No usable JSON; the raw text stands in.
    Unstructured(String),
}

impl Extracted {
    /// Whether structured fields are available.
    pub fn is_structured(&self) -> bool {
        matches!(self, Extracted::Structured(_))
    }

    /// String field lookup on the structured variant.
    pub fn get_str(&self, key: &str) -> Option<&str> {
        match self {
            Extracted::Structured(map) => map.get(key).and_then(Value::as_str),
            Extracted::Unstructured(_) => None,
        }
    }

    /// Boolean field lookup on the structured variant.
    pub fn get_bool(&self, key: &str) -> Option<bool> {
        match self {
            Extracted::Structured(map) => map.get(key).and_then(Value::as_bool),
            Extracted::Unstructured(_) => None,
        }
    }

    /// Numeric field lookup on the structured variant.
    pub fn get_f64(&self, key: &str) -> Option<f64> {
        match self {
            Extracted::Structured(map) => map.get(key).and_then(Value::as_f64),
            Extracted::Unstructured(_) => None,
        }
    }

    /// String-array field lookup on the structured variant.
    pub fn get_str_array(&self, key: &str) -> Vec<String> {
        match self {
            Extracted::Structured(map) => map
                .get(key)
                .and_then(Value::as_array)
                .map(|items| {
                    items
                        .iter()
                        .filter_map(Value::as_str)
                        .map(str::to_string)
                        .collect()
                })
                .unwrap_or_default(),
            Extracted::Unstructured(_) => Vec::new(),
        }
    }

    /// Render for interpolation into a downstream prompt.
    pub fn to_prompt_text(&self) -> String {
        match self {
            Extracted::Structured(map) => {
                serde_json::to_string_pretty(&Value::Object(map.clone()))
                    .unwrap_or_else(|_| String::from("{}"))
            }
            Extracted::Unstructured(text) => text.clone(),
        }
    }

    /// The structured payload as a JSON value, if present.
    pub fn as_value(&self) -> Option<Value> {
        match self {
            Extracted::Structured(map) => Some(Value::Object(map.clone())),
            Extracted::Unstructured(_) => None,
        }
    }
}

fn fenced_block_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(?s)```(?:json)?\s*(.*?)\s*```").expect("fenced block pattern is valid")
    })
}

fn parse_object(text: &str) -> Option<Map<String, Value>> {
    match serde_json::from_str::<Value>(text) {
        Ok(Value::Object(map)) => Some(map),
        _ => None,
    }
}

/// Extract a JSON object from model output.
///
/// Tries, in order: direct parse, a fenced code block, the outermost
/// brace-to-brace substring. Falls back to `Unstructured` with the input
/// text verbatim. Extraction is idempotent: already-valid JSON and the
/// same JSON inside a fence produce the same structure.
pub fn extract(output: &str) -> Extracted {
    let trimmed = output.trim();

    if let Some(map) = parse_object(trimmed) {
        return Extracted::Structured(map);
    }

    if let Some(captures) = fenced_block_pattern().captures(trimmed) {
        if let Some(map) = parse_object(captures.get(1).map_or("", |m| m.as_str())) {
            return Extracted::Structured(map);
        }
    }

    if let (Some(open), Some(close)) = (trimmed.find('{'), trimmed.rfind('}')) {
        if open < close {
            if let Some(map) = parse_object(&trimmed[open..=close]) {
                return Extracted::Structured(map);
            }
        }
    }

    Extracted::Unstructured(output.to_string())
}
