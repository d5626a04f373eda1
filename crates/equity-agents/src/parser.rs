//! Locating the JSON object in a model's final answer

use agent_core::{Error, Result};
use serde_json::Value;

/// Extract the first JSON object from an answer that may carry prose around it
///
/// Tries, in order, the whole text, a ```json or bare ``` fenced block, and
/// the first balanced `{ ... }` outside string literals.
pub fn extract_json(text: &str) -> Result<Value> {
    let trimmed = text.trim();

    if trimmed.starts_with('{') {
        if let Ok(value @ Value::Object(_)) = serde_json::from_str::<Value>(trimmed) {
            return Ok(value);
        }
    }

    let candidates = [fenced_block(trimmed), first_object(trimmed)];
    for candidate in candidates.into_iter().flatten() {
        if let Ok(value @ Value::Object(_)) = serde_json::from_str::<Value>(candidate) {
            return Ok(value);
        }
    }

    Err(Error::OutputParse(format!(
        "no JSON object found in answer (length={})",
        text.len()
    )))
}

fn fenced_block(text: &str) -> Option<&str> {
    ["```json\n", "```json\r\n", "```\n", "```\r\n"]
        .iter()
        .find_map(|marker| {
            let start = text.find(marker)? + marker.len();
            let end = text[start..].find("```")?;
            Some(text[start..start + end].trim())
        })
}

fn first_object(text: &str) -> Option<&str> {
    let mut depth = 0usize;
    let mut start = None;
    let mut in_string = false;
    let mut escaped = false;

    for (i, ch) in text.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match ch {
            '\\' if in_string => escaped = true,
            '"' => in_string = !in_string,
            '{' if !in_string => {
                if depth == 0 {
                    start = Some(i);
                }
                depth += 1;
            }
            '}' if !in_string && depth > 0 => {
                depth -= 1;
                if depth == 0 {
                    return start.map(|s| &text[s..=i]);
                }
            }
            _ => {}
        }
    }
    None
}

/// Field as a list of strings, skipping non-string entries
pub fn string_list(value: &Value, field: &str) -> Vec<String> {
    value
        .get(field)
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(|item| item.as_str().map(str::to_string))
                .collect()
        })
        .unwrap_or_default()
}

/// Numeric field, accepting numbers written as strings
pub fn number(value: &Value, field: &str) -> Option<f64> {
    match value.get(field)? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().trim_end_matches('%').parse().ok(),
        _ => None,
    }
}
