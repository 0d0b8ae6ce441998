use common::types::CanonicalSchema;
use serde_json::Value;
use tracing::debug;

/// What a model handed back: already-parsed JSON or raw text.
#[derive(Debug, Clone, PartialEq)]
pub enum ModelOutput {
    Structured(Value),
    Text(String),
}

impl From<String> for ModelOutput {
    fn from(text: String) -> Self {
        ModelOutput::Text(text)
    }
}

impl From<&str> for ModelOutput {
    fn from(text: &str) -> Self {
        ModelOutput::Text(text.to_string())
    }
}

impl From<Value> for ModelOutput {
    fn from(value: Value) -> Self {
        ModelOutput::Structured(value)
    }
}

/// Extracts a canonical schema, failing closed: any table without
/// `name`/`columns` or column without `name`/`data_type` yields `None`.
pub fn extract_schema(output: &ModelOutput) -> Option<CanonicalSchema> {
    let value = match output {
        ModelOutput::Structured(value) => value.clone(),
        ModelOutput::Text(text) => parse_text(text)?,
    };

    if !value.get("tables").is_some_and(Value::is_array) {
        debug!("model output has no tables array");
        return None;
    }

    match serde_json::from_value::<CanonicalSchema>(value) {
        Ok(schema) if !schema.tables.is_empty() => Some(schema),
        Ok(_) => None,
        Err(err) => {
            debug!(error = %err, "model output failed schema validation");
            None
        }
    }
}

fn parse_text(text: &str) -> Option<Value> {
    let cleaned = text.trim();

    let delimited = (cleaned.starts_with('{') && cleaned.ends_with('}'))
        || (cleaned.starts_with('[') && cleaned.ends_with(']'));
    if delimited {
        if let Ok(value) = serde_json::from_str(cleaned) {
            return Some(value);
        }
    }

    if let Some(inner) = fence_interior(cleaned, "```json") {
        return serde_json::from_str(inner).ok();
    }
    if let Some(inner) = fence_interior(cleaned, "```") {
        return serde_json::from_str(strip_fence_label(inner)).ok();
    }
    None
}

/// Text between the first `marker` and the next closing fence (or the end).
fn fence_interior<'a>(text: &'a str, marker: &str) -> Option<&'a str> {
    let start = text.find(marker)? + marker.len();
    let rest = &text[start..];
    let end = rest.find("```").unwrap_or(rest.len());
    Some(rest[..end].trim())
}

fn strip_fence_label(inner: &str) -> &str {
    match inner.split_once('\n') {
        Some((label, body)) if !label.is_empty() && label.chars().all(|c| c.is_ascii_alphanumeric()) => {
            body.trim()
        }
        _ => inner,
    }
}
