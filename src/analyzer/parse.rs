//! Suggestion batch parsing — all-or-nothing.
//!
//! The one place an AI response becomes structured data. A batch is
//! either fully valid or fully rejected: a single malformed entry
//! discards everything, so no partially-trusted structure ever reaches
//! draft creation.

use crate::analyzer::models::SuggestedEntity;
use crate::error::PortalError;
use anyhow::Result;

/// Parse a generator response into a suggestion batch.
///
/// Accepts either a bare JSON array or an object with a `suggestions`
/// array, optionally wrapped in a markdown code fence. Anything else —
/// malformed JSON, an unknown entity type, a confidence outside [0, 1],
/// an empty name — rejects the whole batch with `ValidationFailed`.
pub fn parse_suggestion_batch(raw: &str) -> Result<Vec<SuggestedEntity>> {
    let cleaned = strip_code_fences(raw);

    let value: serde_json::Value = serde_json::from_str(cleaned)
        .map_err(|e| PortalError::ValidationFailed(format!("suggestion batch is not JSON: {}", e)))?;

    let list = match value {
        serde_json::Value::Array(_) => value,
        serde_json::Value::Object(ref obj) if obj.get("suggestions").is_some_and(|s| s.is_array()) => {
            obj["suggestions"].clone()
        }
        _ => {
            return Err(PortalError::ValidationFailed(
                "suggestion batch is neither an array nor {suggestions: [...]}".to_string(),
            )
            .into())
        }
    };

    let suggestions: Vec<SuggestedEntity> = serde_json::from_value(list)
        .map_err(|e| PortalError::ValidationFailed(format!("malformed suggestion entry: {}", e)))?;

    for suggestion in &suggestions {
        if suggestion.name.trim().is_empty() {
            return Err(PortalError::ValidationFailed(
                "suggestion with empty name".to_string(),
            )
            .into());
        }
        if !(0.0..=1.0).contains(&suggestion.confidence) {
            return Err(PortalError::ValidationFailed(format!(
                "confidence {} outside [0, 1] for '{}'",
                suggestion.confidence, suggestion.name
            ))
            .into());
        }
    }

    Ok(suggestions)
}

/// Strip a surrounding markdown code fence (``` or ```json) if present.
pub(crate) fn strip_code_fences(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(body) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let body = match body.split_once('\n') {
        Some((_info, rest)) => rest,
        None => body,
    };
    body.strip_suffix("```").unwrap_or(body).trim()
}
