// src/protocol/validate.rs — Trust boundary for oracle output
//
// Strict parse-then-validate pipeline: raw text → fence strip → JSON parse
// (MalformedPayload) → typed deserialization + structural checks
// (SchemaViolation). Nothing past this function may assume well-formed
// oracle input.

use crate::infra::errors::ApsisError;
use crate::protocol::{schema_err, SearchSpec};

/// Parse and validate a raw oracle payload into a SearchSpec.
pub fn parse_search_spec(raw: &str) -> Result<SearchSpec, ApsisError> {
    let cleaned = strip_fences(raw);

    let value: serde_json::Value = serde_json::from_str(cleaned)
        .map_err(|e| ApsisError::MalformedPayload(e.to_string()))?;

    let spec: SearchSpec = serde_json::from_value(value)
        .map_err(|e| schema_err("search_spec", e.to_string()))?;

    spec.validate()?;
    Ok(spec)
}

/// Remove an enclosing markdown code fence, with or without a language tag.
/// Models frequently wrap JSON in ```json … ``` despite being told not to.
fn strip_fences(raw: &str) -> &str {
    let mut s = raw.trim();
    if let Some(rest) = s.strip_prefix("```") {
        // Drop the language tag up to the first newline, if any.
        s = match rest.split_once('\n') {
            Some((_tag, body)) => body,
            None => rest,
        };
        s = s.strip_suffix("```").unwrap_or(s);
    }
    s.trim()
}
