//! Interpretation of a 2xx response body.
//!
//! The body is parsed as JSON when possible. An unparseable body is kept
//! under a `raw` key and treated as a document with neither a `success`
//! flag nor an identifier, so it never fails the record by itself.

use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    /// The body carried `"success": false`.
    pub explicit_failure: bool,
    /// Identifier returned for the record, empty when absent.
    pub returned_id: String,
}

#[must_use]
pub fn classify(body: &str, external_id: &str) -> Classification {
    let document = parse_document(body);
    Classification {
        explicit_failure: matches!(document.get("success"), Some(Value::Bool(false))),
        returned_id: extract_returned_id(&document, external_id),
    }
}

fn parse_document(body: &str) -> Value {
    serde_json::from_str(body).unwrap_or_else(|e| {
        tracing::debug!(error = %e, "response body is not JSON, keeping raw text");
        serde_json::json!({ "raw": body })
    })
}

/// `data[external_id][0]`, with `null`, `"null"` and `""` mapped to empty.
fn extract_returned_id(document: &Value, external_id: &str) -> String {
    let first = document
        .get("data")
        .and_then(Value::as_object)
        .and_then(|data| data.get(external_id))
        .and_then(Value::as_array)
        .and_then(|entries| entries.first());

    match first {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) if s == "null" => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}
