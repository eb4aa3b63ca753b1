//! Wire DTOs shared by the transport and the request hooks.
//!
//! # Design
//! Backends report failures as `{"error": {"type": ..., "description": ...}}`.
//! Both inner fields are optional here because the core has to survive
//! payloads that only partly match that shape.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Normalized error stored in `RequestState::error`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorDetail {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl ErrorDetail {
    pub fn new(kind: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            kind: Some(kind.into()),
            description: Some(description.into()),
        }
    }

    /// Read `error.type` and `error.description` off an arbitrary payload.
    ///
    /// Fields that are missing or not strings come back as `None`.
    pub fn from_payload(payload: &Value) -> Self {
        let inner = payload.get("error");
        let field = |name: &str| {
            inner
                .and_then(|e| e.get(name))
                .and_then(Value::as_str)
                .map(str::to_string)
        };
        Self {
            kind: field("type"),
            description: field("description"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn detail_reads_nested_error_fields() {
        let payload = json!({"error": {"type": "NotFound", "description": "no such pet"}});
        assert_eq!(
            ErrorDetail::from_payload(&payload),
            ErrorDetail::new("NotFound", "no such pet")
        );
    }

    #[test]
    fn detail_tolerates_foreign_shapes() {
        assert_eq!(ErrorDetail::from_payload(&json!("boom")), ErrorDetail::default());
        assert_eq!(ErrorDetail::from_payload(&json!({"error": 5})), ErrorDetail::default());
        let partial = ErrorDetail::from_payload(&json!({"error": {"type": 401, "description": "x"}}));
        assert_eq!(partial.kind, None);
        assert_eq!(partial.description.as_deref(), Some("x"));
    }

    #[test]
    fn detail_serializes_kind_as_type() {
        let value = serde_json::to_value(ErrorDetail::new("E", "d")).unwrap();
        assert_eq!(value, json!({"type": "E", "description": "d"}));
    }
}
