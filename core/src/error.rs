//! Error types for the request layer.
//!
//! # Design
//! `TemplateError` is raised before a request exists, so templated hooks
//! return it to their caller. `TransportError` covers everything after the
//! request is built; hooks fold it into `RequestState::error` and never
//! return it.

use serde_json::Value;
use thiserror::Error;

use crate::types::ErrorDetail;

/// Failure to expand a URL template.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TemplateError {
    /// One or more placeholders had no entry in the parameter map.
    #[error("missing URL parameters: {}", .names.join(", "))]
    MissingUrlParameter { names: Vec<String> },
}

/// Rejection produced by a `Transport`.
#[derive(Debug, Clone, Error)]
pub enum TransportError {
    /// The server answered with a non-2xx status. `payload` is the JSON
    /// body when there was one.
    #[error("HTTP {status}")]
    Status { status: u16, payload: Option<Value> },

    /// The request never produced a response.
    #[error("network failure: {0}")]
    Network(String),

    /// The request payload could not be serialized to JSON.
    #[error("serialization failed: {0}")]
    Encode(String),

    /// The response body was not the JSON the caller expected.
    #[error("deserialization failed: {0}")]
    Decode(String),
}

impl TransportError {
    pub fn status(&self) -> Option<u16> {
        match self {
            TransportError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Normalize into the `{type, description}` pair hooks store.
    pub fn detail(&self) -> ErrorDetail {
        match self {
            TransportError::Status {
                payload: Some(payload),
                ..
            } => ErrorDetail::from_payload(payload),
            _ => ErrorDetail::default(),
        }
    }
}
