//! Lifecycle of a single request as a reducer.
//!
//! `transition` is pure and total: any event is accepted from any state, and
//! an event decoded from an unknown tag leaves the state untouched.

use serde::{Deserialize, Serialize};

use crate::types::ErrorDetail;

/// Snapshot of one hook's request lifecycle.
///
/// `is_error` and `is_success` are never both true. `data` survives a later
/// `Start` or `Error`; `error` survives a later `Start`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestState<T> {
    pub is_loading: bool,
    pub is_error: bool,
    pub is_success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorDetail>,
}

impl<T> RequestState<T> {
    pub fn idle() -> Self {
        Self {
            is_loading: false,
            is_error: false,
            is_success: false,
            data: None,
            error: None,
        }
    }

    pub fn is_idle(&self) -> bool {
        !self.is_loading && !self.is_error && !self.is_success
    }
}

impl<T> Default for RequestState<T> {
    fn default() -> Self {
        Self::idle()
    }
}

/// Input to `transition`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum RequestEvent<T> {
    Start,
    Success { data: T },
    Error { error: ErrorDetail },
    #[serde(other)]
    Unrecognized,
}

/// Apply `event` to `state`.
pub fn transition<T>(state: RequestState<T>, event: RequestEvent<T>) -> RequestState<T> {
    match event {
        RequestEvent::Start => RequestState {
            is_loading: true,
            is_success: false,
            ..state
        },
        RequestEvent::Success { data } => RequestState {
            is_loading: false,
            is_error: false,
            is_success: true,
            data: Some(data),
            ..state
        },
        RequestEvent::Error { error } => RequestState {
            is_loading: false,
            is_error: true,
            is_success: false,
            error: Some(error),
            ..state
        },
        RequestEvent::Unrecognized => state,
    }
}
