//! The two seams between the core and the outside world.
//!
//! `Transport` is what request hooks call through: verb plus path plus an
//! optional JSON body in, parsed JSON body or `TransportError` out.
//! `HttpExecutor` is what the host plugs into `ApiClient` to do the actual
//! network round-trip.

use std::future::Future;

use serde_json::Value;

use crate::error::TransportError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse};

/// Verb-based JSON transport.
pub trait Transport {
    fn request(
        &self,
        method: HttpMethod,
        path: &str,
        body: Option<&Value>,
    ) -> impl Future<Output = Result<Value, TransportError>>;

    fn get(&self, path: &str) -> impl Future<Output = Result<Value, TransportError>> {
        self.request(HttpMethod::Get, path, None)
    }

    fn post(&self, path: &str, body: &Value) -> impl Future<Output = Result<Value, TransportError>> {
        self.request(HttpMethod::Post, path, Some(body))
    }

    fn patch(&self, path: &str, body: &Value) -> impl Future<Output = Result<Value, TransportError>> {
        self.request(HttpMethod::Patch, path, Some(body))
    }

    fn delete(&self, path: &str) -> impl Future<Output = Result<Value, TransportError>> {
        self.request(HttpMethod::Delete, path, None)
    }
}

/// Host-supplied HTTP round-trip.
///
/// Implementations return `Ok` for every response the server produced,
/// whatever its status; `Err(TransportError::Network)` is reserved for
/// requests that never got an answer.
pub trait HttpExecutor {
    fn execute(
        &self,
        request: HttpRequest,
    ) -> impl Future<Output = Result<HttpResponse, TransportError>>;
}
