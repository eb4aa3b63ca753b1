//! The shared transport adapter.
//!
//! # Design
//! `ApiClient` keeps building a request separate from
//! parsing its response: `build_request` and `parse_response` are plain
//! functions over data, and the `Transport` impl only glues them to the
//! host's `HttpExecutor`. Session side effects (bearer header, clearing the
//! credential and notifying the host on 401) happen here, so hooks only see
//! an already-handled rejection.

use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use crate::config::ClientConfig;
use crate::credentials::CredentialStore;
use crate::error::TransportError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse};
use crate::transport::{HttpExecutor, Transport};

/// Called with the configured login path after a 401 cleared the session.
pub type UnauthorizedHandler = Arc<dyn Fn(&str) + Send + Sync>;

pub struct ApiClient<E, C> {
    config: ClientConfig,
    executor: E,
    credentials: Arc<C>,
    on_unauthorized: Option<UnauthorizedHandler>,
}

impl<E, C: CredentialStore> ApiClient<E, C> {
    pub fn new(config: ClientConfig, executor: E, credentials: Arc<C>) -> Self {
        Self {
            config,
            executor,
            credentials,
            on_unauthorized: None,
        }
    }

    /// Register the "send the user back to login" hook.
    pub fn on_unauthorized<F>(mut self, handler: F) -> Self
    where
        F: Fn(&str) + Send + Sync + 'static,
    {
        self.on_unauthorized = Some(Arc::new(handler));
        self
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn credentials(&self) -> &Arc<C> {
        &self.credentials
    }

    pub fn executor(&self) -> &E {
        &self.executor
    }

    fn url(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            return path.to_string();
        }
        if path.starts_with('/') {
            format!("{}{path}", self.config.base_url)
        } else {
            format!("{}/{path}", self.config.base_url)
        }
    }

    pub fn build_request(
        &self,
        method: HttpMethod,
        path: &str,
        body: Option<&Value>,
    ) -> Result<HttpRequest, TransportError> {
        let mut headers = vec![
            ("accept".to_string(), "application/json".to_string()),
            ("content-type".to_string(), "application/json".to_string()),
        ];
        if let Some(token) = self.credentials.token() {
            headers.push(("authorization".to_string(), format!("Bearer {token}")));
        }
        let body = body
            .map(serde_json::to_string)
            .transpose()
            .map_err(|e| TransportError::Encode(e.to_string()))?;
        Ok(HttpRequest {
            method,
            path: self.url(path),
            headers,
            body,
        })
    }

    pub fn parse_response(&self, response: HttpResponse) -> Result<Value, TransportError> {
        if response.is_success() {
            if response.body.trim().is_empty() {
                return Ok(Value::Null);
            }
            let mut envelope: Value = serde_json::from_str(&response.body)
                .map_err(|e| TransportError::Decode(e.to_string()))?;
            // Success bodies are `{"data": ...}`; anything else carries no data.
            return Ok(envelope
                .get_mut("data")
                .map(Value::take)
                .unwrap_or(Value::Null));
        }

        if response.status == 401 {
            tracing::warn!(login = %self.config.login_path, "unauthorized response, clearing session");
            self.credentials.clear();
            if let Some(handler) = &self.on_unauthorized {
                handler(&self.config.login_path);
            }
        }

        Err(TransportError::Status {
            status: response.status,
            payload: serde_json::from_str(&response.body).ok(),
        })
    }
}

impl<E: HttpExecutor, C: CredentialStore> Transport for ApiClient<E, C> {
    async fn request(
        &self,
        method: HttpMethod,
        path: &str,
        body: Option<&Value>,
    ) -> Result<Value, TransportError> {
        let request = self.build_request(method, path, body)?;
        tracing::debug!(%method, url = %request.path, "sending request");
        let response = self.executor.execute(request).await?;
        tracing::debug!(%method, status = response.status, "received response");
        self.parse_response(response)
    }
}

impl<E, C> fmt::Debug for ApiClient<E, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiClient")
            .field("config", &self.config)
            .field("on_unauthorized", &self.on_unauthorized.is_some())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::credentials::{Credentials, MemoryCredentialStore};
    use crate::types::ErrorDetail;
    use parking_lot::Mutex;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Answers every request with a canned response and records what it saw.
    struct CannedExecutor {
        response: HttpResponse,
        seen: Mutex<Vec<HttpRequest>>,
    }

    impl CannedExecutor {
        fn new(status: u16, body: &str) -> Self {
            Self {
                response: HttpResponse {
                    status,
                    headers: Vec::new(),
                    body: body.to_string(),
                },
                seen: Mutex::new(Vec::new()),
            }
        }
    }

    impl HttpExecutor for CannedExecutor {
        async fn execute(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
            self.seen.lock().push(request);
            Ok(self.response.clone())
        }
    }

    fn client(store: Arc<MemoryCredentialStore>) -> ApiClient<(), MemoryCredentialStore> {
        ApiClient::new(ClientConfig::new("http://localhost:3000"), (), store)
    }

    fn response(status: u16, body: &str) -> HttpResponse {
        HttpResponse {
            status,
            headers: Vec::new(),
            body: body.to_string(),
        }
    }

    #[test]
    fn build_request_without_token() {
        let c = client(Arc::new(MemoryCredentialStore::new()));
        let req = c.build_request(HttpMethod::Get, "/pets", None).unwrap();
        assert_eq!(req.method, HttpMethod::Get);
        assert_eq!(req.path, "http://localhost:3000/pets");
        assert_eq!(req.header("accept"), Some("application/json"));
        assert_eq!(req.header("authorization"), None);
        assert!(req.body.is_none());
    }

    #[test]
    fn build_request_attaches_bearer_token() {
        let store = Arc::new(MemoryCredentialStore::with_credentials(Credentials::bearer("t0k")));
        let c = client(store);
        let req = c
            .build_request(HttpMethod::Post, "pets", Some(&json!({"name": "Miu"})))
            .unwrap();
        assert_eq!(req.path, "http://localhost:3000/pets");
        assert_eq!(req.header("authorization"), Some("Bearer t0k"));
        let body: Value = serde_json::from_str(req.body.as_deref().unwrap()).unwrap();
        assert_eq!(body, json!({"name": "Miu"}));
    }

    #[test]
    fn absolute_paths_bypass_base_url() {
        let c = client(Arc::new(MemoryCredentialStore::new()));
        let req = c
            .build_request(HttpMethod::Delete, "https://other.example/pets/1", None)
            .unwrap();
        assert_eq!(req.path, "https://other.example/pets/1");
    }

    #[test]
    fn parse_empty_success_body_is_null() {
        let c = client(Arc::new(MemoryCredentialStore::new()));
        assert_eq!(c.parse_response(response(204, "")).unwrap(), Value::Null);
    }

    #[test]
    fn parse_success_json() {
        let c = client(Arc::new(MemoryCredentialStore::new()));
        let value = c.parse_response(response(200, r#"{"data":{"id":1}}"#)).unwrap();
        assert_eq!(value, json!({"id": 1}));
    }

    #[test]
    fn parse_success_unwraps_only_top_level_data() {
        let c = client(Arc::new(MemoryCredentialStore::new()));
        let value = c
            .parse_response(response(200, r#"{"data":{"data":[1,2]},"meta":{"page":1}}"#))
            .unwrap();
        assert_eq!(value, json!({"data": [1, 2]}));
    }

    #[test]
    fn parse_success_without_data_member_is_null() {
        let c = client(Arc::new(MemoryCredentialStore::new()));
        assert_eq!(c.parse_response(response(200, r#"{"id":1}"#)).unwrap(), Value::Null);
        assert_eq!(c.parse_response(response(200, "[1,2]")).unwrap(), Value::Null);
    }

    #[test]
    fn parse_success_bad_json() {
        let c = client(Arc::new(MemoryCredentialStore::new()));
        let err = c.parse_response(response(200, "not json")).unwrap_err();
        assert!(matches!(err, TransportError::Decode(_)));
    }

    #[test]
    fn parse_error_keeps_envelope() {
        let c = client(Arc::new(MemoryCredentialStore::new()));
        let err = c
            .parse_response(response(
                404,
                r#"{"error":{"type":"NotFound","description":"no such pet"}}"#,
            ))
            .unwrap_err();
        assert_eq!(err.status(), Some(404));
        assert_eq!(err.detail(), ErrorDetail::new("NotFound", "no such pet"));
    }

    #[test]
    fn parse_error_with_plain_text_body() {
        let c = client(Arc::new(MemoryCredentialStore::new()));
        let err = c.parse_response(response(500, "internal error")).unwrap_err();
        assert!(matches!(err, TransportError::Status { status: 500, payload: None }));
    }

    #[test]
    fn unauthorized_clears_session_and_notifies() {
        let store = Arc::new(MemoryCredentialStore::with_credentials(Credentials::bearer("old")));
        let calls = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&calls);
        let c = ApiClient::new(
            ClientConfig::new("http://localhost:3000").with_login_path("/signin"),
            (),
            Arc::clone(&store),
        )
        .on_unauthorized(move |login| {
            assert_eq!(login, "/signin");
            seen.fetch_add(1, Ordering::SeqCst);
        });

        let err = c
            .parse_response(response(401, r#"{"error":{"type":"Unauthorized","description":"expired"}}"#))
            .unwrap_err();
        assert_eq!(err.detail(), ErrorDetail::new("Unauthorized", "expired"));
        assert!(store.read().is_none());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn forbidden_does_not_clear_session() {
        let store = Arc::new(MemoryCredentialStore::with_credentials(Credentials::bearer("keep")));
        let c = client(Arc::clone(&store));
        let _ = c.parse_response(response(403, "")).unwrap_err();
        assert_eq!(store.token().as_deref(), Some("keep"));
    }

    #[tokio::test]
    async fn transport_request_runs_through_executor() {
        let store = Arc::new(MemoryCredentialStore::with_credentials(Credentials::bearer("t")));
        let c = ApiClient::new(
            ClientConfig::new("http://api.test"),
            CannedExecutor::new(201, r#"{"data":{"id":"p1"}}"#),
            store,
        );
        let value = c.post("/pets", &json!({"name": "Bo"})).await.unwrap();
        assert_eq!(value, json!({"id": "p1"}));

        let seen = c.executor().seen.lock();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].method, HttpMethod::Post);
        assert_eq!(seen[0].path, "http://api.test/pets");
        assert_eq!(seen[0].header("authorization"), Some("Bearer t"));
    }

    #[tokio::test]
    async fn typed_hook_receives_unwrapped_data() {
        #[derive(Debug, Clone, PartialEq, serde::Deserialize)]
        struct Session {
            token: String,
        }

        let c = Arc::new(ApiClient::new(
            ClientConfig::new("http://api.test"),
            CannedExecutor::new(200, r#"{"data":{"token":"abc"}}"#),
            Arc::new(MemoryCredentialStore::new()),
        ));
        let login: crate::hooks::PostMethod<_, Value, Session> =
            crate::hooks::PostMethod::new(c, "/auth/login");

        let session = Session {
            token: "abc".to_string(),
        };
        assert_eq!(login.execute_api(&json!({})).await, Some(session.clone()));
        let state = login.state();
        assert!(state.is_success && !state.is_error);
        assert_eq!(state.data, Some(session));
    }
}
