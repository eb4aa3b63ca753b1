//! Typed request hooks over a host-executed JSON transport.
//!
//! # Overview
//! A hook binds one HTTP verb to one endpoint and exposes the lifecycle of
//! its latest request as a `RequestState`. Requests go through a
//! `Transport`; the bundled `ApiClient` builds `HttpRequest` values, hands
//! them to a host-supplied `HttpExecutor`, and parses the `HttpResponse`
//! (host-does-IO pattern).
//!
//! # Design
//! - `state::transition` is a pure reducer; hooks only feed it events.
//! - `url::resolve` expands `:name` path segments and refuses to build a
//!   URL with missing parameters.
//! - Session handling (bearer header, 401 cleanup) sits in `ApiClient`
//!   behind an injected `CredentialStore`.

pub mod client;
pub mod config;
pub mod credentials;
pub mod error;
pub mod hooks;
pub mod http;
pub mod state;
pub mod transport;
pub mod types;
pub mod url;

pub use client::ApiClient;
pub use config::ClientConfig;
pub use credentials::{CredentialStore, Credentials, MemoryCredentialStore};
pub use error::{TemplateError, TransportError};
pub use hooks::{DeleteMethod, GetMethod, MethodConfig, PatchMethod, PostMethod, RequestHook, SettlementPolicy};
pub use http::{HttpMethod, HttpRequest, HttpResponse};
pub use state::{transition, RequestEvent, RequestState};
pub use transport::{HttpExecutor, Transport};
pub use types::ErrorDetail;
pub use url::{resolve, resolve_with, SubstitutionMode, UrlParams, UrlValue};
