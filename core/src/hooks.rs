//! Request hooks: one endpoint, one verb, one observable `RequestState`.
//!
//! # Design
//! Every verb runs through `RequestHook::execute`, configured by a
//! `MethodConfig` (verb, whether the endpoint is a template, whether the
//! body goes back to the caller). `PostMethod`, `PatchMethod`,
//! `DeleteMethod` and `GetMethod` only pin down the call signature.
//!
//! State lives in a `tokio::sync::watch` channel so consumers can either
//! take a snapshot with `state()` or `subscribe()` and react to changes.
//! Overlapping calls on one hook are not fenced by default: whichever
//! settles last decides the visible state. `SettlementPolicy::LatestRequestOnly`
//! switches on a generation check instead.

use std::marker::PhantomData;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tokio::sync::watch;

use crate::error::{TemplateError, TransportError};
use crate::http::HttpMethod;
use crate::state::{transition, RequestEvent, RequestState};
use crate::transport::Transport;
use crate::url::{self, UrlParams};

/// Per-verb behaviour of a hook.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MethodConfig {
    pub method: HttpMethod,
    pub templated: bool,
    pub returns_body: bool,
}

impl MethodConfig {
    pub const POST: MethodConfig = MethodConfig {
        method: HttpMethod::Post,
        templated: false,
        returns_body: true,
    };
    pub const PATCH: MethodConfig = MethodConfig {
        method: HttpMethod::Patch,
        templated: true,
        returns_body: false,
    };
    pub const DELETE: MethodConfig = MethodConfig {
        method: HttpMethod::Delete,
        templated: true,
        returns_body: false,
    };
    pub const GET: MethodConfig = MethodConfig {
        method: HttpMethod::Get,
        templated: true,
        returns_body: true,
    };
}

/// Which settlements may write into a hook's state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SettlementPolicy {
    /// Every settlement is applied, in the order they happen.
    #[default]
    LastSettlementWins,
    /// Only the most recently started request may settle into state.
    /// Older requests still return their own result to their caller.
    LatestRequestOnly,
}

pub struct RequestHook<T, Res> {
    transport: Arc<T>,
    endpoint: String,
    config: MethodConfig,
    policy: SettlementPolicy,
    state: Arc<watch::Sender<RequestState<Res>>>,
    generation: Arc<AtomicU64>,
}

impl<T, Res> Clone for RequestHook<T, Res> {
    fn clone(&self) -> Self {
        Self {
            transport: Arc::clone(&self.transport),
            endpoint: self.endpoint.clone(),
            config: self.config,
            policy: self.policy,
            state: Arc::clone(&self.state),
            generation: Arc::clone(&self.generation),
        }
    }
}

impl<T, Res> RequestHook<T, Res>
where
    T: Transport,
    Res: DeserializeOwned + Clone,
{
    pub fn new(transport: Arc<T>, endpoint: impl Into<String>, config: MethodConfig) -> Self {
        let (state, _) = watch::channel(RequestState::idle());
        Self {
            transport,
            endpoint: endpoint.into(),
            config,
            policy: SettlementPolicy::default(),
            state: Arc::new(state),
            generation: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn with_policy(mut self, policy: SettlementPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn config(&self) -> MethodConfig {
        self.config
    }

    pub fn policy(&self) -> SettlementPolicy {
        self.policy
    }

    pub fn state(&self) -> RequestState<Res> {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<RequestState<Res>> {
        self.state.subscribe()
    }

    fn dispatch(&self, event: RequestEvent<Res>) {
        self.state.send_modify(|state| {
            let current = std::mem::take(state);
            *state = transition(current, event);
        });
    }

    fn settle(&self, generation: u64, event: RequestEvent<Res>) {
        if self.policy == SettlementPolicy::LatestRequestOnly
            && self.generation.load(Ordering::SeqCst) != generation
        {
            tracing::debug!(endpoint = %self.endpoint, generation, "dropping stale settlement");
            return;
        }
        self.dispatch(event);
    }

    /// Run one request.
    ///
    /// Template errors are returned before `Start` is emitted. Transport
    /// and decoding failures end up in `state().error` and yield `Ok(None)`.
    pub async fn execute<B>(
        &self,
        params: &UrlParams,
        payload: Option<&B>,
    ) -> Result<Option<Res>, TemplateError>
    where
        B: Serialize + ?Sized,
    {
        let path = if self.config.templated {
            url::resolve(&self.endpoint, params)?
        } else {
            self.endpoint.clone()
        };

        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        self.dispatch(RequestEvent::Start);

        let outcome = match payload.map(serde_json::to_value).transpose() {
            Ok(body) => self
                .transport
                .request(self.config.method, &path, body.as_ref())
                .await
                .and_then(|value| {
                    serde_json::from_value::<Res>(value)
                        .map_err(|e| TransportError::Decode(e.to_string()))
                }),
            Err(e) => Err(TransportError::Encode(e.to_string())),
        };

        match outcome {
            Ok(data) => {
                self.settle(generation, RequestEvent::Success { data: data.clone() });
                Ok(self.config.returns_body.then_some(data))
            }
            Err(err) => {
                tracing::debug!(method = %self.config.method, %path, error = %err, "request failed");
                self.settle(generation, RequestEvent::Error { error: err.detail() });
                Ok(None)
            }
        }
    }
}

macro_rules! hook_accessors {
    () => {
        pub fn with_policy(mut self, policy: SettlementPolicy) -> Self {
            self.inner = self.inner.with_policy(policy);
            self
        }

        pub fn state(&self) -> RequestState<Res> {
            self.inner.state()
        }

        pub fn subscribe(&self) -> watch::Receiver<RequestState<Res>> {
            self.inner.subscribe()
        }

        pub fn endpoint(&self) -> &str {
            self.inner.endpoint()
        }

        pub fn hook(&self) -> &RequestHook<T, Res> {
            &self.inner
        }
    };
}

/// POST to a fixed endpoint, returning the response body.
pub struct PostMethod<T, Req, Res> {
    inner: RequestHook<T, Res>,
    _payload: PhantomData<fn(&Req)>,
}

impl<T, Req, Res> PostMethod<T, Req, Res>
where
    T: Transport,
    Req: Serialize,
    Res: DeserializeOwned + Clone,
{
    pub fn new(transport: Arc<T>, endpoint: impl Into<String>) -> Self {
        Self {
            inner: RequestHook::new(transport, endpoint, MethodConfig::POST),
            _payload: PhantomData,
        }
    }

    hook_accessors!();

    /// `None` when the request failed; see `state().error`.
    pub async fn execute_api(&self, payload: &Req) -> Option<Res> {
        // The endpoint is not templated, so resolution cannot fail.
        self.inner
            .execute(&UrlParams::new(), Some(payload))
            .await
            .unwrap_or(None)
    }
}

/// PATCH a templated endpoint. The response is only exposed through state.
///
/// A 2xx reply without data reaches the hook as JSON `null`; use
/// `Option<T>` or `Value` for `Res` when the endpoint may answer that way,
/// otherwise the decode failure is recorded as an error.
pub struct PatchMethod<T, Req, Res> {
    inner: RequestHook<T, Res>,
    _payload: PhantomData<fn(&Req)>,
}

impl<T, Req, Res> PatchMethod<T, Req, Res>
where
    T: Transport,
    Req: Serialize,
    Res: DeserializeOwned + Clone,
{
    pub fn new(transport: Arc<T>, endpoint: impl Into<String>) -> Self {
        Self {
            inner: RequestHook::new(transport, endpoint, MethodConfig::PATCH),
            _payload: PhantomData,
        }
    }

    hook_accessors!();

    pub async fn execute_api(&self, payload: &Req, params: &UrlParams) -> Result<(), TemplateError> {
        self.inner.execute(params, Some(payload)).await.map(drop)
    }
}

/// DELETE a templated endpoint.
///
/// A 204 decodes as `null`, so `Res` defaults to `Value`; `()` and
/// `Option<T>` work as well.
pub struct DeleteMethod<T, Res = Value> {
    inner: RequestHook<T, Res>,
}

impl<T, Res> DeleteMethod<T, Res>
where
    T: Transport,
    Res: DeserializeOwned + Clone,
{
    pub fn new(transport: Arc<T>, endpoint: impl Into<String>) -> Self {
        Self {
            inner: RequestHook::new(transport, endpoint, MethodConfig::DELETE),
        }
    }

    hook_accessors!();

    pub async fn execute_api(&self, params: &UrlParams) -> Result<(), TemplateError> {
        self.inner.execute::<Value>(params, None).await.map(drop)
    }
}

/// GET a templated endpoint, returning the response body.
pub struct GetMethod<T, Res> {
    inner: RequestHook<T, Res>,
}

impl<T, Res> GetMethod<T, Res>
where
    T: Transport,
    Res: DeserializeOwned + Clone,
{
    pub fn new(transport: Arc<T>, endpoint: impl Into<String>) -> Self {
        Self {
            inner: RequestHook::new(transport, endpoint, MethodConfig::GET),
        }
    }

    hook_accessors!();

    pub async fn execute_api(&self, params: &UrlParams) -> Result<Option<Res>, TemplateError> {
        self.inner.execute::<Value>(params, None).await
    }
}
