//! Persisted session credentials.
//!
//! The transport reads the token from here on every request and clears it
//! when the backend answers 401. Login and logout flows live outside this
//! crate and only ever call `write` and `clear`.

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A bearer token plus the cached user profile that came with it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Credentials {
    pub token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<Value>,
}

impl Credentials {
    pub fn bearer(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            user: None,
        }
    }
}

/// Read/write/clear access to the persisted credential.
pub trait CredentialStore {
    fn read(&self) -> Option<Credentials>;
    fn write(&self, credentials: Credentials);
    fn clear(&self);

    fn token(&self) -> Option<String> {
        self.read().map(|c| c.token).filter(|t| !t.is_empty())
    }
}

/// In-process store, suitable for tests and for hosts that persist
/// elsewhere.
#[derive(Debug, Default)]
pub struct MemoryCredentialStore {
    inner: RwLock<Option<Credentials>>,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_credentials(credentials: Credentials) -> Self {
        Self {
            inner: RwLock::new(Some(credentials)),
        }
    }
}

impl CredentialStore for MemoryCredentialStore {
    fn read(&self) -> Option<Credentials> {
        self.inner.read().clone()
    }

    fn write(&self, credentials: Credentials) {
        *self.inner.write() = Some(credentials);
    }

    fn clear(&self) {
        *self.inner.write() = None;
    }
}
