//! Client configuration.

use std::env;

pub const DEFAULT_BASE_URL: &str = "http://localhost:3000";
pub const DEFAULT_LOGIN_PATH: &str = "/auth/login";

/// Where the backend lives and where to send the user after a 401.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub base_url: String,
    pub login_path: String,
}

impl ClientConfig {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            login_path: DEFAULT_LOGIN_PATH.to_string(),
        }
    }

    pub fn with_login_path(mut self, login_path: &str) -> Self {
        self.login_path = login_path.to_string();
        self
    }

    /// Read `BACKEND_URL` and `LOGIN_PATH`, falling back to the defaults.
    pub fn from_env() -> Self {
        let base_url = env::var("BACKEND_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());
        let login_path = env::var("LOGIN_PATH").unwrap_or_else(|_| DEFAULT_LOGIN_PATH.to_string());
        Self::new(&base_url).with_login_path(&login_path)
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_URL)
    }
}
