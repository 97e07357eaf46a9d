//! Client configuration.
//!
//! Replaces an ambient settings singleton: the base URL, secret key and
//! stream policies are collected into [`ApiConfig`] and handed to
//! [`GooseClient`](crate::client::GooseClient) at construction.

use std::path::PathBuf;
use std::time::Duration;

use crate::error::{ClientError, ClientResult};

/// Base URL used when none is configured
pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:62996";
/// Secret key used when none is configured
pub const DEFAULT_SECRET_KEY: &str = "test";

pub const ENV_BASE_URL: &str = "GOOSE_SERVER_URL";
pub const ENV_SECRET_KEY: &str = "GOOSE_SECRET_KEY";
pub const ENV_WORKING_DIR: &str = "GOOSE_WORKING_DIR";

/// What to do with a `data:` frame that does not decode into an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DecodeErrorPolicy {
    /// Report the frame through `on_decode_error` and keep streaming
    #[default]
    SkipFrame,
    /// Fail the request with a decode error
    Abort,
}

/// Configuration for talking to a Goose backend.
///
/// Use the builder methods to customize.
///
/// # Example
///
/// ```
/// use goose_client::config::{ApiConfig, DecodeErrorPolicy};
///
/// let config = ApiConfig::default()
///     .with_base_url("http://localhost:3000")
///     .with_secret_key("s3cret")
///     .with_decode_error_policy(DecodeErrorPolicy::Abort);
/// assert_eq!(config.base_url, "http://localhost:3000");
/// ```
#[derive(Clone)]
pub struct ApiConfig {
    /// Backend base URL, without a trailing path
    pub base_url: String,
    /// Sent as `X-Secret-Key` on every request
    pub secret_key: String,
    /// Default `session_working_dir` for new requests
    pub working_dir: String,
    /// Malformed-frame handling for streams
    pub decode_error_policy: DecodeErrorPolicy,
    /// TCP connect timeout for all requests
    pub connect_timeout: Duration,
    /// Overall timeout for the status probe
    pub probe_timeout: Duration,
    /// How long to keep reading a non-200 body before failing with what
    /// arrived so far
    pub error_body_timeout: Duration,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            secret_key: DEFAULT_SECRET_KEY.to_string(),
            working_dir: default_working_dir(),
            decode_error_policy: DecodeErrorPolicy::default(),
            connect_timeout: Duration::from_secs(10),
            probe_timeout: Duration::from_secs(5),
            error_body_timeout: Duration::from_secs(2),
        }
    }
}

impl std::fmt::Debug for ApiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiConfig")
            .field("base_url", &self.base_url)
            .field("secret_key", &"<redacted>")
            .field("working_dir", &self.working_dir)
            .field("decode_error_policy", &self.decode_error_policy)
            .field("connect_timeout", &self.connect_timeout)
            .field("probe_timeout", &self.probe_timeout)
            .field("error_body_timeout", &self.error_body_timeout)
            .finish()
    }
}

impl ApiConfig {
    /// Create a new ApiConfig with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create config from `GOOSE_SERVER_URL`, `GOOSE_SECRET_KEY` and
    /// `GOOSE_WORKING_DIR`. Unset or empty variables fall back to defaults.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Some(url) = non_empty_env(ENV_BASE_URL) {
            config.base_url = url;
        }
        if let Some(key) = non_empty_env(ENV_SECRET_KEY) {
            config.secret_key = key;
        }
        if let Some(dir) = non_empty_env(ENV_WORKING_DIR) {
            config.working_dir = dir;
        }
        config
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    pub fn with_secret_key(mut self, key: impl Into<String>) -> Self {
        self.secret_key = key.into();
        self
    }

    pub fn with_working_dir(mut self, dir: impl Into<String>) -> Self {
        self.working_dir = dir.into();
        self
    }

    pub fn with_decode_error_policy(mut self, policy: DecodeErrorPolicy) -> Self {
        self.decode_error_policy = policy;
        self
    }

    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    pub fn with_probe_timeout(mut self, timeout: Duration) -> Self {
        self.probe_timeout = timeout;
        self
    }

    pub fn with_error_body_timeout(mut self, timeout: Duration) -> Self {
        self.error_body_timeout = timeout;
        self
    }

    /// Resolve `path` against the base URL.
    ///
    /// Fails with `InvalidRequest` when the base URL is not an absolute
    /// http(s) URL.
    pub fn endpoint(&self, path: &str) -> ClientResult<String> {
        let parsed = reqwest::Url::parse(&self.base_url).map_err(|e| {
            ClientError::InvalidRequest {
                message: format!("invalid base URL '{}': {}", self.base_url, e),
            }
        })?;

        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(ClientError::InvalidRequest {
                message: format!(
                    "unsupported scheme '{}' in base URL '{}'",
                    parsed.scheme(),
                    self.base_url
                ),
            });
        }

        Ok(format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        ))
    }
}

fn non_empty_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|value| !value.trim().is_empty())
}

/// Current directory, falling back to the home directory.
fn default_working_dir() -> String {
    std::env::current_dir()
        .ok()
        .or_else(dirs::home_dir)
        .unwrap_or_else(|| PathBuf::from("."))
        .to_string_lossy()
        .into_owned()
}
