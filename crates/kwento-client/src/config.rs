//! Client configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::retry::RetryPolicy;

/// Environment variable that overrides [`ClientConfig::base_url`].
pub const BASE_URL_ENV: &str = "KWENTO_API_BASE_URL";

/// Default API root.
fn default_base_url() -> String {
    "http://localhost:3000/api".to_string()
}

/// Default login page path.
fn default_login_path() -> String {
    "/login".to_string()
}

/// Default per-request timeout in seconds.
const fn default_request_timeout_secs() -> u64 {
    30
}

/// Settings for [`ApiClient`](crate::ApiClient).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientConfig {
    /// API root; request paths are appended to it.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Page the learner is sent to when the session expires.
    #[serde(default = "default_login_path")]
    pub login_path: String,

    /// Per-attempt timeout in seconds.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Automatic retry of transient failures.
    #[serde(default)]
    pub retry: RetryPolicy,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            login_path: default_login_path(),
            request_timeout_secs: default_request_timeout_secs(),
            retry: RetryPolicy::default(),
        }
    }
}

impl ClientConfig {
    /// Creates a default configuration pointed at `base_url`.
    #[must_use]
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    /// Applies [`BASE_URL_ENV`] from the process environment.
    pub fn apply_env(&mut self) {
        self.apply_env_from(|key| std::env::var(key).ok());
    }

    /// Applies overrides from `lookup`; blank values are ignored.
    pub fn apply_env_from(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(base_url) = lookup(BASE_URL_ENV).filter(|v| !v.trim().is_empty()) {
            self.base_url = base_url.trim().to_string();
        }
    }

    /// Per-attempt timeout.
    #[must_use]
    pub const fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Validates the configuration values.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] naming the offending field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.base_url.starts_with("http://") || self.base_url.starts_with("https://")) {
            return Err(ConfigError::new(
                format!("api.baseUrl must be an http(s) URL, got '{}'", self.base_url),
                format!("Set api.baseUrl in kwento.json or {BASE_URL_ENV}, e.g. https://kwento.example/api"),
            ));
        }

        if !self.login_path.starts_with('/') {
            return Err(ConfigError::new(
                format!("api.loginPath must start with '/', got '{}'", self.login_path),
                "Set api.loginPath to an absolute path such as /login",
            ));
        }

        if self.request_timeout_secs == 0 || self.request_timeout_secs > 300 {
            return Err(ConfigError::new(
                "api.requestTimeoutSecs must be between 1 and 300",
                "Set api.requestTimeoutSecs to a value like 30 in kwento.json",
            ));
        }

        if self.retry.max_retries > 10 {
            return Err(ConfigError::new(
                "api.retry.maxRetries must be at most 10",
                "Lower api.retry.maxRetries; the default is 3",
            ));
        }

        if self.retry.base_delay_ms > self.retry.max_delay_ms {
            return Err(ConfigError::new(
                "api.retry.baseDelayMs must not exceed api.retry.maxDelayMs",
                "Raise api.retry.maxDelayMs or lower api.retry.baseDelayMs",
            ));
        }

        Ok(())
    }
}
