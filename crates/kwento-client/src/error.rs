//! Error types for the Kwento API client.
//!
//! Every failed request is classified into one [`ErrorType`] and surfaced as
//! an immutable [`AppError`]. The type drives everything downstream: whether
//! the request is retried, whether the session is treated as expired, and
//! which message the learner sees.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A specialized `Result` type for API client operations.
pub type Result<T> = std::result::Result<T, ClientError>;

// ============================================================================
// Error taxonomy
// ============================================================================

/// The fixed set of failure categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorType {
    /// No HTTP response was received.
    #[serde(rename = "NETWORK_ERROR")]
    Network,
    /// 400: the request was rejected as malformed.
    #[serde(rename = "VALIDATION_ERROR")]
    Validation,
    /// 401: the credential was missing or rejected.
    #[serde(rename = "AUTHENTICATION_ERROR")]
    Authentication,
    /// 403: the credential is valid but lacks permission.
    #[serde(rename = "AUTHORIZATION_ERROR")]
    Authorization,
    /// 404: the resource does not exist.
    #[serde(rename = "NOT_FOUND_ERROR")]
    NotFound,
    /// 500, 502, 503, 504.
    #[serde(rename = "SERVER_ERROR")]
    Server,
    /// 408, or the request exceeded the client timeout.
    #[serde(rename = "TIMEOUT_ERROR")]
    Timeout,
    /// Anything else, including undecodable success bodies.
    #[serde(rename = "UNKNOWN_ERROR")]
    Unknown,
}

impl ErrorType {
    /// Returns `true` for the categories the client retries automatically.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::Network | Self::Timeout | Self::Server)
    }

    /// Fallback text shown when the server did not supply a message.
    #[must_use]
    pub const fn default_message(&self) -> &'static str {
        match self {
            Self::Network => {
                "Hindi makakonekta sa server. Pakisuri ang iyong internet connection."
            }
            Self::Validation => "May mali sa iyong input. Pakisuri at subukang muli.",
            Self::Authentication => "Nag-expire na ang iyong session. Mangyaring mag-login muli.",
            Self::Authorization => "Wala kang pahintulot na gawin ito.",
            Self::NotFound => "Hindi nahanap ang hinihinging resource.",
            Self::Server => "May problema sa server. Pakisubukang muli mamaya.",
            Self::Timeout => "Masyadong natagalan ang server. Pakisubukang muli.",
            Self::Unknown => "May hindi inaasahang error. Pakisubukang muli.",
        }
    }

    /// The wire name, e.g. `SERVER_ERROR`.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Network => "NETWORK_ERROR",
            Self::Validation => "VALIDATION_ERROR",
            Self::Authentication => "AUTHENTICATION_ERROR",
            Self::Authorization => "AUTHORIZATION_ERROR",
            Self::NotFound => "NOT_FOUND_ERROR",
            Self::Server => "SERVER_ERROR",
            Self::Timeout => "TIMEOUT_ERROR",
            Self::Unknown => "UNKNOWN_ERROR",
        }
    }
}

impl fmt::Display for ErrorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// AppError
// ============================================================================

/// A classified request failure.
///
/// Fields are private; the value cannot change once built.
#[derive(Debug, Clone, PartialEq, Serialize, thiserror::Error)]
#[serde(rename_all = "camelCase")]
#[error("{kind}: {message}")]
pub struct AppError {
    #[serde(rename = "type")]
    kind: ErrorType,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    status: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<Value>,
    created_at: DateTime<Utc>,
}

impl AppError {
    /// Creates an error with an explicit message.
    #[must_use]
    pub fn new(kind: ErrorType, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            status: None,
            details: None,
            created_at: Utc::now(),
        }
    }

    /// Creates an error carrying the category's fallback message.
    #[must_use]
    pub fn from_kind(kind: ErrorType) -> Self {
        Self::new(kind, kind.default_message())
    }

    /// Attaches the HTTP status code.
    #[must_use]
    pub fn with_status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }

    /// Attaches structured details (usually the response body).
    #[must_use]
    pub fn with_details(mut self, details: Value) -> Self {
        self.details = Some(details);
        self
    }

    /// The failure category.
    #[must_use]
    pub const fn kind(&self) -> ErrorType {
        self.kind
    }

    /// The server message, or the category fallback.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// HTTP status, when a response was received.
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        self.status
    }

    /// Structured details, when present.
    #[must_use]
    pub const fn details(&self) -> Option<&Value> {
        self.details.as_ref()
    }

    /// When the error was classified.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Shorthand for `self.kind().is_retryable()`.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        self.kind.is_retryable()
    }
}

// ============================================================================
// ClientError
// ============================================================================

/// Terminal outcome of a failed client call.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ClientError {
    /// The request failed and was classified.
    #[error(transparent)]
    App(#[from] AppError),

    /// The caller cancelled the request before it finished.
    #[error("Request cancelled")]
    Cancelled,
}

impl ClientError {
    /// The classified error, unless the request was cancelled.
    #[must_use]
    pub const fn app_error(&self) -> Option<&AppError> {
        match self {
            Self::App(error) => Some(error),
            Self::Cancelled => None,
        }
    }

    /// The error category, unless the request was cancelled.
    #[must_use]
    pub const fn kind(&self) -> Option<ErrorType> {
        match self {
            Self::App(error) => Some(error.kind()),
            Self::Cancelled => None,
        }
    }

    /// Returns `true` if the request was cancelled.
    #[must_use]
    pub const fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}

// ============================================================================
// Configuration errors
// ============================================================================

/// A client configuration value is out of range.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Invalid client configuration: {message}\n\nSuggestion: {suggestion}")]
pub struct ConfigError {
    /// What is wrong.
    pub message: String,
    /// How to fix it.
    pub suggestion: String,
}

impl ConfigError {
    /// Creates a new `ConfigError`.
    #[must_use]
    pub fn new(message: impl Into<String>, suggestion: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            suggestion: suggestion.into(),
        }
    }
}
