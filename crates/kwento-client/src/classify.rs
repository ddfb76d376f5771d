//! Turns raw failures into [`AppError`]s.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

use crate::error::{AppError, ErrorType};
use crate::transport::TransportError;

/// Words in a 401 message that indicate the session itself is gone, as
/// opposed to a resource-specific refusal.
static SESSION_EXPIRY: Lazy<Option<Regex>> =
    Lazy::new(|| Regex::new(r"(?i)token|session|expired|invalid|unauthorized").ok());

/// Maps an HTTP status to its category.
#[must_use]
pub const fn error_type_for_status(status: u16) -> ErrorType {
    match status {
        400 => ErrorType::Validation,
        401 => ErrorType::Authentication,
        403 => ErrorType::Authorization,
        404 => ErrorType::NotFound,
        408 => ErrorType::Timeout,
        500 | 502 | 503 | 504 => ErrorType::Server,
        _ => ErrorType::Unknown,
    }
}

/// The server-provided message in a JSON error body: `message`, then `error`.
#[must_use]
pub fn server_message(body: &Value) -> Option<&str> {
    ["message", "error"]
        .into_iter()
        .filter_map(|key| body.get(key).and_then(Value::as_str))
        .map(str::trim)
        .find(|message| !message.is_empty())
}

/// Classifies a non-2xx response.
///
/// A JSON body is attached as details; a non-JSON, non-empty body is attached
/// as a string.
#[must_use]
pub fn from_response(status: u16, body: &str) -> AppError {
    let kind = error_type_for_status(status);
    let details = if body.trim().is_empty() {
        None
    } else {
        Some(
            serde_json::from_str::<Value>(body)
                .unwrap_or_else(|_| Value::String(body.to_string())),
        )
    };

    let message = details
        .as_ref()
        .and_then(server_message)
        .map_or_else(|| kind.default_message().to_string(), ToString::to_string);

    let error = AppError::new(kind, message).with_status(status);
    match details {
        Some(details) => error.with_details(details),
        None => error,
    }
}

/// Classifies a failure where no response arrived.
#[must_use]
pub fn from_transport(error: &TransportError) -> AppError {
    let kind = match error {
        TransportError::Network(_) => ErrorType::Network,
        TransportError::Timeout(_) => ErrorType::Timeout,
    };
    AppError::from_kind(kind).with_details(Value::String(error.to_string()))
}

/// Returns `true` if an authentication error means the session has expired.
///
/// Matches the expiry keywords against the server-provided text. A 401
/// without any server message also counts as expiry. The backend exposes no
/// structured reason code, so this depends on free-text messages.
#[must_use]
pub fn is_session_expiry(error: &AppError) -> bool {
    if error.kind() != ErrorType::Authentication {
        return false;
    }

    let server_text = error.details().and_then(|details| match details {
        Value::String(text) => Some(text.clone()),
        Value::Null => None,
        other => server_message(other).map(ToString::to_string),
    });

    let Some(pattern) = SESSION_EXPIRY.as_ref() else {
        return false;
    };
    match server_text {
        Some(text) => pattern.is_match(&text),
        None => error.status() == Some(401) || pattern.is_match(error.message()),
    }
}
