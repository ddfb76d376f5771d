//! Kwento API client
//!
//! A REST client that turns every call into "data or a classified
//! [`AppError`]": it attaches the stored bearer token, retries transient
//! failures with exponential backoff, ends the session on credential expiry,
//! and supports cancellation of in-flight calls.

pub mod classify;
pub mod client;
pub mod config;
pub mod credentials;
pub mod error;
pub mod handler;
pub mod navigator;
pub mod retry;
pub mod transport;

pub use client::{ApiClient, RequestOptions};
pub use config::{ClientConfig, BASE_URL_ENV};
pub use credentials::{
    CredentialProvider, FileTokenStore, MemoryTokenStore, StoredCredentials, TokenStore, AUTH_KEYS,
    TOKEN_KEYS,
};
pub use error::{AppError, ClientError, ConfigError, ErrorType, Result};
pub use handler::{friendly_message, ErrorHandler, HandleOptions, Handled, LogNotifier, Notifier};
pub use navigator::{LoggingNavigator, Navigator};
pub use retry::{retry_with_backoff, RetryPolicy, RetryState};
pub use transport::{ApiRequest, ApiResponse, Method, ReqwestTransport, Transport, TransportError};

pub use tokio_util::sync::CancellationToken;
