//! The resilient API client.
//!
//! Every call runs the same pipeline:
//!
//! 1. attach the bearer token from the [`CredentialProvider`], if any
//! 2. dispatch through the [`Transport`] and time the attempt
//! 3. on 2xx, log and hand back the body
//! 4. otherwise classify the failure; then
//!    - authentication errors that look like session expiry clear the stored
//!      credentials and redirect to the login page (unless the call's
//!      [`RequestOptions`] suppress the redirect); other authentication
//!      errors are only logged
//!    - retryable errors wait out the backoff delay and re-dispatch, up to
//!      the policy's retry limit
//!    - everything else is returned to the caller
//!
//! Each call owns a [`CancellationToken`]. Cancelling it resolves the call
//! to [`ClientError::Cancelled`] immediately, whether it is waiting on the
//! network or sleeping between retries.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{json, Value};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::classify;
use crate::config::ClientConfig;
use crate::credentials::CredentialProvider;
use crate::error::{AppError, ClientError, ErrorType, Result};
use crate::navigator::{self, Navigator};
use crate::retry::RetryState;
use crate::transport::{
    ApiRequest, ApiResponse, Method, ReqwestTransport, Transport, TransportError,
};

/// Per-call client options.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RequestOptions {
    /// Stay on the current page when the session expires. Credentials are
    /// still cleared.
    pub suppress_redirect: bool,
}

impl RequestOptions {
    /// Options that keep the learner on the current page.
    #[must_use]
    pub const fn without_redirect() -> Self {
        Self {
            suppress_redirect: true,
        }
    }
}

/// HTTP client with authentication, classification, retry and session
/// handling.
#[derive(Debug, Clone)]
pub struct ApiClient {
    config: ClientConfig,
    transport: Arc<dyn Transport>,
    credentials: Arc<dyn CredentialProvider>,
    navigator: Arc<dyn Navigator>,
}

impl ApiClient {
    /// Creates a client over an explicit transport.
    #[must_use]
    pub fn new(
        config: ClientConfig,
        transport: Arc<dyn Transport>,
        credentials: Arc<dyn CredentialProvider>,
        navigator: Arc<dyn Navigator>,
    ) -> Self {
        Self {
            config,
            transport,
            credentials,
            navigator,
        }
    }

    /// Creates a client over [`ReqwestTransport`] using the configured timeout.
    pub fn from_config(
        config: ClientConfig,
        credentials: Arc<dyn CredentialProvider>,
        navigator: Arc<dyn Navigator>,
    ) -> std::result::Result<Self, TransportError> {
        let transport = ReqwestTransport::new(config.request_timeout())?;
        Ok(Self::new(config, Arc::new(transport), credentials, navigator))
    }

    /// The active configuration.
    #[must_use]
    pub const fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Resolves `path` against the base URL; absolute URLs pass through.
    #[must_use]
    pub fn url_for(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            return path.to_string();
        }
        format!(
            "{}/{}",
            self.config.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    // ------------------------------------------------------------------------
    // Verbs
    // ------------------------------------------------------------------------

    /// GET `path`.
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        self.get_with_cancel(path, &CancellationToken::new()).await
    }

    /// GET `path`, abandoning it when `cancel` fires.
    pub async fn get_with_cancel<T: DeserializeOwned>(
        &self,
        path: &str,
        cancel: &CancellationToken,
    ) -> Result<T> {
        self.request(Method::Get, path, None, cancel).await
    }

    /// POST `body` as JSON to `path`.
    pub async fn post<B, T>(&self, path: &str, body: &B) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.post_with_cancel(path, body, &CancellationToken::new()).await
    }

    /// POST with cancellation.
    pub async fn post_with_cancel<B, T>(
        &self,
        path: &str,
        body: &B,
        cancel: &CancellationToken,
    ) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let body = to_json(body)?;
        self.request(Method::Post, path, Some(body), cancel).await
    }

    /// PUT `body` as JSON to `path`.
    pub async fn put<B, T>(&self, path: &str, body: &B) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.put_with_cancel(path, body, &CancellationToken::new()).await
    }

    /// PUT with cancellation.
    pub async fn put_with_cancel<B, T>(
        &self,
        path: &str,
        body: &B,
        cancel: &CancellationToken,
    ) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let body = to_json(body)?;
        self.request(Method::Put, path, Some(body), cancel).await
    }

    /// PATCH `body` as JSON to `path`.
    pub async fn patch<B, T>(&self, path: &str, body: &B) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.patch_with_cancel(path, body, &CancellationToken::new()).await
    }

    /// PATCH with cancellation.
    pub async fn patch_with_cancel<B, T>(
        &self,
        path: &str,
        body: &B,
        cancel: &CancellationToken,
    ) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let body = to_json(body)?;
        self.request(Method::Patch, path, Some(body), cancel).await
    }

    /// DELETE `path`.
    pub async fn delete<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        self.delete_with_cancel(path, &CancellationToken::new()).await
    }

    /// DELETE with cancellation.
    pub async fn delete_with_cancel<T: DeserializeOwned>(
        &self,
        path: &str,
        cancel: &CancellationToken,
    ) -> Result<T> {
        self.request(Method::Delete, path, None, cancel).await
    }

    /// Sends a request and decodes the JSON response.
    ///
    /// An empty body decodes as JSON `null`. A body that does not decode as
    /// `T` yields an `UNKNOWN_ERROR` with the decoder message in the details.
    pub async fn request<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
        cancel: &CancellationToken,
    ) -> Result<T> {
        self.request_with_options(method, path, body, RequestOptions::default(), cancel)
            .await
    }

    /// [`request`](Self::request) with per-call options.
    pub async fn request_with_options<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
        options: RequestOptions,
        cancel: &CancellationToken,
    ) -> Result<T> {
        let mut request = ApiRequest::new(method, self.url_for(path));
        if let Some(body) = body {
            request = request.with_json(body);
        }
        let response = self.execute_with_options(request, options, cancel).await?;
        decode(&response)
    }

    // ------------------------------------------------------------------------
    // Pipeline
    // ------------------------------------------------------------------------

    /// Runs the full pipeline for one logical request and returns the raw
    /// successful response.
    pub async fn execute(
        &self,
        request: ApiRequest,
        cancel: &CancellationToken,
    ) -> Result<ApiResponse> {
        self.execute_with_options(request, RequestOptions::default(), cancel)
            .await
    }

    /// [`execute`](Self::execute) with per-call options.
    pub async fn execute_with_options(
        &self,
        request: ApiRequest,
        options: RequestOptions,
        cancel: &CancellationToken,
    ) -> Result<ApiResponse> {
        let policy = self.config.retry;
        let mut state = RetryState::default();

        loop {
            let mut attempt = request.clone();
            if let Some(token) = self.credentials.token() {
                attempt
                    .headers
                    .push(("Authorization".to_string(), format!("Bearer {token}")));
            }

            let started = Instant::now();
            let outcome = tokio::select! {
                biased;
                () = cancel.cancelled() => {
                    debug!(method = %request.method, url = %request.url, "Request cancelled");
                    return Err(ClientError::Cancelled);
                }
                outcome = self.transport.send(attempt) => outcome,
            };
            let duration_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);

            let error = match outcome {
                Ok(response) if response.is_success() => {
                    info!(
                        method = %request.method,
                        url = %request.url,
                        status = response.status,
                        duration_ms,
                        retries = state.attempt,
                        "API request succeeded"
                    );
                    return Ok(response);
                }
                Ok(response) => classify::from_response(response.status, &response.body),
                Err(e) => classify::from_transport(&e),
            };

            if error.kind() == ErrorType::Authentication {
                self.handle_authentication_failure(&error, options);
                return Err(error.into());
            }

            if !(error.is_retryable() && state.can_retry(&policy)) {
                warn!(
                    method = %request.method,
                    url = %request.url,
                    status = error.status(),
                    kind = %error.kind(),
                    duration_ms,
                    retries = state.attempt,
                    "API request failed"
                );
                return Err(error.into());
            }

            let delay = state.advance(&policy);
            warn!(
                method = %request.method,
                url = %request.url,
                kind = %error.kind(),
                attempt = state.attempt,
                max_retries = policy.max_retries,
                delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                "API request failed, retrying"
            );
            tokio::select! {
                biased;
                () = cancel.cancelled() => {
                    debug!(url = %request.url, "Request cancelled during backoff");
                    return Err(ClientError::Cancelled);
                }
                () = tokio::time::sleep(delay) => {}
            }
        }
    }

    /// Clears credentials and redirects on session expiry; otherwise logs.
    fn handle_authentication_failure(&self, error: &AppError, options: RequestOptions) {
        if !classify::is_session_expiry(error) {
            warn!(
                status = error.status(),
                message = error.message(),
                "Authentication error without session expiry; not redirecting"
            );
            return;
        }

        self.credentials.clear();
        if options.suppress_redirect {
            info!("Session expired; credentials cleared, redirect suppressed");
            return;
        }
        let redirected =
            navigator::redirect_to_login(self.navigator.as_ref(), &self.config.login_path);
        info!(
            redirected,
            login_path = %self.config.login_path,
            "Session expired; credentials cleared"
        );
    }
}

fn to_json<B: Serialize + ?Sized>(body: &B) -> Result<Value> {
    serde_json::to_value(body).map_err(|e| {
        AppError::from_kind(ErrorType::Unknown)
            .with_details(json!({ "encodeError": e.to_string() }))
            .into()
    })
}

fn decode<T: DeserializeOwned>(response: &ApiResponse) -> Result<T> {
    let decoded = if response.body.trim().is_empty() {
        serde_json::from_value(Value::Null)
    } else {
        serde_json::from_str(&response.body)
    };
    decoded.map_err(|e| {
        AppError::from_kind(ErrorType::Unknown)
            .with_status(response.status)
            .with_details(json!({ "decodeError": e.to_string() }))
            .into()
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::fmt;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Mutex;
    use std::time::Duration;

    use async_trait::async_trait;
    use serde::Deserialize;

    use super::*;
    use crate::credentials::{MemoryTokenStore, StoredCredentials, TokenStore};
    use crate::navigator::LoggingNavigator;

    type Respond = Box<dyn Fn(u32) -> std::result::Result<ApiResponse, TransportError> + Send + Sync>;

    /// Transport that answers from a closure of the zero-based call index.
    struct FakeTransport {
        respond: Respond,
        calls: AtomicU32,
        seen: Mutex<Vec<(ApiRequest, Instant)>>,
    }

    impl fmt::Debug for FakeTransport {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.debug_struct("FakeTransport")
                .field("calls", &self.calls)
                .finish_non_exhaustive()
        }
    }

    impl FakeTransport {
        fn new(
            respond: impl Fn(u32) -> std::result::Result<ApiResponse, TransportError>
                + Send
                + Sync
                + 'static,
        ) -> Arc<Self> {
            Arc::new(Self {
                respond: Box::new(respond),
                calls: AtomicU32::new(0),
                seen: Mutex::new(Vec::new()),
            })
        }

        fn always(status: u16, body: &'static str) -> Arc<Self> {
            Self::new(move |_| Ok(ApiResponse::new(status, body)))
        }

        fn calls(&self) -> u32 {
            self.calls.load(Ordering::SeqCst)
        }

        fn requests(&self) -> Vec<ApiRequest> {
            self.seen.lock().unwrap().iter().map(|(r, _)| r.clone()).collect()
        }

        fn send_times(&self) -> Vec<Instant> {
            self.seen.lock().unwrap().iter().map(|(_, t)| *t).collect()
        }
    }

    #[async_trait]
    impl Transport for FakeTransport {
        async fn send(
            &self,
            request: ApiRequest,
        ) -> std::result::Result<ApiResponse, TransportError> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            self.seen.lock().unwrap().push((request, Instant::now()));
            (self.respond)(call)
        }
    }

    /// Transport that never answers.
    #[derive(Debug)]
    struct HangingTransport;

    #[async_trait]
    impl Transport for HangingTransport {
        async fn send(
            &self,
            _request: ApiRequest,
        ) -> std::result::Result<ApiResponse, TransportError> {
            std::future::pending().await
        }
    }

    /// Navigator that counts redirects.
    #[derive(Debug)]
    struct CountingNavigator {
        inner: LoggingNavigator,
        redirects: AtomicU32,
    }

    impl Navigator for CountingNavigator {
        fn current_path(&self) -> String {
            self.inner.current_path()
        }

        fn redirect(&self, path: &str) {
            self.redirects.fetch_add(1, Ordering::SeqCst);
            self.inner.redirect(path);
        }
    }

    struct Harness {
        client: ApiClient,
        credentials: Arc<StoredCredentials<MemoryTokenStore>>,
        navigator: Arc<CountingNavigator>,
    }

    fn harness_at(transport: Arc<dyn Transport>, path: &str) -> Harness {
        let credentials = Arc::new(StoredCredentials::new(MemoryTokenStore::with_entries([
            ("accessToken", "tok-123"),
            ("refreshToken", "ref-456"),
            ("user", r#"{"id":7}"#),
        ])));
        let navigator = Arc::new(CountingNavigator {
            inner: LoggingNavigator::new(path),
            redirects: AtomicU32::new(0),
        });
        let client = ApiClient::new(
            ClientConfig::with_base_url("http://api.test/api"),
            transport,
            credentials.clone(),
            navigator.clone(),
        );
        Harness {
            client,
            credentials,
            navigator,
        }
    }

    fn harness(transport: Arc<dyn Transport>) -> Harness {
        harness_at(transport, "/dashboard")
    }

    #[derive(Debug, Deserialize, PartialEq)]
    struct Lesson {
        id: u32,
        title: String,
    }

    #[test]
    fn test_url_for() {
        let h = harness(FakeTransport::always(200, "{}"));
        assert_eq!(h.client.url_for("/lessons/1"), "http://api.test/api/lessons/1");
        assert_eq!(h.client.url_for("lessons"), "http://api.test/api/lessons");
        assert_eq!(h.client.url_for("https://cdn.test/x"), "https://cdn.test/x");
    }

    #[tokio::test]
    async fn test_success_decodes_and_sends_bearer_token() {
        let transport = FakeTransport::always(200, r#"{"id":1,"title":"Si Pagong"}"#);
        let h = harness(transport.clone());

        let lesson: Lesson = h.client.get("/lessons/1").await.unwrap();

        assert_eq!(
            lesson,
            Lesson {
                id: 1,
                title: "Si Pagong".to_string()
            }
        );
        let requests = transport.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].method, Method::Get);
        assert_eq!(requests[0].url, "http://api.test/api/lessons/1");
        assert_eq!(requests[0].header("Authorization"), Some("Bearer tok-123"));
    }

    #[tokio::test]
    async fn test_no_token_means_no_authorization_header() {
        let transport = FakeTransport::always(200, "{}");
        let h = harness(transport.clone());
        h.credentials.clear();

        let _: Value = h.client.get("/leaderboard").await.unwrap();
        assert_eq!(transport.requests()[0].header("Authorization"), None);
    }

    #[tokio::test]
    async fn test_post_sends_json_body() {
        let transport = FakeTransport::always(201, r#"{"ok":true}"#);
        let h = harness(transport.clone());

        let response: Value = h
            .client
            .post("/activities/5/attempts", &json!({"score": 2}))
            .await
            .unwrap();

        assert_eq!(response["ok"], true);
        let request = &transport.requests()[0];
        assert_eq!(request.method, Method::Post);
        assert_eq!(request.body, Some(json!({"score": 2})));
    }

    #[tokio::test]
    async fn test_empty_body_decodes_as_null() {
        let h = harness(FakeTransport::always(204, ""));
        h.client.delete::<()>("/stories/9").await.unwrap();
        let nothing: Option<Lesson> = h.client.delete("/stories/9").await.unwrap();
        assert!(nothing.is_none());
    }

    #[tokio::test]
    async fn test_undecodable_body_is_unknown_error() {
        let h = harness(FakeTransport::always(200, r#"{"unexpected":true}"#));
        let error = h.client.get::<Lesson>("/lessons/1").await.unwrap_err();

        let app = error.app_error().unwrap();
        assert_eq!(app.kind(), ErrorType::Unknown);
        assert_eq!(app.status(), Some(200));
        assert!(app.details().unwrap()["decodeError"].is_string());
    }

    #[tokio::test(start_paused = true)]
    async fn test_server_error_is_attempted_four_times() {
        let transport = FakeTransport::always(503, r#"{"message":"down for maintenance"}"#);
        let h = harness(transport.clone());
        let started = Instant::now();

        let error = h.client.get::<Value>("/dashboard").await.unwrap_err();

        assert_eq!(transport.calls(), 4);
        let app = error.app_error().unwrap();
        assert_eq!(app.kind(), ErrorType::Server);
        assert_eq!(app.status(), Some(503));
        assert_eq!(app.message(), "down for maintenance");

        let times = transport.send_times();
        let gaps: Vec<_> = times.windows(2).map(|w| w[1] - w[0]).collect();
        assert_eq!(
            gaps,
            vec![
                Duration::from_secs(1),
                Duration::from_secs(2),
                Duration::from_secs(4)
            ]
        );
        assert_eq!(started.elapsed(), Duration::from_secs(7));
    }

    #[tokio::test(start_paused = true)]
    async fn test_transient_failures_recover() {
        let transport = FakeTransport::new(|call| match call {
            0 => Err(TransportError::Network("connection reset".into())),
            1 => Err(TransportError::Timeout("30s elapsed".into())),
            _ => Ok(ApiResponse::new(200, r#"{"id":2,"title":"Ang Alamat"}"#)),
        });
        let h = harness(transport.clone());

        let lesson: Lesson = h.client.get("/lessons/2").await.unwrap();

        assert_eq!(lesson.id, 2);
        assert_eq!(transport.calls(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_token_is_reread_on_retry() {
        let transport = FakeTransport::new(|call| {
            if call == 0 {
                Ok(ApiResponse::new(502, ""))
            } else {
                Ok(ApiResponse::new(200, "null"))
            }
        });
        let h = harness(transport.clone());
        let client = h.client.clone();
        let credentials = h.credentials.clone();

        let request = client.get::<Value>("/x");
        let rotate = async {
            tokio::time::sleep(Duration::from_millis(500)).await;
            credentials.store().set("accessToken", "tok-rotated");
        };
        let (result, ()) = futures::join!(request, rotate);

        result.unwrap();
        let requests = transport.requests();
        assert_eq!(requests[0].header("Authorization"), Some("Bearer tok-123"));
        assert_eq!(requests[1].header("Authorization"), Some("Bearer tok-rotated"));
    }

    #[tokio::test]
    async fn test_non_retryable_errors_fail_fast() {
        for (status, kind) in [
            (400, ErrorType::Validation),
            (403, ErrorType::Authorization),
            (404, ErrorType::NotFound),
            (409, ErrorType::Unknown),
        ] {
            let transport = FakeTransport::always(status, r#"{"error":"nope"}"#);
            let h = harness(transport.clone());

            let error = h.client.get::<Value>("/x").await.unwrap_err();

            assert_eq!(transport.calls(), 1, "status {status}");
            assert_eq!(error.kind(), Some(kind));
            assert_eq!(error.app_error().unwrap().message(), "nope");
            assert_eq!(h.navigator.redirects.load(Ordering::SeqCst), 0);
        }
    }

    #[tokio::test]
    async fn test_expired_session_clears_storage_and_redirects() {
        let transport = FakeTransport::always(401, r#"{"message":"Token expired"}"#);
        let h = harness(transport.clone());

        let error = h.client.get::<Value>("/dashboard").await.unwrap_err();

        assert_eq!(error.kind(), Some(ErrorType::Authentication));
        assert_eq!(transport.calls(), 1);
        assert!(h.credentials.token().is_none());
        assert!(h.credentials.store().is_empty());
        assert_eq!(h.navigator.current_path(), "/login");
        assert_eq!(h.navigator.redirects.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_resource_refusal_does_not_redirect() {
        let transport = FakeTransport::always(401, r#"{"message":"You do not own this resource"}"#);
        let h = harness(transport.clone());

        let error = h.client.get::<Value>("/classes/3").await.unwrap_err();

        assert_eq!(error.kind(), Some(ErrorType::Authentication));
        assert_eq!(
            error.app_error().unwrap().message(),
            "You do not own this resource"
        );
        assert_eq!(h.credentials.token().as_deref(), Some("tok-123"));
        assert_eq!(h.navigator.current_path(), "/dashboard");
        assert_eq!(h.navigator.redirects.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_expiry_on_login_page_clears_without_redirect() {
        let transport = FakeTransport::always(401, "");
        let h = harness_at(transport, "/login");

        h.client.get::<Value>("/me").await.unwrap_err();

        assert!(h.credentials.token().is_none());
        assert_eq!(h.navigator.redirects.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_expiry_with_redirect_suppressed_stays_on_page() {
        let transport = FakeTransport::always(401, r#"{"message":"Token expired"}"#);
        let h = harness(transport);

        let error = h
            .client
            .request_with_options::<Value>(
                Method::Get,
                "/dashboard",
                None,
                RequestOptions::without_redirect(),
                &CancellationToken::new(),
            )
            .await
            .unwrap_err();

        assert_eq!(error.kind(), Some(ErrorType::Authentication));
        assert!(h.credentials.token().is_none());
        assert_eq!(h.navigator.current_path(), "/dashboard");
        assert_eq!(h.navigator.redirects.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_concurrent_expiry_redirects_once() {
        let transport = FakeTransport::always(401, r#"{"message":"Session expired"}"#);
        let h = harness(transport.clone());

        let (a, b) = futures::join!(h.client.get::<Value>("/a"), h.client.get::<Value>("/b"));

        assert!(a.is_err() && b.is_err());
        assert_eq!(transport.calls(), 2);
        assert_eq!(h.navigator.redirects.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_during_backoff() {
        let transport = FakeTransport::always(503, "");
        let h = harness(transport.clone());
        let cancel = CancellationToken::new();

        let request = h.client.get_with_cancel::<Value>("/x", &cancel);
        let trigger = async {
            tokio::time::sleep(Duration::from_millis(1500)).await;
            cancel.cancel();
        };
        let started = Instant::now();
        let (result, ()) = futures::join!(request, trigger);

        assert_eq!(result.unwrap_err(), ClientError::Cancelled);
        // First attempt at 0s, retry at 1s, cancelled while waiting for 3s
        assert_eq!(transport.calls(), 2);
        assert_eq!(started.elapsed(), Duration::from_millis(1500));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_during_dispatch() {
        let h = harness(Arc::new(HangingTransport));
        let cancel = CancellationToken::new();

        let request = h.client.get_with_cancel::<Value>("/slow", &cancel);
        let trigger = async {
            tokio::time::sleep(Duration::from_millis(100)).await;
            cancel.cancel();
        };
        let (result, ()) = futures::join!(request, trigger);

        assert!(result.unwrap_err().is_cancelled());
    }

    #[tokio::test]
    async fn test_already_cancelled_token_skips_dispatch() {
        let transport = FakeTransport::always(200, "{}");
        let h = harness(transport.clone());
        let cancel = CancellationToken::new();
        cancel.cancel();

        let error = h
            .client
            .post_with_cancel::<_, Value>("/x", &json!({}), &cancel)
            .await
            .unwrap_err();

        assert!(error.is_cancelled());
        assert_eq!(transport.calls(), 0);
    }

    #[tokio::test]
    async fn test_zero_retry_policy() {
        let transport = FakeTransport::always(500, "");
        let h = harness(transport.clone());
        let mut config = h.client.config().clone();
        config.retry = crate::retry::RetryPolicy::none();
        let client = ApiClient::new(
            config,
            transport.clone(),
            h.credentials.clone(),
            h.navigator.clone(),
        );

        let error = client.put::<_, Value>("/x", &json!({})).await.unwrap_err();
        assert_eq!(error.kind(), Some(ErrorType::Server));
        assert_eq!(transport.calls(), 1);
    }
}
