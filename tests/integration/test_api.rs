//! Integration tests for the API client against a real HTTP server.
//!
//! Each test spawns an axum mock of the Kwento backend on a free loopback
//! port and drives it through `ApiClient` over `ReqwestTransport`.

use std::net::TcpListener;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::routing::{get, post};
use axum::{Json, Router};
use kwento_client::{
    ApiClient, CancellationToken, ClientConfig, CredentialProvider, ErrorHandler, ErrorType,
    HandleOptions, LoggingNavigator, MemoryTokenStore, Method, Navigator, Notifier,
    ReqwestTransport, RetryPolicy, StoredCredentials, TokenStore,
};
use serde_json::{json, Value};

/// Shared state of the mock backend.
#[derive(Clone, Default)]
struct Backend {
    hits: Arc<AtomicUsize>,
}

impl Backend {
    fn hits(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }

    fn hit(&self) -> usize {
        self.hits.fetch_add(1, Ordering::SeqCst) + 1
    }
}

async fn flaky(State(backend): State<Backend>) -> (StatusCode, Json<Value>) {
    if backend.hit() <= 2 {
        (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({ "message": "Try again" })),
        )
    } else {
        (StatusCode::OK, Json(json!({ "stories": ["Si Langgam"] })))
    }
}

async fn down(State(backend): State<Backend>) -> (StatusCode, &'static str) {
    backend.hit();
    (StatusCode::BAD_GATEWAY, "upstream unavailable")
}

async fn expired(State(backend): State<Backend>) -> (StatusCode, Json<Value>) {
    backend.hit();
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({ "message": "Token expired" })),
    )
}

async fn not_owner(State(backend): State<Backend>) -> (StatusCode, Json<Value>) {
    backend.hit();
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({ "message": "You do not own this resource" })),
    )
}

async fn invalid(State(backend): State<Backend>) -> (StatusCode, Json<Value>) {
    backend.hit();
    (
        StatusCode::BAD_REQUEST,
        Json(json!({ "error": "Kulang ang sagot", "field": "answers" })),
    )
}

async fn whoami(headers: HeaderMap) -> Json<Value> {
    let authorization = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    Json(json!({ "authorization": authorization }))
}

async fn slow() -> Json<Value> {
    tokio::time::sleep(Duration::from_secs(30)).await;
    Json(json!({}))
}

async fn attempts(Path(id): Path<String>, Json(body): Json<Value>) -> (StatusCode, Json<Value>) {
    (
        StatusCode::CREATED,
        Json(json!({ "activityId": id, "received": body })),
    )
}

fn find_available_port() -> u16 {
    TcpListener::bind("127.0.0.1:0")
        .expect("Failed to bind to port")
        .local_addr()
        .expect("Failed to get local addr")
        .port()
}

/// Spawns the mock backend and returns its base URL.
async fn spawn_backend(backend: Backend) -> String {
    let port = find_available_port();
    let addr = format!("127.0.0.1:{port}");

    let router = Router::new()
        .route("/api/stories", get(flaky))
        .route("/api/down", get(down))
        .route("/api/expired", get(expired))
        .route("/api/owned", get(not_owner))
        .route("/api/invalid", get(invalid))
        .route("/api/whoami", get(whoami))
        .route("/api/slow", get(slow))
        .route("/api/activities/:id/attempts", post(attempts))
        .with_state(backend);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("Failed to bind");
    tokio::spawn(async move {
        axum::serve(listener, router).await.expect("Server failed");
    });

    format!("http://{addr}/api")
}

fn fast_retry() -> RetryPolicy {
    RetryPolicy {
        max_retries: 3,
        base_delay_ms: 10,
        max_delay_ms: 40,
    }
}

struct Harness {
    client: ApiClient,
    credentials: Arc<StoredCredentials<MemoryTokenStore>>,
    navigator: Arc<LoggingNavigator>,
}

fn harness(base_url: &str, token: Option<&str>) -> Harness {
    let config = ClientConfig {
        retry: fast_retry(),
        ..ClientConfig::with_base_url(base_url)
    };
    let http = reqwest::Client::builder()
        .no_proxy()
        .timeout(Duration::from_secs(5))
        .build()
        .expect("Failed to build reqwest client");
    let store = MemoryTokenStore::new();
    if let Some(token) = token {
        store.set("accessToken", token);
        store.set("refreshToken", "refresh");
    }
    let credentials = Arc::new(StoredCredentials::new(store));
    let navigator = Arc::new(LoggingNavigator::new("/lessons/3"));
    let client = ApiClient::new(
        config,
        Arc::new(ReqwestTransport::with_client(http)),
        credentials.clone(),
        navigator.clone(),
    );
    Harness {
        client,
        credentials,
        navigator,
    }
}

// ============================================================================
// Success and Retry
// ============================================================================

#[tokio::test]
async fn test_transient_failures_are_retried_until_success() {
    let backend = Backend::default();
    let base_url = spawn_backend(backend.clone()).await;
    let h = harness(&base_url, Some("abc"));

    let body: Value = h.client.get("/stories").await.expect("request failed");

    assert_eq!(body["stories"][0], "Si Langgam");
    assert_eq!(backend.hits(), 3);
}

#[tokio::test]
async fn test_exhausted_retries_surface_server_error() {
    let backend = Backend::default();
    let base_url = spawn_backend(backend.clone()).await;
    let h = harness(&base_url, None);

    let err = h.client.get::<Value>("/down").await.unwrap_err();

    assert_eq!(backend.hits(), 4);
    let app = err.app_error().expect("expected a classified error");
    assert_eq!(app.kind(), ErrorType::Server);
    assert_eq!(app.status(), Some(502));
    assert_eq!(app.message(), ErrorType::Server.default_message());
    assert_eq!(app.details(), Some(&json!("upstream unavailable")));
}

#[tokio::test]
async fn test_validation_error_is_not_retried() {
    let backend = Backend::default();
    let base_url = spawn_backend(backend.clone()).await;
    let h = harness(&base_url, Some("abc"));

    let err = h.client.get::<Value>("/invalid").await.unwrap_err();

    assert_eq!(backend.hits(), 1);
    let app = err.app_error().expect("expected a classified error");
    assert_eq!(app.kind(), ErrorType::Validation);
    assert_eq!(app.message(), "Kulang ang sagot");
    assert_eq!(app.details().and_then(|d| d["field"].as_str()), Some("answers"));
}

#[tokio::test]
async fn test_unreachable_server_is_network_error() {
    let port = find_available_port();
    let h = harness(&format!("http://127.0.0.1:{port}/api"), None);

    let err = h.client.get::<Value>("/stories").await.unwrap_err();

    assert_eq!(err.kind(), Some(ErrorType::Network));
}

// ============================================================================
// Credentials and Session Expiry
// ============================================================================

#[tokio::test]
async fn test_bearer_token_is_attached() {
    let base_url = spawn_backend(Backend::default()).await;

    let h = harness(&base_url, Some("abc"));
    let body: Value = h.client.get("/whoami").await.expect("request failed");
    assert_eq!(body["authorization"], "Bearer abc");

    let anonymous = harness(&base_url, None);
    let body: Value = anonymous.client.get("/whoami").await.expect("request failed");
    assert_eq!(body["authorization"], Value::Null);
}

#[tokio::test]
async fn test_expired_session_clears_credentials_and_redirects() {
    let backend = Backend::default();
    let base_url = spawn_backend(backend.clone()).await;
    let h = harness(&base_url, Some("abc"));

    let err = h.client.get::<Value>("/expired").await.unwrap_err();

    assert_eq!(err.kind(), Some(ErrorType::Authentication));
    assert_eq!(backend.hits(), 1);
    assert_eq!(h.credentials.token(), None);
    assert_eq!(h.credentials.store().get("refreshToken"), None);
    assert_eq!(h.navigator.current_path(), "/login");
}

#[tokio::test]
async fn test_resource_refusal_keeps_session() {
    let base_url = spawn_backend(Backend::default()).await;
    let h = harness(&base_url, Some("abc"));

    let err = h.client.get::<Value>("/owned").await.unwrap_err();

    assert_eq!(err.kind(), Some(ErrorType::Authentication));
    assert_eq!(h.credentials.token().as_deref(), Some("abc"));
    assert_eq!(h.navigator.current_path(), "/lessons/3");
}

// ============================================================================
// Cancellation and Handling
// ============================================================================

#[tokio::test]
async fn test_cancel_in_flight_request() {
    let base_url = spawn_backend(Backend::default()).await;
    let h = harness(&base_url, None);
    let cancel = CancellationToken::new();

    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(100)).await;
        trigger.cancel();
    });

    let started = std::time::Instant::now();
    let err = h
        .client
        .get_with_cancel::<Value>("/slow", &cancel)
        .await
        .unwrap_err();

    assert!(err.is_cancelled());
    assert!(started.elapsed() < Duration::from_secs(5));
}

#[derive(Debug, Default)]
struct Toasts(std::sync::Mutex<Vec<String>>);

impl Notifier for Toasts {
    fn notify(&self, message: &str) {
        self.0.lock().expect("poisoned").push(message.to_string());
    }
}

#[tokio::test]
async fn test_handler_toasts_server_wording() {
    let base_url = spawn_backend(Backend::default()).await;
    let h = harness(&base_url, Some("abc"));
    let toasts = Arc::new(Toasts::default());
    let handler = ErrorHandler::new(toasts.clone(), h.navigator.clone(), "/login");

    let result = handler
        .handle(h.client.get::<Value>("/invalid"), &HandleOptions::default())
        .await;

    assert!(result.is_err());
    assert_eq!(
        toasts.0.lock().expect("poisoned").as_slice(),
        ["Kulang ang sagot"]
    );
}

#[tokio::test]
async fn test_handler_can_keep_learner_on_page_after_expiry() {
    let backend = Backend::default();
    let base_url = spawn_backend(backend.clone()).await;
    let h = harness(&base_url, Some("abc"));
    let toasts = Arc::new(Toasts::default());
    let handler = ErrorHandler::new(toasts.clone(), h.navigator.clone(), "/login");
    let options = HandleOptions {
        suppress_redirect: true,
        ..HandleOptions::default()
    };

    let cancel = CancellationToken::new();
    let call = h.client.request_with_options::<Value>(
        Method::Get,
        "/expired",
        None,
        options.request_options(),
        &cancel,
    );
    let err = handler.handle(call, &options).await.unwrap_err();

    assert_eq!(err.kind(), Some(ErrorType::Authentication));
    assert_eq!(backend.hits(), 1);
    assert_eq!(h.credentials.token(), None);
    assert_eq!(h.navigator.current_path(), "/lessons/3");
    assert_eq!(
        toasts.0.lock().expect("poisoned").as_slice(),
        ["Token expired"]
    );
}

#[tokio::test]
async fn test_submit_attempt() {
    let base_url = spawn_backend(Backend::default()).await;
    let h = harness(&base_url, Some("abc"));
    let result = json!({ "score": 2, "percentage": 67, "answers": [0, 1, 0], "timeSpent": 41 });

    let receipt: Value = h
        .client
        .post("/activities/act-7/attempts", &result)
        .await
        .expect("submit failed");

    assert_eq!(receipt["activityId"], "act-7");
    assert_eq!(receipt["received"], result);
}
