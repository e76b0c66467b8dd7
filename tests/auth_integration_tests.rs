use axum::{
    Json, Router,
    extract::State,
    http::{HeaderMap, StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde_json::{Value, json};
use std::{
    sync::{Arc, Mutex},
    time::Duration,
};
use tokio::net::TcpListener;
use url_frontend::{
    AppConfig, AuthApi, AuthError, AuthStore, HttpAuthApi, LoginOutcome, SessionState,
    models::{LoginRequest, RegisterRequest},
};

// --- Mock Auth Service ---

const VALID_TOKEN: &str = "abc123";

#[derive(Debug, Clone)]
struct RecordedRequest {
    content_type: Option<String>,
    body: Value,
}

#[derive(Clone, Default)]
struct MockAuthService {
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
}

struct TestServer {
    address: String,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
}

impl TestServer {
    fn recorded(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }

    fn config(&self) -> AppConfig {
        AppConfig {
            auth_url: format!("{}/proxy/v1/auth/login", self.address),
            register_url: Some(format!("{}/proxy/v1/auth/register", self.address)),
            verify_url: Some(format!("{}/proxy/v1/auth/verify", self.address)),
            ..AppConfig::default()
        }
    }

    fn config_with_login_path(&self, path: &str) -> AppConfig {
        AppConfig {
            auth_url: format!("{}{}", self.address, path),
            ..AppConfig::default()
        }
    }
}

/// Login behaves like the real auth service for `alice`/`secret`; a few magic
/// usernames produce the odd responses the client has to cope with.
async fn login(
    State(service): State<MockAuthService>,
    headers: HeaderMap,
    body: String,
) -> Response {
    let parsed: Value = serde_json::from_str(&body).unwrap_or(Value::Null);
    service.requests.lock().unwrap().push(RecordedRequest {
        content_type: headers
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string),
        body: parsed.clone(),
    });

    let username = parsed["username"].as_str().unwrap_or_default();
    let password = parsed["password"].as_str().unwrap_or_default();

    match username {
        "alice" if password == "secret" => Json(json!({
            "token": VALID_TOKEN,
            "message": "User logged in successfully"
        }))
        .into_response(),
        "garbled" => (StatusCode::OK, "<html>not json</html>").into_response(),
        "tokenless" => Json(json!({ "message": "no token for you" })).into_response(),
        "numeric" => Json(json!({ "token": 42 })).into_response(),
        "blank" => Json(json!({ "token": "" })).into_response(),
        "crash" => (StatusCode::INTERNAL_SERVER_ERROR, "Could not query the database\n")
            .into_response(),
        // A 2xx-looking body behind a failure status must still be a failure.
        "liar" => (StatusCode::UNAUTHORIZED, Json(json!({ "token": "fake" }))).into_response(),
        _ => (StatusCode::BAD_REQUEST, "Password is incorrect\n").into_response(),
    }
}

async fn register(Json(request): Json<Value>) -> Response {
    if request["password"] != request["verify_password"] {
        return (StatusCode::BAD_REQUEST, "Passwords do not match\n").into_response();
    }
    Json(json!({ "message": "User registered successfully" })).into_response()
}

async fn verify(headers: HeaderMap) -> Response {
    match headers.get(header::AUTHORIZATION).and_then(|v| v.to_str().ok()) {
        None | Some("") => (StatusCode::BAD_REQUEST, "No token provided\n").into_response(),
        Some(VALID_TOKEN) => Json(json!({ "message": "Token is valid" })).into_response(),
        Some(_) => (StatusCode::BAD_REQUEST, "Token is invalid\n").into_response(),
    }
}

async fn slow_login() -> Response {
    tokio::time::sleep(Duration::from_secs(2)).await;
    Json(json!({ "token": "late" })).into_response()
}

async fn spawn_auth_server() -> TestServer {
    let service = MockAuthService::default();
    let requests = service.requests.clone();

    let router = Router::new()
        .route("/proxy/v1/auth/login", post(login))
        .route("/proxy/v1/auth/register", post(register))
        .route("/proxy/v1/auth/verify", get(verify))
        .route("/slow/login", post(slow_login))
        .with_state(service);

    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind port");
    let port = listener.local_addr().unwrap().port();
    let address = format!("http://127.0.0.1:{}", port);

    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });

    TestServer { address, requests }
}

/// An address nobody listens on: bind, read the port, release it.
async fn dead_address() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    format!("http://127.0.0.1:{}/proxy/v1/auth/login", port)
}

fn store_for(config: &AppConfig) -> AuthStore {
    AuthStore::new(Arc::new(HttpAuthApi::new(config).expect("client")))
}

// --- Transport Tests ---

#[tokio::test]
async fn test_login_sends_credentials_verbatim() {
    let server = spawn_auth_server().await;
    let api = HttpAuthApi::new(&server.config()).unwrap();

    let cases = [("alice", "secret"), ("", ""), ("  spaced ", "p@ss\"word\n")];
    for (username, password) in cases {
        let _ = api
            .login(&LoginRequest {
                username: username.to_string(),
                password: password.to_string(),
            })
            .await;
    }

    let recorded = server.recorded();
    assert_eq!(recorded.len(), cases.len(), "exactly one request per login");
    for ((username, password), request) in cases.iter().zip(&recorded) {
        assert_eq!(request.content_type.as_deref(), Some("application/json"));
        assert_eq!(
            request.body,
            json!({ "username": username, "password": password })
        );
    }
}

#[tokio::test]
async fn test_login_success_returns_token() {
    let server = spawn_auth_server().await;
    let api = HttpAuthApi::new(&server.config()).unwrap();

    let token = api
        .login(&LoginRequest {
            username: "alice".to_string(),
            password: "secret".to_string(),
        })
        .await;
    assert_eq!(token, Ok(VALID_TOKEN.to_string()));
}

#[tokio::test]
async fn test_login_tokens_kept_verbatim() {
    let server = spawn_auth_server().await;
    let api = HttpAuthApi::new(&server.config()).unwrap();
    let request = |username: &str| LoginRequest {
        username: username.to_string(),
        password: String::new(),
    };

    assert_eq!(api.login(&request("blank")).await, Ok(String::new()));
    assert_eq!(api.login(&request("numeric")).await, Ok("42".to_string()));
}

#[tokio::test]
async fn test_login_failure_status_is_invalid_credentials() {
    let server = spawn_auth_server().await;
    let api = HttpAuthApi::new(&server.config()).unwrap();
    let request = |username: &str| LoginRequest {
        username: username.to_string(),
        password: "wrong".to_string(),
    };

    assert_eq!(
        api.login(&request("alice")).await,
        Err(AuthError::InvalidCredentials { status: 400 })
    );
    assert_eq!(
        api.login(&request("crash")).await,
        Err(AuthError::InvalidCredentials { status: 500 })
    );
    assert_eq!(
        api.login(&request("liar")).await,
        Err(AuthError::InvalidCredentials { status: 401 })
    );
}

#[tokio::test]
async fn test_login_bad_bodies_are_malformed() {
    let server = spawn_auth_server().await;
    let api = HttpAuthApi::new(&server.config()).unwrap();

    for username in ["garbled", "tokenless"] {
        let result = api
            .login(&LoginRequest {
                username: username.to_string(),
                password: String::new(),
            })
            .await;
        assert!(
            matches!(result, Err(AuthError::MalformedResponse(_))),
            "{username}: {result:?}"
        );
    }
}

#[tokio::test]
async fn test_login_unreachable_is_network_failure() {
    let config = AppConfig {
        auth_url: dead_address().await,
        ..AppConfig::default()
    };
    let api = HttpAuthApi::new(&config).unwrap();

    let result = api.login(&LoginRequest::default()).await;
    assert!(matches!(result, Err(AuthError::NetworkFailure(_))), "{result:?}");
}

#[tokio::test]
async fn test_login_invalid_url_is_network_failure() {
    let config = AppConfig {
        auth_url: "undefined".to_string(),
        ..AppConfig::default()
    };
    let api = HttpAuthApi::new(&config).unwrap();

    let result = api.login(&LoginRequest::default()).await;
    assert!(matches!(result, Err(AuthError::NetworkFailure(_))), "{result:?}");
}

#[tokio::test]
async fn test_login_timeout_is_network_failure() {
    let server = spawn_auth_server().await;
    let config = AppConfig {
        request_timeout: Some(Duration::from_millis(200)),
        ..server.config_with_login_path("/slow/login")
    };
    let api = HttpAuthApi::new(&config).unwrap();

    let result = api.login(&LoginRequest::default()).await;
    assert!(matches!(result, Err(AuthError::NetworkFailure(_))), "{result:?}");
}

#[tokio::test]
async fn test_register_and_verify() {
    let server = spawn_auth_server().await;
    let api = HttpAuthApi::new(&server.config()).unwrap();

    let ok = api
        .register(&RegisterRequest {
            username: "bob".to_string(),
            password: "Str0ng!pass".to_string(),
            verify_password: "Str0ng!pass".to_string(),
        })
        .await
        .unwrap();
    assert_eq!(ok.message, "User registered successfully");

    let mismatch = api
        .register(&RegisterRequest {
            username: "bob".to_string(),
            password: "Str0ng!pass".to_string(),
            verify_password: "other".to_string(),
        })
        .await;
    assert_eq!(
        mismatch,
        Err(AuthError::Rejected {
            status: 400,
            message: "Passwords do not match".to_string()
        })
    );

    assert_eq!(api.verify(VALID_TOKEN).await.unwrap().message, "Token is valid");
    assert!(matches!(
        api.verify("forged").await,
        Err(AuthError::Rejected { status: 400, .. })
    ));
}

#[tokio::test]
async fn test_register_and_verify_not_configured() {
    let api = HttpAuthApi::new(&AppConfig::default()).unwrap();

    assert_eq!(
        api.register(&RegisterRequest::default()).await,
        Err(AuthError::NotConfigured("register"))
    );
    assert_eq!(
        api.verify(VALID_TOKEN).await,
        Err(AuthError::NotConfigured("verify"))
    );
}

// --- Store Over HTTP ---

#[tokio::test]
async fn test_store_success_sets_token() {
    let server = spawn_auth_server().await;
    let store = store_for(&server.config());

    let outcome = store.login("alice", "secret").await;

    assert_eq!(outcome, LoginOutcome::Authenticated);
    assert_eq!(store.token().as_deref(), Some(VALID_TOKEN));
    assert!(store.error().is_none());
    assert!(!store.is_loading());
    assert_eq!(store.state(), SessionState::Authenticated);
}

#[tokio::test]
async fn test_store_rejection_keeps_existing_token() {
    let server = spawn_auth_server().await;
    let store = store_for(&server.config());

    store.login("alice", "secret").await;
    let outcome = store.login("alice", "wrong").await;

    assert_eq!(
        outcome,
        LoginOutcome::Failed(AuthError::InvalidCredentials { status: 400 })
    );
    assert_eq!(store.token().as_deref(), Some(VALID_TOKEN));
    assert_eq!(
        store.error(),
        Some(AuthError::InvalidCredentials { status: 400 })
    );
}

#[tokio::test]
async fn test_store_rejection_without_token() {
    let server = spawn_auth_server().await;
    let store = store_for(&server.config());

    store.login("mallory", "guess").await;

    assert!(store.token().is_none());
    assert!(store.error().is_some());
    assert_eq!(store.state(), SessionState::Failed);
}

#[tokio::test]
async fn test_store_unparsable_body_leaves_token_unchanged() {
    let server = spawn_auth_server().await;
    let store = store_for(&server.config());

    store.login("alice", "secret").await;
    store.login("garbled", "").await;

    assert_eq!(store.token().as_deref(), Some(VALID_TOKEN));
    assert!(matches!(
        store.error(),
        Some(AuthError::MalformedResponse(_))
    ));
}

#[tokio::test]
async fn test_store_verify_uses_stored_token() {
    let server = spawn_auth_server().await;
    let store = store_for(&server.config());

    // No token: no request, not valid.
    assert_eq!(store.verify().await, Ok(false));

    store.login("alice", "secret").await;
    assert_eq!(store.verify().await, Ok(true));

    store.logout().await;
    assert_eq!(store.verify().await, Ok(false));
}
