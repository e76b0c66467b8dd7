use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use reqwest::{StatusCode, header};

use crate::{
    config::AppConfig,
    error::AuthError,
    models::{LoginRequest, LoginResponse, MessageResponse, RegisterRequest},
};

// 1. AuthApi Contract
/// AuthApi
///
/// Abstract contract for every call the client makes to the auth service.
/// The auth store only sees this trait, so tests swap the real HTTP client
/// for `MockAuthApi` (or their own scripted implementation) without touching
/// the session logic.
#[async_trait]
pub trait AuthApi: Send + Sync {
    /// Exchanges credentials for a token. Exactly one outbound request per call.
    async fn login(&self, request: &LoginRequest) -> Result<String, AuthError>;

    /// Creates an account. Does not log in.
    async fn register(&self, request: &RegisterRequest) -> Result<MessageResponse, AuthError>;

    /// Asks the auth service whether `token` is still accepted.
    async fn verify(&self, token: &str) -> Result<MessageResponse, AuthError>;
}

/// AuthApiState
///
/// The shared handle the auth store holds on to.
pub type AuthApiState = Arc<dyn AuthApi>;

// 2. The Real Implementation (reqwest)
/// HttpAuthApi
///
/// JSON-over-HTTP client for the auth service. Endpoints come from
/// `AppConfig`; register and verify are optional and report
/// `AuthError::NotConfigured` when absent.
#[derive(Clone)]
pub struct HttpAuthApi {
    http: reqwest::Client,
    login_url: String,
    register_url: Option<String>,
    verify_url: Option<String>,
}

impl HttpAuthApi {
    /// new
    ///
    /// Builds the underlying reqwest client. A timeout is only installed when
    /// `AUTH_TIMEOUT_SECS` is configured.
    pub fn new(config: &AppConfig) -> Result<Self, AuthError> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = config.request_timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder
            .build()
            .map_err(|e| AuthError::NetworkFailure(e.to_string()))?;

        Ok(Self {
            http,
            login_url: config.auth_url.clone(),
            register_url: config.register_url.clone(),
            verify_url: config.verify_url.clone(),
        })
    }

    pub fn login_url(&self) -> &str {
        &self.login_url
    }
}

#[async_trait]
impl AuthApi for HttpAuthApi {
    /// login
    ///
    /// POSTs `{username, password}` with `Content-Type: application/json`.
    /// The status is checked before the body is read, so any non-2xx answer is
    /// `InvalidCredentials` whatever its body says.
    async fn login(&self, request: &LoginRequest) -> Result<String, AuthError> {
        tracing::debug!(url = %self.login_url, username = %request.username, "sending login request");

        let response = self
            .http
            .post(&self.login_url)
            .json(request)
            .send()
            .await
            .map_err(|e| AuthError::NetworkFailure(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AuthError::InvalidCredentials {
                status: status.as_u16(),
            });
        }

        let body = response
            .text()
            .await
            .map_err(|e| AuthError::NetworkFailure(e.to_string()))?;

        LoginResponse::parse_token(&body)
    }

    async fn register(&self, request: &RegisterRequest) -> Result<MessageResponse, AuthError> {
        let url = self
            .register_url
            .as_deref()
            .ok_or(AuthError::NotConfigured("register"))?;

        let response = self
            .http
            .post(url)
            .json(request)
            .send()
            .await
            .map_err(|e| AuthError::NetworkFailure(e.to_string()))?;

        read_message(response).await
    }

    /// verify
    ///
    /// The auth service reads the raw `Authorization` header value as the JWT,
    /// so no `Bearer ` prefix is added.
    async fn verify(&self, token: &str) -> Result<MessageResponse, AuthError> {
        let url = self
            .verify_url
            .as_deref()
            .ok_or(AuthError::NotConfigured("verify"))?;

        let response = self
            .http
            .get(url)
            .header(header::AUTHORIZATION, token)
            .send()
            .await
            .map_err(|e| AuthError::NetworkFailure(e.to_string()))?;

        read_message(response).await
    }
}

async fn read_message(response: reqwest::Response) -> Result<MessageResponse, AuthError> {
    let status = response.status();
    let body = response
        .text()
        .await
        .map_err(|e| AuthError::NetworkFailure(e.to_string()))?;

    if !status.is_success() {
        return Err(AuthError::Rejected {
            status: status.as_u16(),
            message: body.trim().to_string(),
        });
    }

    serde_json::from_str(&body).map_err(|e| AuthError::MalformedResponse(e.to_string()))
}

// 3. The Mock Implementation (For Tests)
/// MockAuthApi
///
/// In-memory `AuthApi` used by unit and integration tests. Every login is
/// recorded so tests can assert on exactly what would have gone over the wire.
#[derive(Default)]
pub struct MockAuthApi {
    /// Token handed out by a successful login.
    pub token: String,
    /// When set, every call fails with this error.
    pub fail_with: Option<AuthError>,
    calls: Mutex<Vec<LoginRequest>>,
}

impl MockAuthApi {
    pub fn new(token: &str) -> Self {
        Self {
            token: token.to_string(),
            ..Self::default()
        }
    }

    pub fn new_failing(error: AuthError) -> Self {
        Self {
            fail_with: Some(error),
            ..Self::default()
        }
    }

    /// Login requests received so far, in call order.
    pub fn calls(&self) -> Vec<LoginRequest> {
        self.calls
            .lock()
            .map(|calls| calls.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl AuthApi for MockAuthApi {
    async fn login(&self, request: &LoginRequest) -> Result<String, AuthError> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(request.clone());
        }
        match &self.fail_with {
            Some(error) => Err(error.clone()),
            None => Ok(self.token.clone()),
        }
    }

    async fn register(&self, request: &RegisterRequest) -> Result<MessageResponse, AuthError> {
        if let Some(error) = &self.fail_with {
            return Err(error.clone());
        }
        if request.password != request.verify_password {
            return Err(AuthError::Rejected {
                status: StatusCode::BAD_REQUEST.as_u16(),
                message: "Passwords do not match".to_string(),
            });
        }
        Ok(MessageResponse {
            message: "User registered successfully".to_string(),
        })
    }

    async fn verify(&self, token: &str) -> Result<MessageResponse, AuthError> {
        if let Some(error) = &self.fail_with {
            return Err(error.clone());
        }
        if token != self.token {
            return Err(AuthError::Rejected {
                status: StatusCode::BAD_REQUEST.as_u16(),
                message: "Token is invalid".to_string(),
            });
        }
        Ok(MessageResponse {
            message: "Token is valid".to_string(),
        })
    }
}
