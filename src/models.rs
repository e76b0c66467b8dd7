use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::AuthError;

// --- Auth Service Wire Schemas ---

/// LoginRequest
///
/// JSON body of `POST <AUTH_URL>`. Credentials are forwarded verbatim; empty
/// strings are not rejected client-side.
#[derive(Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

impl fmt::Debug for LoginRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginRequest")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// LoginResponse
///
/// Success body of the login endpoint. Only `token` is read; other fields the
/// auth service sends (such as `message`) are ignored whatever their type.
#[derive(Debug, Clone, Deserialize)]
pub struct LoginResponse {
    #[serde(default)]
    pub token: Option<serde_json::Value>,
}

impl LoginResponse {
    /// parse_token
    ///
    /// Extracts the token from a raw success body. String tokens are kept
    /// as-is (including the empty string); any other non-null JSON value is kept
    /// as its JSON text. A body that is not a JSON object, or carries no token,
    /// is a `MalformedResponse`.
    pub fn parse_token(body: &str) -> Result<String, AuthError> {
        let response: LoginResponse = serde_json::from_str(body)
            .map_err(|e| AuthError::MalformedResponse(e.to_string()))?;

        match response.token {
            Some(serde_json::Value::String(token)) => Ok(token),
            Some(serde_json::Value::Null) | None => Err(AuthError::MalformedResponse(
                "response has no token field".to_string(),
            )),
            Some(other) => Ok(other.to_string()),
        }
    }
}

/// RegisterRequest
///
/// JSON body of `POST <AUTH_REGISTER_URL>`. Password matching and complexity
/// rules are enforced by the auth service.
#[derive(Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct RegisterRequest {
    pub username: String,
    pub password: String,
    pub verify_password: String,
}

impl fmt::Debug for RegisterRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegisterRequest")
            .field("username", &self.username)
            .finish_non_exhaustive()
    }
}

/// MessageResponse
///
/// `{"message": ...}` body returned by register and verify.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct MessageResponse {
    pub message: String,
}

// --- Persistence Schema ---

/// PersistedSession
///
/// On-disk shape of the auth session. Only the token survives a restart;
/// `loading` and `error` describe in-flight or one-shot conditions.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PersistedSession {
    pub token: Option<String>,
    pub saved_at: DateTime<Utc>,
}

impl PersistedSession {
    pub fn new(token: Option<String>) -> Self {
        Self {
            token,
            saved_at: Utc::now(),
        }
    }
}
