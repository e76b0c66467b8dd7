use std::{env, path::PathBuf, time::Duration};

use thiserror::Error;

/// Login endpoint of the auth service when running against the local Docker stack.
pub const DEFAULT_LOCAL_AUTH_URL: &str = "http://localhost:8080/proxy/v1/auth/login";

/// Key under which the auth session is persisted unless `SESSION_STORE_ID` overrides it.
pub const DEFAULT_STORE_ID: &str = "auth";

const SESSION_DIR_NAME: &str = ".url-frontend";

/// AppConfig
///
/// Holds the client's entire configuration state. Loaded once at startup and
/// handed to the `AppShell`, which passes the relevant pieces on to the auth
/// store, the persistence layer and the route navigator.
#[derive(Clone, Debug)]
pub struct AppConfig {
    // Runtime environment marker. Controls log format and fail-fast rules.
    pub env: Env,
    // Login endpoint receiving `{username, password}`.
    pub auth_url: String,
    // Registration endpoint. Optional: `register` reports it as not configured.
    pub register_url: Option<String>,
    // Token verification endpoint. Optional, same as above.
    pub verify_url: Option<String>,
    // Per-request timeout for the auth service. `None` means no timeout.
    pub request_timeout: Option<Duration>,
    // Base path the route table is mounted under.
    pub base_url: String,
    // Directory holding persisted sessions.
    pub session_dir: PathBuf,
    // Identifier of the persisted auth session.
    pub store_id: String,
}

/// Env
///
/// Defines the runtime context. `Local` falls back to the Docker-compose auth
/// service; `Production` requires every endpoint to be set explicitly.
#[derive(Clone, PartialEq, Debug)]
pub enum Env {
    Local,
    Production,
}

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("{0} must be set in production")]
    Missing(&'static str),

    #[error("{var} has an invalid value: {value:?}")]
    Invalid { var: &'static str, value: String },
}

impl Default for AppConfig {
    /// default
    ///
    /// Provides a non-panicking AppConfig instance used for test setup, so state
    /// can be built without touching environment variables.
    fn default() -> Self {
        Self {
            env: Env::Local,
            auth_url: DEFAULT_LOCAL_AUTH_URL.to_string(),
            register_url: None,
            verify_url: None,
            request_timeout: None,
            base_url: "/".to_string(),
            session_dir: default_session_dir(),
            store_id: DEFAULT_STORE_ID.to_string(),
        }
    }
}

impl AppConfig {
    /// load
    ///
    /// The canonical function for initializing the configuration at startup.
    ///
    /// # Panics
    /// Panics if `try_load` fails, i.e. a variable required in production is
    /// missing or a numeric variable cannot be parsed. The client must not start
    /// pointed at an undefined auth endpoint.
    pub fn load() -> Self {
        Self::try_load().unwrap_or_else(|e| panic!("FATAL: {e}"))
    }

    /// try_load
    ///
    /// Reads every parameter from the environment. Variables that are set but
    /// empty are treated as unset.
    pub fn try_load() -> Result<Self, ConfigError> {
        let env = match var("APP_ENV").as_deref() {
            Some("production") => Env::Production,
            _ => Env::Local,
        };

        let auth_url = match (var("AUTH_URL"), &env) {
            (Some(url), _) => url,
            (None, Env::Production) => return Err(ConfigError::Missing("AUTH_URL")),
            (None, Env::Local) => DEFAULT_LOCAL_AUTH_URL.to_string(),
        };

        let request_timeout = match var("AUTH_TIMEOUT_SECS") {
            Some(raw) => {
                let secs = raw.parse::<u64>().map_err(|_| ConfigError::Invalid {
                    var: "AUTH_TIMEOUT_SECS",
                    value: raw.clone(),
                })?;
                Some(Duration::from_secs(secs))
            }
            None => None,
        };

        let base_url = var("BASE_URL").unwrap_or_else(|| "/".to_string());
        if !base_url.starts_with('/') {
            return Err(ConfigError::Invalid {
                var: "BASE_URL",
                value: base_url,
            });
        }

        Ok(Self {
            env,
            auth_url,
            register_url: var("AUTH_REGISTER_URL"),
            verify_url: var("AUTH_VERIFY_URL"),
            request_timeout,
            base_url,
            session_dir: var("SESSION_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(default_session_dir),
            store_id: var("SESSION_STORE_ID").unwrap_or_else(|| DEFAULT_STORE_ID.to_string()),
        })
    }
}

fn var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn default_session_dir() -> PathBuf {
    dirs::home_dir()
        .map(|home| home.join(SESSION_DIR_NAME))
        .unwrap_or_else(|| PathBuf::from(SESSION_DIR_NAME))
}
