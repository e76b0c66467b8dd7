use std::sync::Arc;

// --- Module Structure ---

// Core client services and components.
pub mod auth;
pub mod cli;
pub mod config;
pub mod error;
pub mod models;
pub mod session;
pub mod storage;

// Client-side routing (static route table + navigator).
pub mod routes;

// --- Public Re-exports ---

pub use auth::{AuthApi, AuthApiState, HttpAuthApi, MockAuthApi};
pub use config::{AppConfig, Env};
pub use error::{AuthError, ShellError, StorageError};
pub use routes::{Navigator, Route, RouteTable, View, app_routes};
pub use session::{AuthStore, LoginOutcome, ResponseOrdering, Session, SessionState};
pub use storage::{FileSessionStorage, MemorySessionStorage, StorageState};

/// AppShell
///
/// The single container holding everything the client needs: the loaded
/// configuration, the route navigator and the auth store. It is built once
/// and passed around explicitly; there is no process-wide session.
///
/// The navigator and the auth store do not talk to each other. The route
/// table has no guards, so a logged-out user still resolves `/` to `Home`.
pub struct AppShell {
    /// Configuration: the loaded, immutable environment configuration.
    pub config: AppConfig,
    /// Routing: the static route table plus the currently rendered route.
    pub navigator: Navigator,
    /// Auth: the owned session and its `login`/`logout` mutators.
    pub auth: Arc<AuthStore>,
}

impl AppShell {
    /// new
    ///
    /// Assembles the shell from explicit dependencies. Used by tests to inject
    /// `MockAuthApi` / `MemorySessionStorage`; does not restore the session.
    pub fn new(
        config: AppConfig,
        api: AuthApiState,
        storage: StorageState,
    ) -> Result<Self, ShellError> {
        let table = app_routes(&config.base_url)?;
        let navigator = Navigator::new(table, &config.base_url);
        let auth = AuthStore::new(api).with_storage(storage, config.store_id.clone());

        Ok(Self {
            config,
            navigator,
            auth: Arc::new(auth),
        })
    }

    /// bootstrap
    ///
    /// Production wiring: reqwest transport against `config.auth_url`, JSON
    /// files under `config.session_dir`, then restores any persisted token.
    /// A persisted session that cannot be read is logged and ignored.
    pub async fn bootstrap(config: AppConfig) -> Result<Self, ShellError> {
        let api = Arc::new(HttpAuthApi::new(&config)?) as AuthApiState;
        let storage = Arc::new(FileSessionStorage::new(config.session_dir.clone())) as StorageState;
        let shell = Self::new(config, api, storage)?;

        if let Err(error) = shell.auth.restore().await {
            tracing::warn!(%error, "could not restore persisted auth session; starting logged out");
        }

        tracing::info!(
            auth_url = %shell.config.auth_url,
            store_id = %shell.config.store_id,
            authenticated = shell.auth.token().is_some(),
            "application shell ready"
        );

        Ok(shell)
    }
}
