use std::sync::{
    Mutex, MutexGuard, PoisonError,
    atomic::{AtomicU64, Ordering},
};

use crate::{
    auth::AuthApiState,
    config::DEFAULT_STORE_ID,
    error::{AuthError, StorageError},
    models::{LoginRequest, MessageResponse, PersistedSession, RegisterRequest},
    storage::StorageState,
};

/// Session
///
/// The in-memory authentication record. Only `AuthStore` mutates it; callers
/// get clones through `AuthStore::session`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Session {
    pub token: Option<String>,
    pub loading: bool,
    pub error: Option<AuthError>,
}

/// SessionState
///
/// Derived view of a `Session` for the UI layer. A request in flight wins over
/// everything else, a token wins over a stale error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    LoggingIn,
    Authenticated,
    Failed,
}

impl Session {
    pub fn state(&self) -> SessionState {
        if self.loading {
            SessionState::LoggingIn
        } else if self.token.is_some() {
            SessionState::Authenticated
        } else if self.error.is_some() {
            SessionState::Failed
        } else {
            SessionState::Idle
        }
    }
}

/// ResponseOrdering
///
/// Decides which login response may mutate the session when several logins
/// overlap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResponseOrdering {
    /// Only the response to the most recently issued login is applied; older
    /// responses are discarded on arrival.
    #[default]
    LatestRequestWins,
    /// Every response is applied as it arrives, so the last one to resolve wins
    /// regardless of issue order. The first response to arrive clears
    /// `loading` even if another login is still in flight.
    LastResponseWins,
}

/// LoginOutcome
///
/// What a `login` call did to the session. Failures are already recorded in
/// `Session::error`; the outcome only reports them back.
#[derive(Debug, Clone, PartialEq)]
pub enum LoginOutcome {
    Authenticated,
    Failed(AuthError),
    /// A newer login was issued while this one was in flight; its response was
    /// dropped without touching the session.
    Superseded { latest: u64 },
}

/// AuthStore
///
/// Owns the auth session and the two mutators `login` and `logout`. Built
/// once by the application shell and shared by reference (or `Arc`); nothing
/// in it is global, so every test gets its own store.
///
/// *Locking*: the session sits behind a `std::sync::Mutex` that is never held
/// across an `.await`. Persistence writes are serialized by a separate async
/// lock and always write the token current at write time.
pub struct AuthStore {
    api: AuthApiState,
    storage: Option<StorageState>,
    store_id: String,
    ordering: ResponseOrdering,
    session: Mutex<Session>,
    issued: AtomicU64,
    persist_lock: tokio::sync::Mutex<()>,
}

impl AuthStore {
    /// new
    ///
    /// A store without persistence, using `ResponseOrdering::LatestRequestWins`.
    pub fn new(api: AuthApiState) -> Self {
        Self {
            api,
            storage: None,
            store_id: DEFAULT_STORE_ID.to_string(),
            ordering: ResponseOrdering::default(),
            session: Mutex::new(Session::default()),
            issued: AtomicU64::new(0),
            persist_lock: tokio::sync::Mutex::new(()),
        }
    }

    /// Persist the token under `store_id` after every change.
    pub fn with_storage(mut self, storage: StorageState, store_id: impl Into<String>) -> Self {
        self.storage = Some(storage);
        self.store_id = store_id.into();
        self
    }

    pub fn with_ordering(mut self, ordering: ResponseOrdering) -> Self {
        self.ordering = ordering;
        self
    }

    // --- Read Access ---

    pub fn session(&self) -> Session {
        self.lock().clone()
    }

    pub fn state(&self) -> SessionState {
        self.lock().state()
    }

    pub fn token(&self) -> Option<String> {
        self.lock().token.clone()
    }

    pub fn is_loading(&self) -> bool {
        self.lock().loading
    }

    pub fn error(&self) -> Option<AuthError> {
        self.lock().error.clone()
    }

    pub fn store_id(&self) -> &str {
        &self.store_id
    }

    // --- Mutators ---

    /// login
    ///
    /// Sends the credentials verbatim to the auth service and records the
    /// result in the session. Sets `loading` and clears the previous error
    /// before the request goes out.
    ///
    /// On success the token replaces whatever was stored. On failure the error
    /// is recorded and the token is left untouched. Nothing is returned as an
    /// `Err`: every failure is recoverable by calling `login` again.
    pub async fn login(&self, username: &str, password: &str) -> LoginOutcome {
        let seq = self.issued.fetch_add(1, Ordering::SeqCst) + 1;
        {
            let mut session = self.lock();
            session.loading = true;
            session.error = None;
        }
        tracing::info!(seq, %username, "login started");

        let request = LoginRequest {
            username: username.to_string(),
            password: password.to_string(),
        };
        let result = self.api.login(&request).await;

        let outcome = {
            let mut session = self.lock();
            let latest = self.issued.load(Ordering::SeqCst);

            if self.ordering == ResponseOrdering::LatestRequestWins && seq != latest {
                tracing::debug!(seq, latest, "discarding stale login response");
                return LoginOutcome::Superseded { latest };
            }

            session.loading = false;
            match result {
                Ok(token) => {
                    session.token = Some(token);
                    session.error = None;
                    LoginOutcome::Authenticated
                }
                Err(error) => {
                    session.error = Some(error.clone());
                    LoginOutcome::Failed(error)
                }
            }
        };

        match &outcome {
            LoginOutcome::Authenticated => {
                tracing::info!(seq, %username, "login succeeded");
                self.persist().await;
            }
            LoginOutcome::Failed(error) => {
                tracing::warn!(seq, %username, %error, "login failed");
            }
            LoginOutcome::Superseded { .. } => {}
        }

        outcome
    }

    /// logout
    ///
    /// Clears the token and any recorded error. Idempotent. An in-flight login
    /// is not aborted and may still authenticate the session when it resolves.
    pub async fn logout(&self) {
        let had_token = {
            let mut session = self.lock();
            session.error = None;
            session.token.take().is_some()
        };
        tracing::info!(had_token, "logged out");
        self.persist().await;
    }

    /// restore
    ///
    /// Seeds the token from persistence. Meant to run once at startup, before
    /// any login. Returns whether a token was found.
    pub async fn restore(&self) -> Result<bool, StorageError> {
        let Some(storage) = &self.storage else {
            return Ok(false);
        };

        let token = storage
            .load(&self.store_id)
            .await?
            .and_then(|persisted| persisted.token);

        let restored = token.is_some();
        if restored {
            self.lock().token = token;
        }
        tracing::debug!(store_id = %self.store_id, restored, "auth session restored");
        Ok(restored)
    }

    // --- Auth Service Passthroughs ---

    /// register
    ///
    /// Creates an account on the auth service. The session is not touched; the
    /// caller logs in separately.
    pub async fn register(
        &self,
        username: &str,
        password: &str,
        verify_password: &str,
    ) -> Result<MessageResponse, AuthError> {
        let request = RegisterRequest {
            username: username.to_string(),
            password: password.to_string(),
            verify_password: verify_password.to_string(),
        };
        self.api.register(&request).await
    }

    /// verify
    ///
    /// Asks the auth service whether the stored token is accepted. `Ok(false)`
    /// without a request when no token is stored, and when the service rejects
    /// the token with a 4xx. Server-side faults (5xx) and transport failures
    /// are returned as errors. The session is not modified either way.
    pub async fn verify(&self) -> Result<bool, AuthError> {
        let Some(token) = self.token() else {
            return Ok(false);
        };

        match self.api.verify(&token).await {
            Ok(_) => Ok(true),
            Err(AuthError::Rejected { status, .. }) if (400..500).contains(&status) => {
                tracing::debug!(status, "stored token rejected");
                Ok(false)
            }
            Err(error) => Err(error),
        }
    }

    // --- Internals ---

    fn lock(&self) -> MutexGuard<'_, Session> {
        self.session.lock().unwrap_or_else(PoisonError::into_inner)
    }

    async fn persist(&self) {
        let Some(storage) = &self.storage else {
            return;
        };

        let _guard = self.persist_lock.lock().await;
        let token = self.token();
        let result = match token {
            Some(token) => {
                storage
                    .save(&self.store_id, &PersistedSession::new(Some(token)))
                    .await
            }
            None => storage.clear(&self.store_id).await,
        };

        if let Err(error) = result {
            tracing::warn!(%error, store_id = %self.store_id, "failed to persist auth session");
        }
    }
}
