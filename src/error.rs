use thiserror::Error;

/// AuthError
///
/// Failure kinds surfaced by the auth service transport. Login failures end up
/// in the session's `error` slot; register/verify return them to the caller.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum AuthError {
    /// The auth service answered the login with a non-success status.
    #[error("invalid credentials (status {status})")]
    InvalidCredentials { status: u16 },

    /// The request never completed: connection refused, DNS, timeout.
    #[error("network failure: {0}")]
    NetworkFailure(String),

    /// The body could not be parsed as the expected JSON shape.
    #[error("malformed response: {0}")]
    MalformedResponse(String),

    /// Register or verify answered with a non-success status.
    #[error("request rejected (status {status}): {message}")]
    Rejected { status: u16, message: String },

    #[error("{0} endpoint is not configured")]
    NotConfigured(&'static str),
}

/// StorageError
///
/// Failures of the session persistence layer. These are logged by the auth
/// store and never turn a login or logout into a failure.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("session io error at {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("persisted session is corrupt: {0}")]
    Corrupt(#[from] serde_json::Error),

    #[error("mock storage error: simulation requested")]
    Simulated,
}

/// ShellError
///
/// Failures while assembling the application shell at startup.
#[derive(Debug, Error)]
pub enum ShellError {
    #[error("invalid route table: {0}")]
    Routes(#[from] crate::routes::RouteError),

    #[error("auth client setup failed: {0}")]
    Auth(#[from] AuthError),
}
