//! Error taxonomy for the request pipeline

/// Errors surfaced by `ApiClient`.
///
/// Propagation policy: `Config` and `Unauthenticated` fail fast before any
/// transport I/O. `Unauthorized` is recovered at the session layer (the
/// teardown hook has already run when callers see it). `Network` and
/// `Server` propagate for the caller to decide messaging; nothing in this
/// layer retries automatically. `Malformed` is reserved for a response body
/// that cannot be read at all — parseable-but-odd bodies resolve as raw text
/// instead of failing.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("not logged in")]
    Unauthenticated,

    #[error("unauthorized access, please log in again")]
    Unauthorized,

    #[error("network error, check your connection: {0}")]
    Network(String),

    #[error("{message}")]
    Server { status: u16, message: String },

    #[error("malformed response: {0}")]
    Malformed(String),
}

/// Result alias for pipeline operations.
pub type Result<T> = std::result::Result<T, ApiError>;
