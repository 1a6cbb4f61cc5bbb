//! Error types for navigation and session operations

/// Errors from guarded navigation.
#[derive(Debug, thiserror::Error)]
pub enum NavError {
    /// Another navigation holds the in-flight flag; rejected, not queued
    #[error("navigation already in progress")]
    InFlight,

    #[error("navigation to {path} timed out after {timeout_secs}s")]
    Timeout { path: String, timeout_secs: u64 },

    /// The host navigator reported a failure
    #[error("navigation failed: {0}")]
    Transition(String),
}

/// Errors from session finalization.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("login payload contains no usable token")]
    InvalidLoginPayload,

    #[error("login token failed validation")]
    TokenRejected,

    #[error(transparent)]
    Navigation(#[from] NavError),
}
