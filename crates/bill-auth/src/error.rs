//! Error types for credential operations

/// Errors from credential decoding and storage.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid token format: {0}")]
    InvalidFormat(String),

    #[error("claims decode error: {0}")]
    ClaimsDecode(String),
}

/// Result alias for credential operations.
pub type Result<T> = std::result::Result<T, Error>;
