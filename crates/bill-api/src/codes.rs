//! Status/business code tables and cache TTL presets
//!
//! The backend wraps business results in `{code, data, message}` envelopes
//! whose codes shadow the HTTP status values. Both tables map a code to a
//! user-presentable message; unlisted codes fall back to a generic
//! `request failed: <status>` message at the call site.

use std::time::Duration;

/// HTTP status indicating a rejected credential.
pub const UNAUTHORIZED: u16 = 401;

/// Whether a business code denotes success (mirrors the 2xx HTTP range).
pub fn is_success(code: i64) -> bool {
    (200..300).contains(&code)
}

/// Message for a known HTTP error status.
pub fn status_message(status: u16) -> Option<&'static str> {
    message_for(status as i64)
}

/// Message for a known business code.
pub fn business_message(code: i64) -> Option<&'static str> {
    message_for(code)
}

fn message_for(code: i64) -> Option<&'static str> {
    match code {
        200 => Some("operation successful"),
        400 => Some("invalid request"),
        401 => Some("unauthorized access"),
        403 => Some("permission denied"),
        404 => Some("resource not found"),
        500 => Some("server error"),
        _ => None,
    }
}

/// Cache lifetime presets.
pub mod cache_ttl {
    use super::Duration;

    /// 30 seconds — request memo deduplication
    pub const SHORT: Duration = Duration::from_secs(30);
    /// 2 minutes — default for GET responses
    pub const MEDIUM: Duration = Duration::from_secs(2 * 60);
    /// 5 minutes — slow-changing lists
    pub const LONG: Duration = Duration::from_secs(5 * 60);
    /// 10 minutes — near-static data (currencies, model lists)
    pub const VERY_LONG: Duration = Duration::from_secs(10 * 60);
}

/// Default request timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;
