//! Credential format and expiry checks
//!
//! A credential is a JWT-shaped bearer string: three non-empty dot-separated
//! segments, the middle one a base64url-encoded JSON payload. The payload is
//! decoded without signature verification; any decode failure is treated as
//! expired (fail-closed).

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use serde::Deserialize;
use serde_json::Value;
use tracing::warn;

use crate::error::{Error, Result};

/// Registered claims this client reads from the payload.
///
/// `exp` and `iat` are unix timestamps in seconds. Both are optional — a
/// payload without `exp` never expires client-side.
#[derive(Debug, Clone, Deserialize)]
pub struct Claims {
    pub exp: Option<u64>,
    pub iat: Option<u64>,
}

/// Decoded credential summary (header and payload are unverified).
#[derive(Debug, Clone)]
pub struct TokenInfo {
    pub header: Value,
    pub payload: Value,
    pub is_expired: bool,
    /// Expiration as unix timestamp in seconds, if the payload carries `exp`
    pub expires_at: Option<u64>,
    /// Issued-at as unix timestamp in seconds, if the payload carries `iat`
    pub issued_at: Option<u64>,
}

/// Check the structural shape: exactly three non-empty dot-separated segments.
pub fn is_valid_format(token: &str) -> bool {
    let parts: Vec<&str> = token.split('.').collect();
    if parts.len() != 3 {
        warn!(segments = parts.len(), "token format invalid: expected 3 segments");
        return false;
    }
    if parts.iter().any(|part| part.trim().is_empty()) {
        warn!("token format invalid: contains an empty segment");
        return false;
    }
    true
}

/// Whether the credential is expired.
///
/// Fail-closed: a malformed token, an undecodable payload, or unparsable
/// claims all count as expired. A payload without `exp` never expires.
pub fn is_expired(token: &str) -> bool {
    if !is_valid_format(token) {
        return true;
    }

    match decode_claims(token) {
        Ok(claims) => match claims.exp {
            Some(exp) => exp < now_secs(),
            None => false,
        },
        Err(e) => {
            warn!(error = %e, "failed to decode token payload, treating as expired");
            true
        }
    }
}

/// Decode the registered claims from the payload segment.
pub fn decode_claims(token: &str) -> Result<Claims> {
    let payload = decode_segment(segment(token, 1)?)?;
    serde_json::from_value(payload)
        .map_err(|e| Error::ClaimsDecode(format!("unrecognized claims: {e}")))
}

/// Decode header and payload into a summary (no signature verification).
///
/// Returns `None` for tokens whose shape or payload cannot be decoded.
pub fn token_info(token: &str) -> Option<TokenInfo> {
    if !is_valid_format(token) {
        return None;
    }

    let header = decode_segment(segment(token, 0).ok()?).ok()?;
    let payload = decode_segment(segment(token, 1).ok()?).ok()?;
    let claims: Claims = serde_json::from_value(payload.clone()).ok()?;

    Some(TokenInfo {
        header,
        payload,
        is_expired: is_expired(token),
        expires_at: claims.exp,
        issued_at: claims.iat,
    })
}

fn segment(token: &str, index: usize) -> Result<&str> {
    token
        .split('.')
        .nth(index)
        .ok_or_else(|| Error::InvalidFormat(format!("missing segment {index}")))
}

fn decode_segment(segment: &str) -> Result<Value> {
    let bytes = URL_SAFE_NO_PAD
        .decode(segment)
        .map_err(|e| Error::ClaimsDecode(format!("base64 decode failed: {e}")))?;
    serde_json::from_slice(&bytes)
        .map_err(|e| Error::ClaimsDecode(format!("payload is not JSON: {e}")))
}

/// Current wall-clock time as unix seconds.
pub(crate) fn now_secs() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}
