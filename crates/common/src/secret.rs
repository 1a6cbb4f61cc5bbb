//! Secret wrapper for bearer credentials
//!
//! Login responses and the token store pass credentials around as plain
//! strings internally, but anything that crosses a logging or Debug boundary
//! wraps them in `Secret` so a stray `{:?}` cannot leak a live token.

use std::fmt;
use zeroize::Zeroize;

/// Sensitive string value - redacted in Debug/Display/logs, zeroized on drop
pub struct Secret(String);

impl Secret {
    /// Wrap a sensitive value
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Expose the inner value (use sparingly)
    pub fn expose(&self) -> &str {
        &self.0
    }

    /// Length of the wrapped value; safe to log
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the wrapped value is empty
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[REDACTED]")
    }
}

impl fmt::Display for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[REDACTED]")
    }
}

impl Drop for Secret {
    fn drop(&mut self) {
        self.0.zeroize();
    }
}

impl Clone for Secret {
    fn clone(&self) -> Self {
        Self(self.0.clone())
    }
}

impl From<String> for Secret {
    fn from(value: String) -> Self {
        Self(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn secret_redacts_debug_and_display() {
        let secret = Secret::new("header.payload.signature");
        assert_eq!(format!("{:?}", secret), "[REDACTED]");
        assert_eq!(format!("{}", secret), "[REDACTED]");
    }

    #[test]
    fn secret_exposes_value() {
        let secret = Secret::new("header.payload.signature");
        assert_eq!(secret.expose(), "header.payload.signature");
        assert_eq!(secret.len(), 24);
        assert!(!secret.is_empty());
    }

    #[test]
    fn secret_from_string() {
        let secret: Secret = String::from("tok").into();
        assert_eq!(secret.expose(), "tok");
    }
}
