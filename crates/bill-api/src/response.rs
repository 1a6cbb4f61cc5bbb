//! Response-shape normalization
//!
//! The backend returns three body shapes: a wrapped `{code, data, message}`
//! envelope, an arbitrary JSON value, or plain text (AI summaries). The
//! classifier maps every body onto a tagged union instead of duck-typing at
//! call sites; it is total, so a 2xx with a body always yields a usable
//! value.

use serde_json::{Map, Value, json};

use crate::codes;

/// Normalized response delivered to callers.
///
/// Cached values round-trip through `to_value`/`classify`, so a cache hit
/// carries the same tag as the fresh response did.
#[derive(Debug, Clone, PartialEq)]
pub enum ApiResponse {
    /// Business envelope with a numeric `code`
    Wrapped {
        code: i64,
        data: Option<Value>,
        message: Option<String>,
    },
    /// Plain text the backend intentionally returns unwrapped
    Text(String),
    /// Any other JSON value
    Raw(Value),
}

impl ApiResponse {
    /// Normalize a transport body.
    ///
    /// An absent or empty body becomes a minimal envelope carrying the HTTP
    /// status. Text that parses as JSON is classified; text that doesn't is
    /// returned unchanged — some endpoints intentionally reply in plain text,
    /// and a parse failure must never lose a successful response.
    pub fn normalize(status: u16, body: Option<&str>) -> Self {
        match body {
            None => Self::empty(status),
            Some(text) if text.is_empty() => Self::empty(status),
            Some(text) => match serde_json::from_str::<Value>(text) {
                Ok(value) => Self::classify(value),
                Err(_) => Self::Text(text.to_string()),
            },
        }
    }

    /// Classify a JSON value into the tagged union.
    ///
    /// Objects with a numeric `code` become `Wrapped`; an error code without
    /// an explicit `message`/`msg` field gets the business-table message.
    pub fn classify(value: Value) -> Self {
        match value {
            Value::String(text) => Self::Text(text),
            Value::Object(map) => match map.get("code").and_then(Value::as_i64) {
                Some(code) => Self::from_envelope(code, map),
                None => Self::Raw(Value::Object(map)),
            },
            other => Self::Raw(other),
        }
    }

    fn from_envelope(code: i64, map: Map<String, Value>) -> Self {
        let explicit = map
            .get("message")
            .or_else(|| map.get("msg"))
            .and_then(Value::as_str)
            .map(str::to_string);
        let message = explicit.or_else(|| {
            if codes::is_success(code) {
                None
            } else {
                codes::business_message(code).map(str::to_string)
            }
        });

        Self::Wrapped {
            code,
            data: map.get("data").cloned(),
            message,
        }
    }

    fn empty(status: u16) -> Self {
        Self::Wrapped {
            code: status as i64,
            data: None,
            message: Some("empty response".to_string()),
        }
    }

    /// Render back to a JSON value (the cacheable form).
    pub fn to_value(&self) -> Value {
        match self {
            Self::Wrapped {
                code,
                data,
                message,
            } => {
                let mut map = Map::new();
                map.insert("code".to_string(), json!(code));
                if let Some(data) = data {
                    map.insert("data".to_string(), data.clone());
                }
                if let Some(message) = message {
                    map.insert("message".to_string(), json!(message));
                }
                Value::Object(map)
            }
            Self::Text(text) => Value::String(text.clone()),
            Self::Raw(value) => value.clone(),
        }
    }

    /// Business code, when the response is a wrapped envelope.
    pub fn code(&self) -> Option<i64> {
        match self {
            Self::Wrapped { code, .. } => Some(*code),
            _ => None,
        }
    }

    /// Envelope payload, when present.
    pub fn data(&self) -> Option<&Value> {
        match self {
            Self::Wrapped { data, .. } => data.as_ref(),
            _ => None,
        }
    }

    /// Envelope message, when present.
    pub fn message(&self) -> Option<&str> {
        match self {
            Self::Wrapped { message, .. } => message.as_deref(),
            _ => None,
        }
    }

    /// Plain-text content, when the response is text.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            _ => None,
        }
    }
}
