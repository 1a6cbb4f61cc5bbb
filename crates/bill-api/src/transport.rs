//! Transport seam between the pipeline and the HTTP client
//!
//! The pipeline talks to a `Transport` trait object rather than reqwest
//! directly, so tests can observe dispatches without a network. The real
//! implementation always fetches the body as text — several endpoints return
//! plain text or JSON-looking strings, and parsing is the pipeline's job.
//!
//! Uses `Pin<Box<dyn Future>>` return types for dyn-compatibility
//! (`Arc<dyn Transport>`).

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use serde_json::Value;

/// HTTP methods the backend API uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Delete => "DELETE",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outgoing request handed to the transport.
#[derive(Debug, Clone)]
pub struct TransportRequest {
    pub url: String,
    pub method: Method,
    pub headers: Vec<(String, String)>,
    /// Query parameters for GET, JSON body for write methods
    pub data: Option<Value>,
    pub timeout: Duration,
}

/// Raw transport result: the status and body text, untouched.
#[derive(Debug, Clone)]
pub struct RawResponse {
    pub status: u16,
    pub body: Option<String>,
}

/// Transport-level failures.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// No response was received
    #[error("request failed: {0}")]
    Network(String),

    /// A response arrived but its body could not be read
    #[error("response body read failed: {0}")]
    Body(String),
}

/// Abstraction over the HTTP client.
pub trait Transport: Send + Sync {
    fn send(
        &self,
        request: TransportRequest,
    ) -> Pin<Box<dyn Future<Output = Result<RawResponse, TransportError>> + Send + '_>>;
}

/// reqwest-backed transport.
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }
}

impl Default for HttpTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl Transport for HttpTransport {
    fn send(
        &self,
        request: TransportRequest,
    ) -> Pin<Box<dyn Future<Output = Result<RawResponse, TransportError>> + Send + '_>> {
        Box::pin(async move {
            let method = match request.method {
                Method::Get => reqwest::Method::GET,
                Method::Post => reqwest::Method::POST,
                Method::Put => reqwest::Method::PUT,
                Method::Delete => reqwest::Method::DELETE,
            };

            let mut builder = self
                .client
                .request(method, &request.url)
                .timeout(request.timeout);

            for (name, value) in &request.headers {
                builder = builder.header(name, value);
            }

            if let Some(data) = &request.data {
                builder = match request.method {
                    Method::Get => builder.query(&query_pairs(data)),
                    _ => builder.json(data),
                };
            }

            let response = builder
                .send()
                .await
                .map_err(|e| TransportError::Network(e.to_string()))?;

            let status = response.status().as_u16();
            let body = response
                .text()
                .await
                .map_err(|e| TransportError::Body(e.to_string()))?;

            Ok(RawResponse {
                status,
                body: if body.is_empty() { None } else { Some(body) },
            })
        })
    }
}

/// Flatten a JSON object into query pairs; null values are skipped.
fn query_pairs(data: &Value) -> Vec<(String, String)> {
    let Value::Object(map) = data else {
        return Vec::new();
    };
    map.iter()
        .filter(|(_, value)| !value.is_null())
        .map(|(name, value)| {
            let rendered = match value {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            (name.clone(), rendered)
        })
        .collect()
}
