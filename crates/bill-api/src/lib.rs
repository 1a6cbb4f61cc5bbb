//! Unified API request pipeline for the bill-tracking client
//!
//! All backend traffic flows through `ApiClient::request`: configuration
//! checks, credential injection, the response cache, transport dispatch,
//! response-shape normalization and error classification live here so page
//! components only ever see a `Result<ApiResponse, ApiError>`.
//!
//! The backend's responses are inconsistent — sometimes a wrapped
//! `{code, data, message}` object, sometimes a bare object, sometimes plain
//! text. The pipeline never crashes on shape variance: a 2xx with a body
//! always resolves, degrading to the least-processed form it can return
//! (`ApiResponse::Text`).
//!
//! Request flow:
//! 1. Resolve the full URL (fails fast on missing configuration)
//! 2. Authenticated requests require a valid credential before any I/O
//! 3. Cache-eligible GETs are served from the durable cache when live
//! 4. The transport returns status + raw text (never auto-parsed JSON)
//! 5. HTTP 401 tears down the session via the injected `SessionHooks`
//! 6. 2xx bodies are normalized; other statuses map to table-driven errors

pub mod codes;
pub mod config;
pub mod endpoints;
pub mod error;
pub mod insight_cache;
pub mod pipeline;
pub mod response;
pub mod transport;

pub use config::ApiConfig;
pub use endpoints::InsightPeriod;
pub use error::{ApiError, Result};
pub use insight_cache::InsightCache;
pub use pipeline::{ApiClient, ApiRequest, SessionHooks};
pub use response::ApiResponse;
pub use transport::{HttpTransport, Method, RawResponse, Transport, TransportError};
