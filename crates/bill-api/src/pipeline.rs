//! The unified request pipeline
//!
//! `ApiClient` composes the token store, the cache store and the transport.
//! Responses arrive out of order relative to dispatch — nothing here assumes
//! arrival order, and callers updating per-entity UI state must key those
//! updates by stable identity, not by positions captured at dispatch time.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use bill_auth::TokenStore;
use bill_cache::CacheStore;
use metrics::counter;
use serde_json::Value;
use tracing::{debug, error, warn};

use crate::codes::{self, cache_ttl};
use crate::config::ApiConfig;
use crate::error::{ApiError, Result};
use crate::response::ApiResponse;
use crate::transport::{Method, RawResponse, Transport, TransportError, TransportRequest};

/// Session-layer hook invoked on HTTP 401.
///
/// The single global unauthorized handler: clears the credential, surfaces
/// the session-expired notice and redirects to login. Must be idempotent
/// under concurrent invocation — several in-flight requests can discover the
/// rejected credential in the same instant.
pub trait SessionHooks: Send + Sync {
    fn on_unauthorized(&self) -> Pin<Box<dyn Future<Output = ()> + Send + '_>>;
}

/// Options for one API call.
///
/// Defaults: authenticated, cached iff the method is GET, medium cache TTL.
#[derive(Debug, Clone)]
pub struct ApiRequest {
    pub endpoint: String,
    pub method: Method,
    pub data: Option<Value>,
    pub headers: Vec<(String, String)>,
    pub need_auth: bool,
    /// `None` applies the method default (GET caches, writes don't)
    pub use_cache: Option<bool>,
    pub cache_ttl: Duration,
}

impl ApiRequest {
    pub fn new(method: Method, endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            method,
            data: None,
            headers: Vec::new(),
            need_auth: true,
            use_cache: None,
            cache_ttl: cache_ttl::MEDIUM,
        }
    }

    pub fn get(endpoint: impl Into<String>) -> Self {
        Self::new(Method::Get, endpoint)
    }

    pub fn post(endpoint: impl Into<String>) -> Self {
        Self::new(Method::Post, endpoint)
    }

    pub fn put(endpoint: impl Into<String>) -> Self {
        Self::new(Method::Put, endpoint)
    }

    pub fn delete(endpoint: impl Into<String>) -> Self {
        Self::new(Method::Delete, endpoint)
    }

    /// Attach query parameters (GET) or a JSON body (writes).
    pub fn data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Skip credential injection (login, public reference data).
    pub fn no_auth(mut self) -> Self {
        self.need_auth = false;
        self
    }

    /// Bypass the response cache even for GET.
    pub fn no_cache(mut self) -> Self {
        self.use_cache = Some(false);
        self
    }

    /// Cache the response with a specific TTL.
    pub fn cache_for(mut self, ttl: Duration) -> Self {
        self.use_cache = Some(true);
        self.cache_ttl = ttl;
        self
    }
}

/// The unified API client.
///
/// All backend calls go through `request` (normalized) or `request_raw`
/// (untouched transport response). The injected `SessionHooks` is the only
/// path from a 401 to the session layer.
pub struct ApiClient {
    config: ApiConfig,
    transport: Arc<dyn Transport>,
    tokens: Arc<TokenStore>,
    cache: Arc<CacheStore>,
    hooks: Arc<dyn SessionHooks>,
}

impl ApiClient {
    pub fn new(
        config: ApiConfig,
        transport: Arc<dyn Transport>,
        tokens: Arc<TokenStore>,
        cache: Arc<CacheStore>,
        hooks: Arc<dyn SessionHooks>,
    ) -> Self {
        Self {
            config,
            transport,
            tokens,
            cache,
            hooks,
        }
    }

    /// The configured base URL; a configuration error when unset.
    pub fn base_url(&self) -> Result<&str> {
        if self.config.base_url.is_empty() {
            error!("API base_url is not configured");
            return Err(ApiError::Config("API base_url is not configured".into()));
        }
        Ok(&self.config.base_url)
    }

    /// The token store backing this client.
    pub fn tokens(&self) -> &Arc<TokenStore> {
        &self.tokens
    }

    /// The cache store backing this client.
    pub fn cache(&self) -> &Arc<CacheStore> {
        &self.cache
    }

    /// Issue a request and normalize the response.
    pub async fn request(&self, req: ApiRequest) -> Result<ApiResponse> {
        let request_id = format!("req_{}", uuid::Uuid::new_v4().as_simple());
        let url = self.api_url(&req.endpoint)?;

        // Authenticated requests never reach the transport without a valid
        // credential
        let token = self.resolve_token(&req, &request_id).await?;

        let cache_key = self.cache_key(&req);
        if let Some(key) = &cache_key {
            if let Some(hit) = self.cache.get(key).await {
                debug!(request_id, endpoint = %req.endpoint, "serving response from cache");
                counter!("api_cache_hits_total").increment(1);
                return Ok(ApiResponse::classify(hit));
            }
        }

        let raw = self.dispatch(url, &req, token.as_deref()).await?;

        if raw.status == codes::UNAUTHORIZED {
            warn!(request_id, endpoint = %req.endpoint, "server rejected credential");
            counter!("api_unauthorized_total").increment(1);
            self.hooks.on_unauthorized().await;
            return Err(ApiError::Unauthorized);
        }

        if (200..300).contains(&raw.status) {
            let response = ApiResponse::normalize(raw.status, raw.body.as_deref());
            if matches!(response, ApiResponse::Text(_)) && raw.body.is_some() {
                // Deliberate degradation: a 2xx is never rejected over a parse
                // quirk, but an unparsed body is worth noticing in the logs
                warn!(request_id, endpoint = %req.endpoint, "2xx body is not JSON, returning raw text");
            }
            if let Some(key) = &cache_key {
                self.cache.set(key, response.to_value(), req.cache_ttl).await;
            }
            counter!("api_requests_total", "method" => req.method.as_str(), "outcome" => "success")
                .increment(1);
            return Ok(response);
        }

        let message = codes::status_message(raw.status)
            .map(str::to_string)
            .unwrap_or_else(|| format!("request failed: {}", raw.status));
        warn!(request_id, endpoint = %req.endpoint, status = raw.status, "request failed");
        counter!("api_requests_total", "method" => req.method.as_str(), "outcome" => "error")
            .increment(1);
        Err(ApiError::Server {
            status: raw.status,
            message,
        })
    }

    /// Issue a request and return the untouched transport response.
    ///
    /// Skips normalization, caching and status handling entirely — callers
    /// get the status and raw body even for error responses.
    pub async fn request_raw(&self, req: ApiRequest) -> Result<RawResponse> {
        let request_id = format!("req_{}", uuid::Uuid::new_v4().as_simple());
        let url = self.api_url(&req.endpoint)?;
        let token = self.resolve_token(&req, &request_id).await?;
        self.dispatch(url, &req, token.as_deref()).await
    }

    async fn resolve_token(&self, req: &ApiRequest, request_id: &str) -> Result<Option<String>> {
        if !req.need_auth {
            return Ok(None);
        }
        match self.tokens.get_valid().await {
            Some(token) => Ok(Some(token)),
            None => {
                debug!(request_id, endpoint = %req.endpoint, "rejected unauthenticated request");
                counter!("api_requests_total", "method" => req.method.as_str(), "outcome" => "unauthenticated")
                    .increment(1);
                Err(ApiError::Unauthenticated)
            }
        }
    }

    fn cache_key(&self, req: &ApiRequest) -> Option<String> {
        let use_cache = req.use_cache.unwrap_or(req.method == Method::Get);
        if !(use_cache && req.method == Method::Get) {
            return None;
        }
        Some(bill_cache::generate_key(
            &format!("api_{}_{}", req.endpoint, req.method.as_str()),
            req.data.as_ref(),
        ))
    }

    async fn dispatch(
        &self,
        url: String,
        req: &ApiRequest,
        token: Option<&str>,
    ) -> Result<RawResponse> {
        let mut headers = req.headers.clone();
        if let Some(token) = token {
            headers.push(("Authorization".to_string(), format!("Bearer {token}")));
        }

        let transport_request = TransportRequest {
            url,
            method: req.method,
            headers,
            data: req.data.clone(),
            timeout: Duration::from_secs(self.config.timeout_secs),
        };

        self.transport
            .send(transport_request)
            .await
            .map_err(|e| match e {
                TransportError::Network(msg) => {
                    counter!("api_requests_total", "method" => req.method.as_str(), "outcome" => "network_error")
                        .increment(1);
                    ApiError::Network(msg)
                }
                TransportError::Body(msg) => ApiError::Malformed(msg),
            })
    }

    fn api_url(&self, endpoint: &str) -> Result<String> {
        let base_url = self.base_url()?;
        if endpoint.is_empty() {
            return Err(ApiError::Config("API endpoint must not be empty".into()));
        }
        let endpoint = if endpoint.starts_with('/') {
            endpoint.to_string()
        } else {
            format!("/{endpoint}")
        };
        Ok(format!("{}{}", base_url.trim_end_matches('/'), endpoint))
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use common::DurableKv;
    use serde_json::json;
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Transport double: records every dispatched request and pops canned
    /// responses from a queue (the last one repeats).
    pub(crate) struct MockTransport {
        pub calls: AtomicUsize,
        pub requests: Mutex<Vec<TransportRequest>>,
        responses: Mutex<VecDeque<std::result::Result<RawResponse, TransportError>>>,
    }

    impl MockTransport {
        pub fn replying(status: u16, body: &str) -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicUsize::new(0),
                requests: Mutex::new(Vec::new()),
                responses: Mutex::new(VecDeque::from([Ok(RawResponse {
                    status,
                    body: if body.is_empty() {
                        None
                    } else {
                        Some(body.to_string())
                    },
                })])),
            })
        }

        pub fn failing(message: &str) -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicUsize::new(0),
                requests: Mutex::new(Vec::new()),
                responses: Mutex::new(VecDeque::from([Err(TransportError::Network(
                    message.to_string(),
                ))])),
            })
        }

        pub fn call_count(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }

        pub fn last_request(&self) -> Option<TransportRequest> {
            self.requests.lock().unwrap().last().cloned()
        }
    }

    impl Transport for MockTransport {
        fn send(
            &self,
            request: TransportRequest,
        ) -> Pin<Box<dyn Future<Output = std::result::Result<RawResponse, TransportError>> + Send + '_>>
        {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.requests.lock().unwrap().push(request);
            let mut responses = self.responses.lock().unwrap();
            let response = if responses.len() > 1 {
                responses.pop_front().unwrap()
            } else {
                match responses.front() {
                    Some(Ok(r)) => Ok(r.clone()),
                    Some(Err(TransportError::Network(m))) => {
                        Err(TransportError::Network(m.clone()))
                    }
                    Some(Err(TransportError::Body(m))) => Err(TransportError::Body(m.clone())),
                    None => Err(TransportError::Network("no canned response".into())),
                }
            };
            Box::pin(async move { response })
        }
    }

    /// Hooks double counting unauthorized teardowns.
    pub(crate) struct RecordingHooks {
        pub invoked: AtomicUsize,
    }

    impl RecordingHooks {
        pub fn new() -> Arc<Self> {
            Arc::new(Self {
                invoked: AtomicUsize::new(0),
            })
        }
    }

    impl SessionHooks for RecordingHooks {
        fn on_unauthorized(&self) -> Pin<Box<dyn Future<Output = ()> + Send + '_>> {
            self.invoked.fetch_add(1, Ordering::SeqCst);
            Box::pin(async {})
        }
    }

    pub(crate) struct Harness {
        pub client: ApiClient,
        pub transport: Arc<MockTransport>,
        pub hooks: Arc<RecordingHooks>,
        pub tokens: Arc<TokenStore>,
        _dir: tempfile::TempDir,
    }

    /// Structurally valid, never-expiring test token.
    pub(crate) fn test_token() -> String {
        use base64::Engine;
        let engine = base64::engine::general_purpose::URL_SAFE_NO_PAD;
        let header = engine.encode(br#"{"alg":"none"}"#);
        let payload = engine.encode(br#"{}"#);
        format!("{header}.{payload}.sig")
    }

    pub(crate) async fn harness(transport: Arc<MockTransport>, logged_in: bool) -> Harness {
        let dir = tempfile::tempdir().unwrap();
        let kv = Arc::new(
            DurableKv::load(dir.path().join("storage.json"))
                .await
                .unwrap(),
        );
        let tokens = Arc::new(TokenStore::new(kv.clone()));
        if logged_in {
            assert!(tokens.set(&test_token()).await);
        }
        let cache = Arc::new(CacheStore::new(kv));
        let hooks = RecordingHooks::new();
        let client = ApiClient::new(
            ApiConfig::new("http://api.test"),
            transport.clone(),
            tokens.clone(),
            cache,
            hooks.clone(),
        );
        Harness {
            client,
            transport,
            hooks,
            tokens,
            _dir: dir,
        }
    }

    #[tokio::test]
    async fn unauthenticated_request_never_reaches_transport() {
        let transport = MockTransport::replying(200, r#"{"code":200}"#);
        let h = harness(transport, false).await;

        let result = h.client.request(ApiRequest::get("/bill")).await;
        assert!(matches!(result, Err(ApiError::Unauthenticated)));
        assert_eq!(h.transport.call_count(), 0, "transport must see zero calls");
    }

    #[tokio::test]
    async fn bearer_token_is_injected() {
        let transport = MockTransport::replying(200, r#"{"code":200}"#);
        let h = harness(transport, true).await;

        h.client.request(ApiRequest::get("/bill/7")).await.unwrap();

        let sent = h.transport.last_request().unwrap();
        let auth = sent
            .headers
            .iter()
            .find(|(name, _)| name == "Authorization")
            .map(|(_, value)| value.clone())
            .expect("Authorization header must be present");
        assert_eq!(auth, format!("Bearer {}", test_token()));
        assert_eq!(sent.url, "http://api.test/bill/7");
    }

    #[tokio::test]
    async fn no_auth_request_omits_the_header() {
        let transport = MockTransport::replying(200, r#"{"code":200}"#);
        let h = harness(transport, false).await;

        h.client
            .request(ApiRequest::get("/bill-category/system").no_auth())
            .await
            .unwrap();

        let sent = h.transport.last_request().unwrap();
        assert!(sent.headers.iter().all(|(name, _)| name != "Authorization"));
    }

    #[tokio::test]
    async fn get_responses_are_cached() {
        let transport = MockTransport::replying(200, r#"{"code":200,"data":{"id":1}}"#);
        let h = harness(transport, true).await;

        let first = h.client.request(ApiRequest::get("/bill/1")).await.unwrap();
        let second = h.client.request(ApiRequest::get("/bill/1")).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(h.transport.call_count(), 1, "second call must hit the cache");
    }

    #[tokio::test]
    async fn cache_key_ignores_parameter_order() {
        let transport = MockTransport::replying(200, r#"{"code":200,"data":[]}"#);
        let h = harness(transport, true).await;

        h.client
            .request(ApiRequest::get("/user-budget").data(json!({"current": 1, "size": 10})))
            .await
            .unwrap();
        h.client
            .request(ApiRequest::get("/user-budget").data(json!({"size": 10, "current": 1})))
            .await
            .unwrap();

        assert_eq!(h.transport.call_count(), 1);
    }

    #[tokio::test]
    async fn no_cache_get_always_dispatches() {
        let transport = MockTransport::replying(200, r#"{"code":200,"data":[]}"#);
        let h = harness(transport, true).await;

        h.client
            .request(ApiRequest::get("/bill").no_cache())
            .await
            .unwrap();
        h.client
            .request(ApiRequest::get("/bill").no_cache())
            .await
            .unwrap();

        assert_eq!(h.transport.call_count(), 2);
    }

    #[tokio::test]
    async fn writes_are_never_cached() {
        let transport = MockTransport::replying(200, r#"{"code":200}"#);
        let h = harness(transport, true).await;
        let body = json!({"totalAmount": "12.50", "transactionType": "expense"});

        h.client
            .request(ApiRequest::post("/bill").data(body.clone()))
            .await
            .unwrap();
        h.client
            .request(ApiRequest::post("/bill").data(body.clone()))
            .await
            .unwrap();

        assert_eq!(h.transport.call_count(), 2);
        let sent = h.transport.last_request().unwrap();
        assert_eq!(sent.data, Some(body));
    }

    #[tokio::test]
    async fn unauthorized_runs_teardown_hook_once_per_response() {
        let transport = MockTransport::replying(401, r#"{"code":401}"#);
        let h = harness(transport, true).await;

        let result = h.client.request(ApiRequest::get("/user/me")).await;
        assert!(matches!(result, Err(ApiError::Unauthorized)));
        assert_eq!(h.hooks.invoked.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn error_status_maps_through_the_table() {
        let transport = MockTransport::replying(404, "");
        let h = harness(transport, true).await;

        match h.client.request(ApiRequest::get("/bill/999")).await {
            Err(ApiError::Server { status, message }) => {
                assert_eq!(status, 404);
                assert_eq!(message, "resource not found");
            }
            other => panic!("expected Server error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn unknown_error_status_gets_generic_message() {
        let transport = MockTransport::replying(418, "");
        let h = harness(transport, true).await;

        match h.client.request(ApiRequest::get("/bill")).await {
            Err(ApiError::Server { message, .. }) => {
                assert_eq!(message, "request failed: 418");
            }
            other => panic!("expected Server error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn plain_text_body_resolves_unchanged() {
        let transport = MockTransport::replying(200, "spending is trending up this month");
        let h = harness(transport, true).await;

        let response = h
            .client
            .request(ApiRequest::get("/ai-insight/summary/monthly").no_cache())
            .await
            .unwrap();
        assert_eq!(
            response,
            ApiResponse::Text("spending is trending up this month".into())
        );
    }

    #[tokio::test]
    async fn empty_body_resolves_to_minimal_envelope() {
        let transport = MockTransport::replying(204, "");
        let h = harness(transport, true).await;

        let response = h
            .client
            .request(ApiRequest::delete("/bill/7"))
            .await
            .unwrap();
        assert_eq!(response.code(), Some(204));
        assert_eq!(response.message(), Some("empty response"));
    }

    #[tokio::test]
    async fn network_failure_propagates() {
        let transport = MockTransport::failing("connection refused");
        let h = harness(transport, true).await;

        let result = h.client.request(ApiRequest::get("/bill")).await;
        assert!(matches!(result, Err(ApiError::Network(_))));
    }

    #[tokio::test]
    async fn raw_request_returns_untouched_response() {
        let transport = MockTransport::replying(500, "backend stack trace");
        let h = harness(transport, true).await;

        let raw = h
            .client
            .request_raw(ApiRequest::get("/ai-insight/summary/monthly"))
            .await
            .unwrap();
        assert_eq!(raw.status, 500);
        assert_eq!(raw.body.as_deref(), Some("backend stack trace"));
        assert_eq!(
            h.hooks.invoked.load(Ordering::SeqCst),
            0,
            "raw path must skip status handling"
        );
    }

    #[tokio::test]
    async fn empty_base_url_is_a_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let kv = Arc::new(
            DurableKv::load(dir.path().join("storage.json"))
                .await
                .unwrap(),
        );
        let transport = MockTransport::replying(200, "{}");
        let client = ApiClient::new(
            ApiConfig::default(),
            transport.clone(),
            Arc::new(TokenStore::new(kv.clone())),
            Arc::new(CacheStore::new(kv)),
            RecordingHooks::new(),
        );

        let result = client.request(ApiRequest::get("/bill").no_auth()).await;
        assert!(matches!(result, Err(ApiError::Config(_))));
        assert_eq!(transport.call_count(), 0);
    }

    #[tokio::test]
    async fn empty_endpoint_is_a_config_error() {
        let transport = MockTransport::replying(200, "{}");
        let h = harness(transport, true).await;

        let result = h.client.request(ApiRequest::get("")).await;
        assert!(matches!(result, Err(ApiError::Config(_))));
    }

    #[tokio::test]
    async fn endpoint_gets_leading_slash() {
        let transport = MockTransport::replying(200, r#"{"code":200}"#);
        let h = harness(transport, true).await;

        h.client
            .request(ApiRequest::get("user/me"))
            .await
            .unwrap();
        let sent = h.transport.last_request().unwrap();
        assert_eq!(sent.url, "http://api.test/user/me");
    }

    #[tokio::test]
    async fn expired_token_rejects_before_transport() {
        use base64::Engine;
        let engine = base64::engine::general_purpose::URL_SAFE_NO_PAD;
        let now = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_secs();
        let payload = engine.encode(format!(r#"{{"exp":{}}}"#, now - 10).as_bytes());
        let expired = format!("{}.{payload}.sig", engine.encode(br#"{"alg":"none"}"#));

        let transport = MockTransport::replying(200, "{}");
        let h = harness(transport, false).await;
        assert!(h.tokens.set(&expired).await);

        let result = h.client.request(ApiRequest::get("/bill")).await;
        assert!(matches!(result, Err(ApiError::Unauthenticated)));
        assert_eq!(h.transport.call_count(), 0);
    }
}
