//! The injectable application root
//!
//! One `SessionContext` owns the durable storage slot and every component
//! built on it, wiring the coordinator into the request pipeline as its
//! unauthorized hook. The UI host constructs it once at startup and passes
//! it by reference to whatever needs it — there is no ambient global state.

use std::path::PathBuf;
use std::sync::Arc;

use bill_api::{ApiClient, ApiConfig, HttpTransport, InsightCache, Transport};
use bill_auth::TokenStore;
use bill_cache::CacheStore;
use common::DurableKv;
use tracing::info;

use crate::coordinator::{SessionCoordinator, SessionRoutes};
use crate::guard::NavigationGuard;
use crate::prompt::UiPrompt;
use crate::router::Navigator;

/// Application root owning storage, stores, guard, coordinator and client.
pub struct SessionContext {
    storage: Arc<DurableKv>,
    tokens: Arc<TokenStore>,
    cache: Arc<CacheStore>,
    guard: Arc<NavigationGuard>,
    coordinator: Arc<SessionCoordinator>,
    api: Arc<ApiClient>,
    insights: Arc<InsightCache>,
}

impl SessionContext {
    /// Build the full component graph over the given storage path, using the
    /// reqwest transport.
    pub async fn new(
        storage_path: PathBuf,
        api_config: ApiConfig,
        navigator: Arc<dyn Navigator>,
        prompt: Arc<dyn UiPrompt>,
        routes: SessionRoutes,
    ) -> common::Result<Self> {
        Self::with_transport(
            storage_path,
            api_config,
            Arc::new(HttpTransport::new()),
            navigator,
            prompt,
            routes,
        )
        .await
    }

    /// Build the component graph with an explicit transport.
    pub async fn with_transport(
        storage_path: PathBuf,
        api_config: ApiConfig,
        transport: Arc<dyn Transport>,
        navigator: Arc<dyn Navigator>,
        prompt: Arc<dyn UiPrompt>,
        routes: SessionRoutes,
    ) -> common::Result<Self> {
        let storage = Arc::new(DurableKv::load(storage_path).await?);
        let tokens = Arc::new(TokenStore::new(storage.clone()));
        let cache = Arc::new(CacheStore::new(storage.clone()));
        let guard = Arc::new(NavigationGuard::new(navigator, &routes.login));
        let coordinator = Arc::new(SessionCoordinator::new(
            tokens.clone(),
            guard.clone(),
            prompt,
            routes,
            storage.clone(),
        ));
        let api = Arc::new(ApiClient::new(
            api_config,
            transport,
            tokens.clone(),
            cache.clone(),
            coordinator.clone(),
        ));
        let insights = Arc::new(InsightCache::new(storage.clone()));

        Ok(Self {
            storage,
            tokens,
            cache,
            guard,
            coordinator,
            api,
            insights,
        })
    }

    /// Application-start housekeeping: sweep expired cache records, then
    /// resolve any persisted credential so the session flag is accurate.
    pub async fn initialize(&self) {
        self.cache.clear_expired().await;
        match self.tokens.get_valid().await {
            Some(_) => info!("restored persisted session"),
            None => info!("starting logged out"),
        }
    }

    pub fn storage(&self) -> &Arc<DurableKv> {
        &self.storage
    }

    pub fn tokens(&self) -> &Arc<TokenStore> {
        &self.tokens
    }

    pub fn cache(&self) -> &Arc<CacheStore> {
        &self.cache
    }

    pub fn guard(&self) -> &Arc<NavigationGuard> {
        &self.guard
    }

    pub fn coordinator(&self) -> &Arc<SessionCoordinator> {
        &self.coordinator
    }

    pub fn api(&self) -> &Arc<ApiClient> {
        &self.api
    }

    pub fn insights(&self) -> &Arc<InsightCache> {
        &self.insights
    }
}
