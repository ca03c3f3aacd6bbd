//! Resilient fetch client.
//!
//! # Data Flow
//! ```text
//! get(request, policy)
//!     → ResponseCache::get_or_fetch (key = request.cache_key())
//!         → producer: Deduplicator::dedupe (signature = request.signature())
//!             → FailoverDispatcher::fetch_with_failover
//! ```
//!
//! The cache, the pending-request map and the dispatcher are created with the
//! client and dropped with it, so independent clients never share state.

use std::sync::Arc;

use futures_util::future::BoxFuture;
use futures_util::FutureExt;
use thiserror::Error;

use crate::cache::{ApiRequest, CachePolicy, Cached, Deduplicator, ResponseCache};
use crate::config::UpstreamConfig;
use crate::upstream::{
    BackendEndpoints, EndpointError, FailoverDispatcher, FetchResult, HttpTransport, Payload,
    Transport,
};

/// Errors raised while building a client from configuration.
#[derive(Debug, Error)]
pub enum ClientBuildError {
    #[error(transparent)]
    Endpoints(#[from] EndpointError),

    #[error("failed to build HTTP client: {0}")]
    Http(#[from] reqwest::Error),
}

/// Failover + cache + dedup client shared by all route handlers.
#[derive(Debug, Clone)]
pub struct ResilientClient {
    dispatcher: Arc<FailoverDispatcher>,
    cache: ResponseCache,
    dedup: Deduplicator,
}

impl ResilientClient {
    pub fn new(dispatcher: FailoverDispatcher) -> Self {
        Self {
            dispatcher: Arc::new(dispatcher),
            cache: ResponseCache::new(),
            dedup: Deduplicator::new(),
        }
    }

    /// Build a client talking HTTP to the configured endpoints.
    pub fn from_config(config: &UpstreamConfig) -> Result<Self, ClientBuildError> {
        let endpoints = BackendEndpoints::new(&config.endpoints)?;
        let transport: Arc<dyn Transport> = Arc::new(HttpTransport::new(&config.user_agent)?);
        let dispatcher =
            FailoverDispatcher::new(endpoints, transport).with_attempt_timeout(config.attempt_timeout());

        tracing::info!(
            primary = %dispatcher.endpoints().primary(),
            endpoints = dispatcher.endpoints().len(),
            attempt_timeout_ms = config.attempt_timeout_ms,
            "Resilient client initialized"
        );

        Ok(Self::new(dispatcher))
    }

    /// Cached, deduplicated, failover-protected fetch.
    pub async fn get(&self, request: &ApiRequest, policy: CachePolicy) -> FetchResult<Cached> {
        let key = request.cache_key();
        self.cache
            .get_or_fetch(&key, policy, self.producer(request))
            .await
    }

    /// Deduplicated fetch that never touches the cache.
    pub async fn fetch(&self, request: &ApiRequest) -> FetchResult<Payload> {
        (self.producer(request))().await
    }

    fn producer(
        &self,
        request: &ApiRequest,
    ) -> impl FnOnce() -> BoxFuture<'static, FetchResult<Payload>> + Send + 'static {
        let dispatcher = Arc::clone(&self.dispatcher);
        let dedup = self.dedup.clone();
        let signature = request.signature();
        let path = request.path_and_query();
        let options = request.options().clone();

        move || {
            async move {
                dedup
                    .dedupe(&signature, move || async move {
                        dispatcher.fetch_with_failover(&path, &options).await
                    })
                    .await
            }
            .boxed()
        }
    }

    pub fn cache(&self) -> &ResponseCache {
        &self.cache
    }

    pub fn dedup(&self) -> &Deduplicator {
        &self.dedup
    }

    pub fn endpoints(&self) -> &BackendEndpoints {
        self.dispatcher.endpoints()
    }
}
