//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with one GET handler per configured route
//! - Wire up middleware (request ID, tracing, timeout)
//! - Validate queries, then hand requests to the resilient client
//! - Apply per-route fallback payloads
//! - Observability (metrics, correlation IDs)

use axum::{
    extract::{RawQuery, State},
    http::{HeaderMap, Uri},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::admin::setup_admin_router;
use crate::client::{ClientBuildError, ResilientClient};
use crate::config::{GatewayConfig, RouteConfig};
use crate::http::request::{build_api_request, request_id, MakeRequestUuidV4};
use crate::http::response::{cached_response, fallback_response, ApiError};
use crate::observability::metrics;

/// Liveness probe path, always mounted.
pub const HEALTH_PATH: &str = "/healthz";

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub client: ResilientClient,
    pub config: Arc<GatewayConfig>,
    pub started_at: Instant,
}

/// HTTP server for the gateway.
pub struct HttpServer {
    router: Router,
    config: Arc<GatewayConfig>,
}

impl HttpServer {
    /// Create a new HTTP server around an existing client.
    pub fn new(config: GatewayConfig, client: ResilientClient) -> Self {
        let config = Arc::new(config);
        let state = AppState {
            client,
            config: config.clone(),
            started_at: Instant::now(),
        };

        let router = Self::build_router(&config, state);
        Self { router, config }
    }

    /// Create a server whose client talks HTTP to the configured endpoints.
    pub fn from_config(config: GatewayConfig) -> Result<Self, ClientBuildError> {
        let client = ResilientClient::from_config(&config.upstream)?;
        Ok(Self::new(config, client))
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &GatewayConfig, state: AppState) -> Router {
        let mut router: Router<AppState> =
            Router::new().route(HEALTH_PATH, get(|| async { "ok" }));

        for route in &config.routes {
            let route = Arc::new(route.clone());
            let path = route.path.clone();
            router = router.route(
                &path,
                get(
                    move |State(state): State<AppState>,
                          uri: Uri,
                          headers: HeaderMap,
                          RawQuery(query): RawQuery| {
                        proxy_route(state, route.clone(), uri, headers, query)
                    },
                ),
            );
        }

        if config.admin.enabled {
            router = router.merge(setup_admin_router(state.clone()));
        }

        router
            .with_state(state)
            .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)))
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(TraceLayer::new_for_http())
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuidV4))
    }

    /// The fully layered router, for serving or in-process testing.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Run the server until `shutdown` fires, then drain in-flight requests.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            routes = self.config.routes.len(),
            admin = self.config.admin.enabled,
            "HTTP server starting"
        );

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received, draining connections");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }
}

/// Validate, fetch through the resilient client, and shape the response.
async fn proxy_route(
    state: AppState,
    route: Arc<RouteConfig>,
    uri: Uri,
    headers: HeaderMap,
    query: Option<String>,
) -> Response {
    let start = Instant::now();
    let request_id = request_id(&headers).to_string();

    let request = match build_api_request(&route, uri.path(), query.as_deref(), &headers) {
        Ok(request) => request,
        Err(e) => {
            tracing::debug!(request_id = %request_id, route = %route.path, error = %e, "Rejected request");
            metrics::record_request(&route.path, e.status().as_u16(), start);
            return e.into_response();
        }
    };

    let policy = route.policy();
    let response = match state.client.get(&request, policy).await {
        Ok(cached) => {
            tracing::debug!(
                request_id = %request_id,
                path = %request.path_and_query(),
                cache = cached.status.as_str(),
                "Served request"
            );
            cached_response(&cached, policy)
        }
        Err(e) => match &route.fallback {
            Some(fallback) => {
                tracing::warn!(
                    request_id = %request_id,
                    path = %request.path_and_query(),
                    error = %e,
                    "Upstream unavailable, serving fallback payload"
                );
                fallback_response(fallback)
            }
            None => {
                tracing::error!(
                    request_id = %request_id,
                    path = %request.path_and_query(),
                    error = %e,
                    "Upstream request failed"
                );
                ApiError::from(e).into_response()
            }
        },
    };

    metrics::record_request(&route.path, response.status().as_u16(), start);
    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::upstream::{BackendEndpoints, FailoverDispatcher, HttpTransport};
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    fn server(config: GatewayConfig) -> HttpServer {
        // Nothing listens on the discard port; these tests never reach upstream.
        let endpoints = BackendEndpoints::new(["http://127.0.0.1:9"]).unwrap();
        let transport = Arc::new(HttpTransport::with_client(reqwest::Client::new()));
        let client = ResilientClient::new(FailoverDispatcher::new(endpoints, transport));
        HttpServer::new(config, client)
    }

    async fn send(router: Router, uri: &str) -> Response {
        router
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_healthz() {
        let response = send(server(GatewayConfig::default()).router(), "/healthz").await;
        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().contains_key("x-request-id"));
    }

    #[tokio::test]
    async fn test_missing_param_rejected_before_upstream() {
        let server = server(GatewayConfig::default());
        let response = send(server.router(), "/api/holders?chain=paxi").await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(response.headers()["cache-control"], "no-store");
    }

    #[tokio::test]
    async fn test_unknown_route_is_not_found() {
        let response = send(server(GatewayConfig::default()).router(), "/api/unknown").await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_admin_mounted_only_when_enabled() {
        let response = send(server(GatewayConfig::default()).router(), "/admin/status").await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let mut config = GatewayConfig::default();
        config.admin.enabled = true;
        config.admin.api_key = "secret".into();
        let response = send(server(config).router(), "/admin/status").await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}
