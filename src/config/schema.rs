//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the gateway.
//! All types derive Serde traits for deserialization from config files.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::cache::CachePolicy;

/// Root configuration for the gateway.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct GatewayConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Backend endpoints and attempt limits.
    pub upstream: UpstreamConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Exposed API routes and their cache policies.
    pub routes: Vec<RouteConfig>,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    /// Admin API settings.
    pub admin: AdminConfig,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            listener: ListenerConfig::default(),
            upstream: UpstreamConfig::default(),
            timeouts: TimeoutConfig::default(),
            routes: default_routes(),
            observability: ObservabilityConfig::default(),
            admin: AdminConfig::default(),
        }
    }
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
        }
    }
}

/// Backend API configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct UpstreamConfig {
    /// Base URLs in attempt order: primary first, then fallbacks.
    pub endpoints: Vec<String>,

    /// Upper bound for a single endpoint attempt, in milliseconds.
    pub attempt_timeout_ms: u64,

    /// User-Agent sent to the backend.
    pub user_agent: String,
}

impl UpstreamConfig {
    pub fn attempt_timeout(&self) -> Duration {
        Duration::from_millis(self.attempt_timeout_ms)
    }
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            endpoints: Vec::new(),
            attempt_timeout_ms: 8_000,
            user_agent: concat!("winscan-gateway/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

/// Timeout configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Total time a gateway request may take, in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { request_secs: 30 }
    }
}

/// One exposed GET route, proxied to the same path on the backend.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct RouteConfig {
    /// Route path in axum syntax, e.g. `/api/blocks/{height}`.
    pub path: String,

    /// Query parameters that must be present and non-empty.
    #[serde(default)]
    pub required: Vec<String>,

    /// Query parameters forwarded when present.
    #[serde(default)]
    pub optional: Vec<String>,

    /// Seconds a response is fresh. 0 disables caching.
    #[serde(default)]
    pub ttl_secs: u64,

    /// Seconds after `ttl_secs` during which stale data is served.
    #[serde(default)]
    pub swr_secs: u64,

    /// Client headers forwarded upstream (and folded into the cache key).
    #[serde(default)]
    pub forward_headers: Vec<String>,

    /// Body returned instead of an error when the backend is unavailable.
    #[serde(default)]
    pub fallback: Option<serde_json::Value>,
}

impl RouteConfig {
    pub fn new(path: &str, required: &[&str], optional: &[&str], ttl_secs: u64, swr_secs: u64) -> Self {
        Self {
            path: path.to_string(),
            required: required.iter().map(|s| s.to_string()).collect(),
            optional: optional.iter().map(|s| s.to_string()).collect(),
            ttl_secs,
            swr_secs,
            forward_headers: Vec::new(),
            fallback: None,
        }
    }

    pub fn policy(&self) -> CachePolicy {
        CachePolicy::from_secs(self.ttl_secs, self.swr_secs)
    }
}

/// Built-in route table for the explorer API.
pub fn default_routes() -> Vec<RouteConfig> {
    vec![
        RouteConfig::new("/api/assets", &["chain"], &["limit", "offset"], 60, 120),
        RouteConfig::new("/api/asset-detail", &["chain", "denom"], &[], 60, 120),
        RouteConfig::new("/api/blocks", &["chain"], &["limit", "page"], 10, 30),
        RouteConfig::new("/api/blocks/{height}", &["chain"], &[], 300, 600),
        RouteConfig::new("/api/validator", &["chain"], &["address"], 30, 60),
        RouteConfig::new("/api/network", &["chain"], &[], 30, 60),
        RouteConfig::new("/api/parameters", &["chain"], &[], 300, 600),
        RouteConfig::new("/api/proposal", &["chain"], &["id", "status"], 60, 120),
        RouteConfig::new("/api/uptime", &["chain"], &["address", "blocks"], 30, 60),
        RouteConfig::new("/api/relayers", &["chain"], &[], 0, 0),
        RouteConfig::new("/api/holders", &["chain", "denom"], &["limit", "offset"], 60, 120),
        RouteConfig::new("/api/chains", &[], &[], 300, 600),
    ]
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: true,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

/// Admin API configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AdminConfig {
    /// Mount `/admin/*` routes.
    pub enabled: bool,

    /// API key for authentication (Bearer token).
    pub api_key: String,
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            api_key: String::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_route_policies() {
        let routes = default_routes();
        let policy_of = |path: &str| {
            routes
                .iter()
                .find(|r| r.path == path)
                .map(RouteConfig::policy)
                .unwrap()
        };

        assert_eq!(policy_of("/api/assets"), CachePolicy::from_secs(60, 120));
        assert_eq!(policy_of("/api/blocks"), CachePolicy::from_secs(10, 30));
        assert_eq!(policy_of("/api/chains"), CachePolicy::from_secs(300, 600));
        assert!(policy_of("/api/relayers").is_no_store());
    }

    #[test]
    fn test_minimal_toml_keeps_defaults() {
        let config: GatewayConfig = toml::from_str(
            r#"
            [upstream]
            endpoints = ["https://primary.example", "https://secondary.example"]
            "#,
        )
        .unwrap();

        assert_eq!(config.upstream.endpoints.len(), 2);
        assert_eq!(config.upstream.attempt_timeout(), Duration::from_secs(8));
        assert_eq!(config.routes, default_routes());
        assert_eq!(config.listener.bind_address, "0.0.0.0:8080");
    }

    #[test]
    fn test_route_with_fallback() {
        let config: GatewayConfig = toml::from_str(
            r#"
            [[routes]]
            path = "/api/relayers"
            required = ["chain"]
            fallback = { relayers = [] }
            "#,
        )
        .unwrap();

        assert_eq!(config.routes.len(), 1);
        assert_eq!(
            config.routes[0].fallback,
            Some(serde_json::json!({ "relayers": [] }))
        );
        assert!(config.routes[0].policy().is_no_store());
    }
}
