//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate endpoint URLs and value ranges
//! - Detect duplicate routes and contradictory cache policies
//! - Reject route paths the router cannot mount (reserved or `:name` syntax)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: GatewayConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::collections::HashSet;
use std::net::SocketAddr;

use thiserror::Error;

use crate::admin::ADMIN_PATHS;
use crate::config::schema::GatewayConfig;
use crate::http::server::HEALTH_PATH;
use crate::upstream::Endpoint;

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("no backend endpoints configured (set upstream.endpoints or WINSCAN_ENDPOINTS)")]
    NoEndpoints,

    #[error("{0}")]
    InvalidEndpoint(String),

    #[error("upstream.attempt_timeout_ms must be greater than 0")]
    ZeroAttemptTimeout,

    #[error("timeouts.request_secs must be greater than 0")]
    ZeroRequestTimeout,

    #[error("invalid listener.bind_address {0:?}")]
    InvalidBindAddress(String),

    #[error("route path {0:?} must start with '/'")]
    InvalidRoutePath(String),

    #[error("route path {0:?} uses ':' or '*' segments; write parameters as {{name}}")]
    LegacyPathSyntax(String),

    #[error("route path {0:?} is reserved by the gateway")]
    ReservedRoutePath(String),

    #[error("route {0:?} is defined more than once")]
    DuplicateRoute(String),

    #[error("route {0:?} has swr_secs without ttl_secs")]
    SwrWithoutTtl(String),

    #[error("admin.api_key must be set when the admin API is enabled")]
    MissingAdminKey,
}

pub fn validate_config(config: &GatewayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.upstream.endpoints.is_empty() {
        errors.push(ValidationError::NoEndpoints);
    }
    for raw in &config.upstream.endpoints {
        if let Err(e) = Endpoint::parse(raw) {
            errors.push(ValidationError::InvalidEndpoint(e.to_string()));
        }
    }
    if config.upstream.attempt_timeout_ms == 0 {
        errors.push(ValidationError::ZeroAttemptTimeout);
    }
    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::ZeroRequestTimeout);
    }
    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidBindAddress(
            config.listener.bind_address.clone(),
        ));
    }

    let mut seen = HashSet::new();
    for route in &config.routes {
        if !route.path.starts_with('/') {
            errors.push(ValidationError::InvalidRoutePath(route.path.clone()));
        }
        if route
            .path
            .split('/')
            .any(|segment| segment.starts_with(':') || segment.starts_with('*'))
        {
            errors.push(ValidationError::LegacyPathSyntax(route.path.clone()));
        }
        if route.path == HEALTH_PATH
            || (config.admin.enabled && ADMIN_PATHS.contains(&route.path.as_str()))
        {
            errors.push(ValidationError::ReservedRoutePath(route.path.clone()));
        }
        if !seen.insert(route.path.as_str()) {
            errors.push(ValidationError::DuplicateRoute(route.path.clone()));
        }
        if route.ttl_secs == 0 && route.swr_secs > 0 {
            errors.push(ValidationError::SwrWithoutTtl(route.path.clone()));
        }
    }

    if config.admin.enabled && config.admin.api_key.trim().is_empty() {
        errors.push(ValidationError::MissingAdminKey);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
