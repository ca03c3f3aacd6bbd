//! Request handling and transformation.
//!
//! # Responsibilities
//! - Generate a unique request ID (UUID v4) for every gateway request
//! - Validate required query parameters before anything reaches the client
//! - Build the canonical `ApiRequest` forwarded upstream
//!
//! # Design Decisions
//! - Only declared parameters are forwarded, so arbitrary extras cannot
//!   fragment the cache
//! - Only declared headers are forwarded; they become part of the cache key

use axum::http::{HeaderMap, HeaderValue, Request};
use tower_http::request_id::{MakeRequestId, RequestId};
use url::form_urlencoded;
use uuid::Uuid;

use crate::cache::ApiRequest;
use crate::config::RouteConfig;
use crate::http::response::ApiError;
use crate::upstream::RequestOptions;

pub const X_REQUEST_ID: &str = "x-request-id";

/// Request ID generator for `SetRequestIdLayer`.
#[derive(Debug, Clone, Copy, Default)]
pub struct MakeRequestUuidV4;

impl MakeRequestId for MakeRequestUuidV4 {
    fn make_request_id<B>(&mut self, _request: &Request<B>) -> Option<RequestId> {
        HeaderValue::from_str(&Uuid::new_v4().to_string())
            .ok()
            .map(RequestId::new)
    }
}

/// The request ID set by the middleware, or `"unknown"`.
pub fn request_id(headers: &HeaderMap) -> &str {
    headers
        .get(X_REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown")
}

/// Validate the query against `route` and build the upstream request for `path`.
pub fn build_api_request(
    route: &RouteConfig,
    path: &str,
    raw_query: Option<&str>,
    headers: &HeaderMap,
) -> Result<ApiRequest, ApiError> {
    let pairs: Vec<(String, String)> = raw_query
        .map(|q| form_urlencoded::parse(q.as_bytes()).into_owned().collect())
        .unwrap_or_default();
    // Last occurrence wins for repeated keys.
    let lookup = |name: &str| {
        pairs
            .iter()
            .rev()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.trim())
            .filter(|v| !v.is_empty())
    };

    let mut request = ApiRequest::new(path);
    for name in &route.required {
        match lookup(name) {
            Some(value) => request = request.with_param(name.as_str(), value),
            None => return Err(ApiError::MissingParam(name.clone())),
        }
    }
    for name in &route.optional {
        if let Some(value) = lookup(name) {
            request = request.with_param(name.as_str(), value);
        }
    }

    let mut options = RequestOptions::new();
    for name in &route.forward_headers {
        if let Some(value) = headers.get(name.as_str()).and_then(|v| v.to_str().ok()) {
            options = options.with_header(name, value);
        }
    }

    Ok(request.with_options(options))
}
