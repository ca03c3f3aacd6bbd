//! Response building and error mapping.
//!
//! # Responsibilities
//! - Serialize opaque payloads without re-parsing them
//! - Advertise cache state (`x-cache`) and downstream caching (`cache-control`)
//! - Map request and upstream errors to status codes with a JSON body
//!
//! # Design Decisions
//! - Upstream failures surface as 502, never as the backend's own status
//! - Stale data is a success (200) flagged by `x-cache: STALE`

use axum::{
    body::Body,
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use crate::cache::{CachePolicy, Cached};
use crate::upstream::FetchError;

pub const X_CACHE: &str = "x-cache";

/// `x-cache` value for a configured fallback payload.
pub const FALLBACK: &str = "FALLBACK";

/// Errors a route handler turns into a response.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("missing required query parameter: {0}")]
    MissingParam(String),

    #[error(transparent)]
    Upstream(#[from] FetchError),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::MissingParam(_) => StatusCode::BAD_REQUEST,
            ApiError::Upstream(FetchError::InvalidPath(_)) => StatusCode::BAD_REQUEST,
            ApiError::Upstream(FetchError::Interrupted(_)) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Upstream(_) => StatusCode::BAD_GATEWAY,
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            ApiError::MissingParam(_) => "missing_param",
            ApiError::Upstream(e) => e.kind(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = json!({ "error": self.to_string(), "kind": self.kind() });
        let mut response = json_response(self.status(), &body);
        response
            .headers_mut()
            .insert(header::CACHE_CONTROL, HeaderValue::from_static("no-store"));
        response
    }
}

/// `cache-control` for a route policy.
pub fn cache_control(policy: CachePolicy) -> String {
    if policy.is_no_store() {
        return "no-store".to_string();
    }
    format!(
        "public, s-maxage={}, stale-while-revalidate={}",
        policy.ttl.as_secs(),
        policy.stale_while_revalidate.as_secs()
    )
}

/// 200 response for a value served by the client.
pub fn cached_response(cached: &Cached, policy: CachePolicy) -> Response {
    let mut response = json_response(StatusCode::OK, &cached.value);
    let headers = response.headers_mut();
    headers.insert(X_CACHE, HeaderValue::from_static(cached.status.as_str()));
    if let Ok(value) = HeaderValue::from_str(&cache_control(policy)) {
        headers.insert(header::CACHE_CONTROL, value);
    }
    response
}

/// 200 response for a route's configured fallback payload.
pub fn fallback_response(fallback: &serde_json::Value) -> Response {
    let mut response = json_response(StatusCode::OK, fallback);
    let headers = response.headers_mut();
    headers.insert(X_CACHE, HeaderValue::from_static(FALLBACK));
    headers.insert(header::CACHE_CONTROL, HeaderValue::from_static("no-store"));
    response
}

fn json_response(status: StatusCode, value: &serde_json::Value) -> Response {
    match serde_json::to_vec(value) {
        Ok(bytes) => {
            let mut response = Response::new(Body::from(bytes));
            *response.status_mut() = status;
            response.headers_mut().insert(
                header::CONTENT_TYPE,
                HeaderValue::from_static("application/json"),
            );
            response
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to serialize response body");
            (StatusCode::INTERNAL_SERVER_ERROR, "serialization failed").into_response()
        }
    }
}
