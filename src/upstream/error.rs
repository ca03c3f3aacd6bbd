//! Upstream fetch error taxonomy.

use thiserror::Error;

/// Errors produced while fetching from the backend endpoints.
///
/// `Clone` so a single outcome can be handed to every caller waiting on the
/// same deduplicated request.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FetchError {
    /// Network failure or per-attempt timeout.
    #[error("endpoint {endpoint} unreachable: {reason}")]
    EndpointUnreachable { endpoint: String, reason: String },

    /// Endpoint answered with a non-2xx status.
    #[error("endpoint {endpoint} returned HTTP {status}")]
    EndpointHttpError { endpoint: String, status: u16 },

    /// Every configured endpoint failed. Failures are kept in attempt order.
    #[error("all {} endpoints failed, last error: {}", .failures.len(), describe_last(.failures))]
    AllEndpointsFailed { failures: Vec<FetchError> },

    /// Endpoint answered 2xx but the body was not valid JSON.
    #[error("endpoint {endpoint} returned an unparseable body: {reason}")]
    InvalidResponseBody { endpoint: String, reason: String },

    /// Request path carried a scheme or host.
    #[error("invalid request path {0:?}: must be relative to the endpoint")]
    InvalidPath(String),

    /// The task driving the fetch was aborted or panicked.
    #[error("fetch interrupted: {0}")]
    Interrupted(String),
}

impl FetchError {
    /// The last per-endpoint failure, for aggregate errors.
    pub fn last_error(&self) -> Option<&FetchError> {
        match self {
            FetchError::AllEndpointsFailed { failures } => failures.last(),
            _ => None,
        }
    }

    /// Short label used for metrics and error bodies.
    pub fn kind(&self) -> &'static str {
        match self {
            FetchError::EndpointUnreachable { .. } => "endpoint_unreachable",
            FetchError::EndpointHttpError { .. } => "endpoint_http_error",
            FetchError::AllEndpointsFailed { .. } => "all_endpoints_failed",
            FetchError::InvalidResponseBody { .. } => "invalid_response_body",
            FetchError::InvalidPath(_) => "invalid_path",
            FetchError::Interrupted(_) => "interrupted",
        }
    }
}

fn describe_last(failures: &[FetchError]) -> String {
    failures
        .last()
        .map(ToString::to_string)
        .unwrap_or_else(|| "no endpoints configured".to_string())
}

/// Result type for upstream fetches.
pub type FetchResult<T> = Result<T, FetchError>;
