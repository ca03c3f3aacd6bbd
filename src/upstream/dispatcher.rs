//! Failover dispatcher.
//!
//! # Responsibilities
//! - Walk the endpoint list in fixed order for every request
//! - Bound each attempt with a timeout
//! - Classify failures and aggregate them when every endpoint fails
//!
//! # Design Decisions
//! - Stateless: each call starts from the primary, no sticky endpoint and no
//!   health scoring (two endpoints make the extra latency acceptable)
//! - A timed-out attempt fails over, it does not abort the whole dispatch

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::time::timeout;

use crate::observability::metrics;
use crate::upstream::endpoint::{BackendEndpoints, Endpoint};
use crate::upstream::error::{FetchError, FetchResult};
use crate::upstream::transport::Transport;
use crate::upstream::Payload;

/// Default upper bound for a single endpoint attempt.
pub const DEFAULT_ATTEMPT_TIMEOUT: Duration = Duration::from_secs(8);

/// Per-request options forwarded to every attempt.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct RequestOptions {
    /// Header names are stored lower-cased so equal requests compare equal.
    headers: BTreeMap<String, String>,
    /// Overrides the dispatcher's attempt timeout.
    timeout: Option<Duration>,
}

impl RequestOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_header(mut self, name: impl AsRef<str>, value: impl Into<String>) -> Self {
        self.headers
            .insert(name.as_ref().to_ascii_lowercase(), value.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn headers(&self) -> &BTreeMap<String, String> {
        &self.headers
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }
}

/// Tries each backend endpoint in order until one answers with 2xx JSON.
#[derive(Debug, Clone)]
pub struct FailoverDispatcher {
    endpoints: BackendEndpoints,
    transport: Arc<dyn Transport>,
    attempt_timeout: Duration,
}

impl FailoverDispatcher {
    pub fn new(endpoints: BackendEndpoints, transport: Arc<dyn Transport>) -> Self {
        Self {
            endpoints,
            transport,
            attempt_timeout: DEFAULT_ATTEMPT_TIMEOUT,
        }
    }

    pub fn with_attempt_timeout(mut self, attempt_timeout: Duration) -> Self {
        self.attempt_timeout = attempt_timeout;
        self
    }

    pub fn endpoints(&self) -> &BackendEndpoints {
        &self.endpoints
    }

    /// Fetch `path` (relative, query included) from the first healthy endpoint.
    pub async fn fetch_with_failover(
        &self,
        path: &str,
        options: &RequestOptions,
    ) -> FetchResult<Payload> {
        validate_path(path)?;

        let attempt_timeout = options.timeout.unwrap_or(self.attempt_timeout);
        let mut failures = Vec::with_capacity(self.endpoints.len());

        for (idx, endpoint) in self.endpoints.iter().enumerate() {
            match self.attempt(endpoint, path, options, attempt_timeout).await {
                Ok(payload) => {
                    metrics::record_upstream_attempt(endpoint.as_str(), "ok");
                    if idx > 0 {
                        tracing::info!(
                            endpoint = %endpoint,
                            endpoint_idx = idx,
                            path = %path,
                            "Served by failover endpoint"
                        );
                    }
                    return Ok(payload);
                }
                Err(e) => {
                    metrics::record_upstream_attempt(endpoint.as_str(), e.kind());
                    tracing::warn!(
                        endpoint = %endpoint,
                        endpoint_idx = idx,
                        path = %path,
                        error = %e,
                        "Upstream attempt failed, trying next endpoint"
                    );
                    failures.push(e);
                }
            }
        }

        // Every endpoint is up but serving junk: surface the body error itself.
        if failures
            .iter()
            .all(|f| matches!(f, FetchError::InvalidResponseBody { .. }))
        {
            if let Some(last) = failures.pop() {
                return Err(last);
            }
        }

        tracing::error!(path = %path, attempts = failures.len(), "All upstream endpoints failed");
        Err(FetchError::AllEndpointsFailed { failures })
    }

    async fn attempt(
        &self,
        endpoint: &Endpoint,
        path: &str,
        options: &RequestOptions,
        attempt_timeout: Duration,
    ) -> FetchResult<Payload> {
        let url = endpoint.url_for(path);
        let response = match timeout(attempt_timeout, self.transport.get(&url, &options.headers)).await {
            Ok(Ok(response)) => response,
            Ok(Err(e)) => {
                return Err(FetchError::EndpointUnreachable {
                    endpoint: endpoint.to_string(),
                    reason: e.to_string(),
                })
            }
            Err(_) => {
                return Err(FetchError::EndpointUnreachable {
                    endpoint: endpoint.to_string(),
                    reason: format!("timed out after {}ms", attempt_timeout.as_millis()),
                })
            }
        };

        if !response.is_success() {
            return Err(FetchError::EndpointHttpError {
                endpoint: endpoint.to_string(),
                status: response.status,
            });
        }

        serde_json::from_slice::<serde_json::Value>(&response.body)
            .map(Arc::new)
            .map_err(|e| FetchError::InvalidResponseBody {
                endpoint: endpoint.to_string(),
                reason: e.to_string(),
            })
    }
}

/// Paths must be relative to the endpoint: `/api/...`, never `scheme://host/...`.
fn validate_path(path: &str) -> FetchResult<()> {
    if !path.starts_with('/') || path.starts_with("//") || path.contains("://") {
        return Err(FetchError::InvalidPath(path.to_string()));
    }
    Ok(())
}
