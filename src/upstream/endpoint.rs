//! Backend endpoint list.
//!
//! # Responsibilities
//! - Represent the ordered set of backend base URLs (primary first)
//! - Validate each base URL once, at construction
//! - Build attempt URLs from a relative path
//!
//! # Design Decisions
//! - Immutable after construction, shared through `Arc`
//! - Order is significant: the dispatcher always walks it front to back

use std::fmt;
use std::sync::Arc;
use thiserror::Error;
use url::Url;

/// Errors raised while building the endpoint list.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum EndpointError {
    #[error("no backend endpoints configured")]
    Empty,

    #[error("invalid endpoint URL {url:?}: {reason}")]
    InvalidUrl { url: String, reason: String },
}

/// A single backend base URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    /// Base URL without a trailing slash, so paths can be appended verbatim.
    base: String,
}

impl Endpoint {
    /// Parse and normalize a base URL. Only absolute http(s) URLs are accepted.
    pub fn parse(raw: &str) -> Result<Self, EndpointError> {
        let invalid = |reason: &str| EndpointError::InvalidUrl {
            url: raw.to_string(),
            reason: reason.to_string(),
        };

        let url = Url::parse(raw.trim()).map_err(|e| invalid(&e.to_string()))?;
        if url.scheme() != "http" && url.scheme() != "https" {
            return Err(invalid("scheme must be http or https"));
        }
        if url.host_str().is_none() {
            return Err(invalid("missing host"));
        }
        if url.query().is_some() || url.fragment().is_some() {
            return Err(invalid("base URL must not carry a query or fragment"));
        }

        Ok(Self {
            base: url.as_str().trim_end_matches('/').to_string(),
        })
    }

    /// The normalized base URL.
    pub fn as_str(&self) -> &str {
        &self.base
    }

    /// Full URL for a relative `path` (which already carries its query string).
    pub fn url_for(&self, path: &str) -> String {
        format!("{}{}", self.base, path)
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.base)
    }
}

/// Ordered, immutable list of backend endpoints.
#[derive(Debug, Clone)]
pub struct BackendEndpoints {
    endpoints: Arc<[Endpoint]>,
}

impl BackendEndpoints {
    /// Build the list from raw URLs, preserving order.
    pub fn new<I, S>(urls: I) -> Result<Self, EndpointError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let endpoints = urls
            .into_iter()
            .map(|u| Endpoint::parse(u.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;

        if endpoints.is_empty() {
            return Err(EndpointError::Empty);
        }

        Ok(Self {
            endpoints: endpoints.into(),
        })
    }

    /// Endpoints in attempt order.
    pub fn iter(&self) -> impl Iterator<Item = &Endpoint> {
        self.endpoints.iter()
    }

    pub fn len(&self) -> usize {
        self.endpoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.endpoints.is_empty()
    }

    /// The first endpoint, always attempted first.
    pub fn primary(&self) -> &Endpoint {
        &self.endpoints[0]
    }
}
