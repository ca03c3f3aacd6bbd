//! Single-attempt HTTP transport.
//!
//! The dispatcher talks to backends only through [`Transport`], so the
//! failover logic can be driven by a scripted transport in tests.

use std::collections::BTreeMap;
use std::fmt;

use futures_util::future::BoxFuture;
use futures_util::FutureExt;
use thiserror::Error;

/// Status and raw body of one backend answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl RawResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Network-level failure of a single attempt.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{0}")]
pub struct TransportError(pub String);

/// Issues one GET against a fully-built URL.
pub trait Transport: Send + Sync + fmt::Debug {
    fn get<'a>(
        &'a self,
        url: &'a str,
        headers: &'a BTreeMap<String, String>,
    ) -> BoxFuture<'a, Result<RawResponse, TransportError>>;
}

/// reqwest-backed transport used in production.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    pub fn new(user_agent: &str) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().user_agent(user_agent).build()?;
        Ok(Self { client })
    }

    /// Wrap an already configured client.
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

impl Transport for HttpTransport {
    fn get<'a>(
        &'a self,
        url: &'a str,
        headers: &'a BTreeMap<String, String>,
    ) -> BoxFuture<'a, Result<RawResponse, TransportError>> {
        async move {
            let mut request = self.client.get(url);
            for (name, value) in headers {
                request = request.header(name.as_str(), value.as_str());
            }

            let response = request
                .send()
                .await
                .map_err(|e| TransportError(describe(&e)))?;
            let status = response.status().as_u16();
            let body = response
                .bytes()
                .await
                .map_err(|e| TransportError(describe(&e)))?;

            Ok(RawResponse {
                status,
                body: body.to_vec(),
            })
        }
        .boxed()
    }
}

fn describe(err: &reqwest::Error) -> String {
    if err.is_connect() {
        format!("connection failed: {}", err)
    } else if err.is_timeout() {
        format!("timed out: {}", err)
    } else {
        err.to_string()
    }
}
