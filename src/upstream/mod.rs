//! Upstream access subsystem.
//!
//! # Data Flow
//! ```text
//! Relative path + RequestOptions
//!     → dispatcher.rs (fixed-order failover, per-attempt timeout)
//!     → transport.rs (one GET against endpoint + path)
//!     → endpoint.rs (ordered base URLs: primary, secondary, ...)
//!     → Parsed JSON payload or FetchError
//! ```
//!
//! # Design Decisions
//! - Payloads are opaque JSON; shape validation belongs to callers
//! - Endpoint list is immutable process configuration
//! - Transport is a trait so failover can be tested without sockets

pub mod dispatcher;
pub mod endpoint;
pub mod error;
pub mod transport;

use std::sync::Arc;

/// Opaque JSON body, shared between cache, dedup waiters and handlers.
pub type Payload = Arc<serde_json::Value>;

pub use dispatcher::{FailoverDispatcher, RequestOptions, DEFAULT_ATTEMPT_TIMEOUT};
pub use endpoint::{BackendEndpoints, Endpoint, EndpointError};
pub use error::{FetchError, FetchResult};
pub use transport::{HttpTransport, RawResponse, Transport, TransportError};
