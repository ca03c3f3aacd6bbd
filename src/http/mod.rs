//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware, per-route handler)
//!     → request.rs (request ID, query validation, canonical ApiRequest)
//!     → ResilientClient (cache → dedup → failover)
//!     → response.rs (x-cache / cache-control headers, error mapping)
//!     → Send to client
//! ```

pub mod request;
pub mod response;
pub mod server;

pub use request::{MakeRequestUuidV4, X_REQUEST_ID};
pub use response::{ApiError, X_CACHE};
pub use server::{AppState, HttpServer};
