//! Response caching subsystem.
//!
//! # Data Flow
//! ```text
//! ApiRequest
//!     → key.rs (canonical cache key + in-flight signature)
//!     → store.rs (TTL / stale-while-revalidate lookup)
//!         → on miss or revalidation: dedup.rs (collapse identical fetches)
//!             → upstream dispatcher
//! ```
//!
//! # Design Decisions
//! - Maps are owned by the client instance, never process globals
//! - Process memory only; nothing survives a restart
//! - Stale data is always flagged via `CacheStatus`

pub mod dedup;
pub mod key;
pub mod store;

pub use dedup::Deduplicator;
pub use key::ApiRequest;
pub use store::{CachePolicy, CacheStatus, Cached, ResponseCache};
