//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → logging.rs (structured log events via `tracing`)
//!     → metrics.rs (counters and histograms via `metrics`)
//!
//! Consumers:
//!     → stdout (fmt subscriber installed by the binary)
//!     → Prometheus scrape endpoint
//! ```
//!
//! # Design Decisions
//! - Library code only emits; subscribers and exporters are installed by `main`
//! - Metric updates are no-ops until a recorder is installed (tests stay quiet)
//! - Request ID flows through handler spans

pub mod logging;
pub mod metrics;
