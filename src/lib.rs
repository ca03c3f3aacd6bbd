//! WinScan gateway: a resilient fetch client for the explorer backend API.

pub mod admin;
pub mod cache;
pub mod client;
pub mod config;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod upstream;

pub use client::ResilientClient;
pub use config::GatewayConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
