use axum::{extract::State, Json};
use serde::Serialize;

use crate::http::server::AppState;

#[derive(Debug, Serialize)]
pub struct SystemStatus {
    pub version: &'static str,
    pub status: &'static str,
    pub uptime_secs: u64,
}

#[derive(Debug, Serialize)]
pub struct CacheSummary {
    pub entries: usize,
    pub pending_requests: usize,
}

#[derive(Debug, Serialize)]
pub struct EndpointStatus {
    pub position: usize,
    pub base_url: String,
}

pub async fn get_status(State(state): State<AppState>) -> Json<SystemStatus> {
    Json(SystemStatus {
        version: env!("CARGO_PKG_VERSION"),
        status: "operational",
        uptime_secs: state.started_at.elapsed().as_secs(),
    })
}

pub async fn get_cache(State(state): State<AppState>) -> Json<CacheSummary> {
    Json(CacheSummary {
        entries: state.client.cache().len(),
        pending_requests: state.client.dedup().pending_count(),
    })
}

/// Drops every cached response; in-flight fetches are unaffected.
pub async fn clear_cache(State(state): State<AppState>) -> Json<CacheSummary> {
    let cleared = state.client.cache().len();
    state.client.cache().clear();
    tracing::info!(cleared, "Cache cleared via admin API");

    Json(CacheSummary {
        entries: 0,
        pending_requests: state.client.dedup().pending_count(),
    })
}

pub async fn get_endpoints(State(state): State<AppState>) -> Json<Vec<EndpointStatus>> {
    let endpoints = state
        .client
        .endpoints()
        .iter()
        .enumerate()
        .map(|(position, endpoint)| EndpointStatus {
            position,
            base_url: endpoint.to_string(),
        })
        .collect();

    Json(endpoints)
}
