//! Admin API: status, cache inspection and endpoint listing.
//!
//! Mounted on the main router only when `admin.enabled`; every route sits
//! behind bearer-token authentication.

pub mod auth;
pub mod handlers;

use axum::{middleware, routing::get, Router};

use self::auth::admin_auth_middleware;
use self::handlers::*;
use crate::http::server::AppState;

pub const STATUS_PATH: &str = "/admin/status";
pub const CACHE_PATH: &str = "/admin/cache";
pub const ENDPOINTS_PATH: &str = "/admin/endpoints";

/// Paths mounted by `setup_admin_router`.
pub const ADMIN_PATHS: [&str; 3] = [STATUS_PATH, CACHE_PATH, ENDPOINTS_PATH];

pub fn setup_admin_router(state: AppState) -> Router<AppState> {
    Router::new()
        .route(STATUS_PATH, get(get_status))
        .route(CACHE_PATH, get(get_cache).delete(clear_cache))
        .route(ENDPOINTS_PATH, get(get_endpoints))
        .layer(middleware::from_fn_with_state(state, admin_auth_middleware))
}
