//! Router configuration for the HTTP wrapper.

use axum::{routing::get, Router};
use tower_http::cors::CorsLayer;

use super::handlers;
use super::AppState;

/// Create the router with all routes.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route("/api/sources", get(handlers::api_sources))
        .route("/api/scrape", get(handlers::api_scrape))
        .layer(CorsLayer::permissive())
        .with_state(state)
}
