//! Router configuration for the HTTP front door.

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::cors::CorsLayer;

use super::handlers;
use super::AppState;

/// Create the router with all routes.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/api/health", get(handlers::health))
        .route("/api/sources", get(handlers::api_sources))
        // Harvests
        .route("/api/parse", post(handlers::parse_all))
        .route("/api/parse/:source", post(handlers::parse_source))
        .layer(CorsLayer::permissive())
        .with_state(state)
}
