//! Router configuration for the read API.

use axum::{routing::get, Router};
use tower_http::cors::CorsLayer;

use super::handlers;
use super::AppState;

/// Create the main router with all routes.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::root))
        .route("/health", get(handlers::health))
        .route("/api/sites", get(handlers::api_sites))
        // Rankings, narrowing by site then type
        .route("/api/rankings", get(handlers::api_overview))
        .route("/api/rankings/:site_code", get(handlers::api_site_rankings))
        .route(
            "/api/rankings/:site_code/:type_code",
            get(handlers::api_type_rankings),
        )
        .layer(CorsLayer::permissive())
        .with_state(state)
}
