//! API Routes
//!
//! Configures the Axum router with all gallery endpoints.

use axum::{routing::get, Router};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers::{
    feed_handler, health_handler, index_handler, photo_handler, sitemap_handler, stats_handler,
    AppState,
};

/// Creates the main router with all endpoints configured.
///
/// # Endpoints
/// - `GET /` - Photos of the current rotation tag
/// - `GET /p/:slug` - Photo detail with dimensions and related photos
/// - `GET /sitemap` - Whole-account listing
/// - `GET /feed` - Syndication feed
/// - `GET /stats` - Cache statistics
/// - `GET /health` - Health check endpoint
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(index_handler))
        .route("/p/:slug", get(photo_handler))
        .route("/sitemap", get(sitemap_handler))
        .route("/feed", get(feed_handler))
        .route("/stats", get(stats_handler))
        .route("/health", get(health_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
