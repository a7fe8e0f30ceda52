//! Router configuration for the HTTP API.
//!
//! This module sets up all routes, middleware (CORS, compression, tracing),
//! and creates the axum router ready for serving.

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers;
use super::state::AppState;

/// Create the main application router with all routes and middleware.
pub fn create_router(state: AppState) -> Router {
    // CORS configuration - permissive for development, should be restricted in production
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Build the API router with versioned endpoints
    let api_v1 = Router::new()
        // Templates and drafts
        .route("/templates", get(handlers::list_templates))
        .route("/templates/active", get(handlers::get_active_template))
        .route("/templates/publish", post(handlers::publish_draft))
        .route("/drafts/validate", post(handlers::validate_draft))
        // Calendar
        .route("/calendar/generate", post(handlers::generate_calendar))
        .route(
            "/occurrences",
            get(handlers::list_occurrences).post(handlers::add_manual_occurrence),
        )
        .route("/occurrences/collisions", get(handlers::audit_collisions))
        .route(
            "/occurrences/{occurrence_id}/conduct",
            post(handlers::mark_conducted),
        )
        // Curriculum
        .route(
            "/curriculum/plans/{plan_id}/distribute",
            post(handlers::distribute_planned_dates),
        );

    // Combine all routes
    Router::new()
        .route("/health", get(handlers::health_check))
        .nest("/v1", api_v1)
        .layer(DefaultBodyLimit::max(5 * 1024 * 1024))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
