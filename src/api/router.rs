//! Router setup and configuration.

use axum::{
    Router, middleware,
    routing::{get, post},
};
use tower_http::trace::TraceLayer;

use crate::api::handlers::{admin, health, sequence};
use crate::api::middleware::auth::require_admin;
use crate::api::state::AppState;

/// Create the main application router.
pub fn create_router(state: AppState) -> Router {
    // Health and metrics routes (no auth required)
    let health_routes = Router::new()
        .route("/health", get(health::health))
        .route("/ready", get(health::ready))
        .route("/metrics", get(health::metrics));

    // Sequence routes (document-creation workflows)
    let sequence_routes = Router::new()
        .route("/next", get(sequence::next_identifier))
        .route("/reserve", post(sequence::reserve))
        .route("/release", post(sequence::release))
        .route("/preview", get(sequence::preview));

    // Administrative routes (admin auth required)
    let admin_routes = Router::new()
        .route("/config", get(admin::get_config).post(admin::update_config))
        .route("/config/list", get(admin::list_configs))
        .route("/config/bulk-format", post(admin::bulk_update_format))
        .route("/reset", post(admin::reset_system))
        .route("/statistics", get(admin::statistics))
        .layer(middleware::from_fn_with_state(state.clone(), require_admin));

    // Combine all routes
    Router::new()
        .merge(health_routes)
        .nest("/v1/sequence", sequence_routes)
        .nest("/v1/admin", admin_routes)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
