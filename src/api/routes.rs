use axum::{
    routing::{delete, get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use super::handlers;
use super::AppState;

/// Creates the main API router with all routes
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health_check))
        // Sessions
        .route("/sessions", post(handlers::create_session))
        .route("/sessions/:session_id", delete(handlers::delete_session))
        // Tracking
        .route("/sessions/:session_id/shown", post(handlers::track_shown))
        .route("/sessions/:session_id/recommendations", post(handlers::recommend))
        .route("/sessions/:session_id/track", post(handlers::track))
        .route("/sessions/:session_id/interactions", get(handlers::get_interactions))
        .route("/sessions/:session_id/flush", post(handlers::flush))
        .route("/sessions/:session_id/clear", post(handlers::clear))
        // Per-user view
        .route(
            "/sessions/:session_id/users/:user_id/items",
            get(handlers::current_items),
        )
        .route(
            "/sessions/:session_id/users/:user_id/items/:item_id/visible",
            get(handlers::item_visibility),
        )
        // Offline synthesis
        .route("/synthesize", post(handlers::synthesize))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}
