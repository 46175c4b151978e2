use axum::{
    middleware,
    routing::{delete, get, post},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use super::handlers;
use super::AppState;
use crate::middleware::{make_span_with_request_id, request_id_middleware};

/// Creates the main router with all routes
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health_check))
        .nest("/api/v1", api_routes())
        .layer(TraceLayer::new_for_http().make_span_with(make_span_with_request_id))
        .layer(middleware::from_fn(request_id_middleware))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// API routes under /api/v1
fn api_routes() -> Router<AppState> {
    Router::new()
        // Title picker
        .route("/movies", get(handlers::list_movies))
        // Session interactions
        .route("/session", get(handlers::get_session))
        .route("/session/select", post(handlers::select_title))
        .route("/session/recommendations", post(handlers::show_recommendations))
        .route("/session/selections", post(handlers::toggle_favorite))
        .route("/session/confirm", post(handlers::confirm_selections))
        // Favorites panel
        .route("/favorites", get(handlers::list_favorites))
        .route("/favorites/:title", delete(handlers::remove_favorite))
}
