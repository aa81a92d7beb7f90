use axum::{
    middleware,
    routing::{delete, get, post, put},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use super::handlers;
use super::AppState;
use crate::middleware::{make_span_with_request_id, request_id_middleware};

/// Creates the main API router with all routes
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health_check))
        .nest("/api/v1", api_routes())
        .with_state(state)
        // Outermost first: the request id must exist before the trace span is built
        .layer(
            ServiceBuilder::new()
                .layer(CorsLayer::permissive())
                .layer(middleware::from_fn(request_id_middleware))
                .layer(TraceLayer::new_for_http().make_span_with(make_span_with_request_id)),
        )
}

/// API routes under /api/v1
fn api_routes() -> Router<AppState> {
    Router::new()
        // Content by category (`film` or `series`)
        .route("/content/:category/items", get(handlers::get_items))
        .route("/content/:category/popular", get(handlers::get_popular))
        .route("/content/:category/top_rated", get(handlers::get_top_rated))
        .route("/content/:category/discover", get(handlers::discover))
        .route(
            "/content/:category/recommendations",
            get(handlers::get_recommendations),
        )
        .route("/content/:category/genres", get(handlers::get_genres))
        .route("/search", get(handlers::search))
        // Per-user markers
        .route("/users/:user_id", put(handlers::register_user))
        .route(
            "/users/:user_id/:category/favorites",
            get(handlers::get_favorites).post(handlers::add_favorite),
        )
        .route(
            "/users/:user_id/:category/favorites/:content_id",
            delete(handlers::remove_favorite),
        )
        .route(
            "/users/:user_id/:category/viewed",
            get(handlers::get_viewed).post(handlers::mark_viewed),
        )
        // Administration
        .route("/admin/genres/refresh", post(handlers::refresh_genres))
}
