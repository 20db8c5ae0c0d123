//! Route table and middleware stack.

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::{Json, Router};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::api_doc::ApiDoc;
use crate::handlers;
use crate::state::AppState;
use utoipa::OpenApi;

pub fn build_router(state: AppState) -> Router {
    // Multipart framing adds overhead on top of the file itself.
    let body_limit = state.config.max_avatar_size_bytes + 64 * 1024;

    Router::new()
        .route("/health", get(handlers::health))
        .route("/api/v0/players", post(handlers::players::create_player))
        .route("/api/v0/players/{id}", get(handlers::players::get_player))
        .route(
            "/api/v0/players/{id}/avatar",
            post(handlers::avatar::upload_avatar),
        )
        .route("/media/{*key}", get(handlers::media::serve_media))
        .route(
            "/api-doc/openapi.json",
            get(|| async { Json(ApiDoc::openapi()) }),
        )
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
