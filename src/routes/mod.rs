//! Router assembly: HTTP endpoints, CORS, and HTTP tracing.

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

use crate::state::AppState;

pub mod http;

/// Build the application router with:
/// - JSON API under `/api/v1/...`
/// - CORS (allow any origin/method/headers) for local editor integrations
/// - HTTP trace layer (per-request spans w/ method, path, status, latency)
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/v1/health", get(http::http_health))
        .route("/api/v1/init", post(http::http_post_init))
        .route("/api/v1/progress", get(http::http_get_progress))
        .route("/api/v1/markers", get(http::http_get_markers))
        .route("/api/v1/todos/scan", post(http::http_post_scan))
        .route("/api/v1/submit", post(http::http_post_submit))
        .route("/api/v1/hint", post(http::http_post_hint))
        .route("/api/v1/solution", post(http::http_post_solution))
        .route("/api/v1/level", post(http::http_post_level))
        .route("/api/v1/advance", post(http::http_post_advance))
        .route("/api/v1/reset", post(http::http_post_reset))
        .with_state(state)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
}
