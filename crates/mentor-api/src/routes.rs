//! Router setup with all API routes and middleware.
//!
//! Configures the axum Router with CORS, tracing, compression, the
//! rate limiter, the static audio mount, and all endpoint handlers.

use axum::extract::DefaultBodyLimit;
use axum::routing::{delete, get, post};
use axum::Router;
use tower_http::compression::CompressionLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use mentor_core::config::expand_home;

use crate::handlers;
use crate::rate_limit::{self, RateLimiter};
use crate::state::AppState;

/// Create the axum Router with all routes and middleware.
pub fn create_router(state: AppState) -> Router {
    // The backend serves browser clients on arbitrary hosts; audio URLs
    // are fetched cross-origin.
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let limiter = RateLimiter::new(state.config.server.rate_limit_per_sec);
    let audio_dir = expand_home(&state.config.server.audio_dir);

    let rate_limited_routes = Router::new()
        .route("/ask", post(handlers::ask))
        .route("/whisper", post(handlers::whisper))
        .route("/suggestions", get(handlers::suggestions))
        .route("/sessions", get(handlers::list_sessions))
        .route("/sessions/{id}/history", get(handlers::session_history))
        .route("/sessions/{id}", delete(handlers::delete_session))
        .layer(axum::middleware::from_fn(
            rate_limit::rate_limit_middleware,
        ))
        .layer(axum::Extension(limiter));

    Router::new()
        .route("/health", get(handlers::health))
        .merge(rate_limited_routes)
        .nest_service("/static/audio", ServeDir::new(audio_dir))
        .layer(DefaultBodyLimit::max(state.config.server.max_upload_bytes))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
