//! # Server Module
//!
//! Router, handlers and middleware for the relay's HTTP surface.

pub mod cors;
pub mod handlers;
pub mod logging;
pub mod state;

pub use handlers::{chat, generate_image, health_check, validate_key};
pub use state::AppState;

use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::trace::{self, TraceLayer};
use tracing::Level;

/// Create router with all routes and middleware
pub fn create_router(state: AppState) -> Router {
    let cors = cors::cors_layer(&state.config.cors_origins);

    Router::new()
        .route("/api/chat", post(chat))
        .route("/api/validate-key", post(validate_key))
        .route("/api/generate-image", post(generate_image))
        .route("/health", get(health_check))
        .layer(
            ServiceBuilder::new()
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(trace::DefaultMakeSpan::new().level(Level::INFO))
                        .on_response(trace::DefaultOnResponse::new().level(Level::INFO)),
                )
                .layer(cors)
                .layer(middleware::from_fn(logging::log_api_requests)),
        )
        .with_state(state)
}
