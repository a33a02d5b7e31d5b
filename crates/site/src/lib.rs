//! Gastro-Serra site library.
//!
//! Public restaurant listing, email/password login and the owner admin
//! screen, served as one axum router over a hosted auth + table backend.
//! The router is built here so integration tests can run it in-process.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod backend;
pub mod config;
pub mod error;
pub mod filters;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;

use axum::{Router, middleware::from_fn, routing::get};
use tower_http::{services::ServeDir, trace::TraceLayer};

use error::AppError;
use state::AppState;

/// Directory holding CSS and images, served under `/static`.
pub const STATIC_DIR: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/static");

/// Build the complete application router.
///
/// Layers, innermost first: session, request tracing, request id,
/// security headers. The request id sits outside tracing so the span can
/// carry it.
pub fn router(state: AppState) -> Router {
    let session_layer = middleware::create_session_layer(state.config());

    Router::new()
        .route("/health", get(health))
        .merge(routes::routes())
        .nest_service("/static", ServeDir::new(STATIC_DIR))
        .fallback(not_found)
        .layer(session_layer)
        .layer(TraceLayer::new_for_http().make_span_with(middleware::request_id::request_span))
        .layer(from_fn(middleware::request_id_middleware))
        .layer(from_fn(middleware::security_headers_middleware))
        .with_state(state)
}

/// The router wrapped in the Sentry layers, outermost for full request
/// coverage. Without an initialized client the layers pass requests through.
pub fn app(state: AppState) -> Router {
    router(state)
        .layer(sentry_tower::NewSentryLayer::new_from_top())
        .layer(sentry_tower::SentryHttpLayer::new().enable_transaction())
}

/// Liveness health check endpoint.
///
/// Returns "ok" if the server is running. Does not check the backend.
async fn health() -> &'static str {
    "ok"
}

async fn not_found(uri: axum::http::Uri) -> AppError {
    AppError::NotFound(uri.path().to_string())
}
