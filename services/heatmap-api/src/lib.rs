//! Heatmap API Service Library
//!
//! HTTP service that turns CSV uploads of geotagged sensor readings into one
//! heatmap image per measurement column.

pub mod config;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod pipeline;
pub mod rasterize;
pub mod state;

use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Extension, Router,
};
use tower_http::{
    catch_panic::CatchPanicLayer, compression::CompressionLayer, cors::CorsLayer,
    services::ServeDir, trace::TraceLayer,
};

use crate::error::panic_response;
use crate::state::AppState;

/// Build the application router over `state`.
pub fn build_router(state: Arc<AppState>) -> Router {
    let artifacts = ServeDir::new(state.store.root());
    let body_limit = state.config.server.max_upload_bytes;

    Router::new()
        .route("/", get(handlers::index_handler))
        .route("/upload", post(handlers::upload_handler))
        .route("/download/*filename", get(handlers::download_handler))
        .route("/clear", post(handlers::clear_handler))
        // Health and metrics
        .route("/health", get(handlers::health_handler))
        .route("/metrics", get(handlers::metrics_handler))
        .nest_service("/static", artifacts)
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(Extension(state))
        .layer(CatchPanicLayer::custom(panic_response))
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(CorsLayer::permissive())
}
