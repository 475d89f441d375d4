//! Defines routes for the gallery API.
//!
//! ## Structure
//! - `GET    /api/uploads`            — list uploads, newest first
//! - `POST   /api/uploads`            — multipart upload
//! - `DELETE /api/uploads/{id}`       — delete an upload and its file
//! - `GET    /uploads/{*filename}`    — raw file from the media directory
//! - `GET    /healthz`, `GET /readyz` — liveness and readiness
//!
//! The wildcard `*filename` allows nested names like `2025/1700000000_a.jpg`.

use crate::{
    handlers::{
        health_handlers::{healthz, readyz},
        upload_handlers::{create_upload, delete_upload, list_uploads, serve_file},
    },
    state::AppState,
};
use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{delete, get},
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

/// Build the router with its state and middleware applied.
pub fn app(state: AppState) -> Router {
    let body_limit = state.config.max_upload_bytes;
    routes()
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// All gallery routes, still expecting `AppState`.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        .route("/api/uploads", get(list_uploads).post(create_upload))
        .route("/api/uploads/{id}", delete(delete_upload))
        .route("/uploads/{*filename}", get(serve_file))
}
