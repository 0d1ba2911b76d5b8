//! # hof-api
//!
//! The web routing and orchestration layer for the Hall of Fame/Shame.

pub mod error;
pub mod handlers;
pub mod live_files;
pub mod middleware;
pub mod session;

use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;

pub use handlers::AppState;

/// Builds the full router.
///
/// # Developer Note
/// Object URLs handed out by `/files/{uri}` point at `/blob/{id}`, so both
/// routes must stay mounted at the root.
pub fn configure_routes(state: Arc<AppState>) -> Router {
    let body_limit = state.max_upload_bytes;
    Router::new()
        // The gallery (e.g., /?tag=fame)
        .route("/", get(handlers::gallery))
        // Create and edit
        .route("/submit", get(handlers::submit_form).post(handlers::create_submission))
        .route("/submit/{uri}", get(handlers::edit_form).post(handlers::update_submission))
        // A single submission and its likes
        .route("/submission/{uri}", get(handlers::view_submission))
        .route("/submission/{uri}/like", post(handlers::like_submission))
        // Uploaded files
        .route("/files/{uri}", get(handlers::file_redirect))
        .route("/blob/{id}", get(handlers::blob))
        .route("/settings", get(handlers::settings).post(handlers::save_settings))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(middleware::cors_policy())
        .layer(middleware::standard_middleware())
        .with_state(state)
}
