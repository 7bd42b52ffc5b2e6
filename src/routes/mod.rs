//! Route modules for the extractor service

pub mod archive;
pub mod extract;
pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// Endpoints, mounted both at the root and under `/api`
fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(health::health_check))
        .route("/extract", post(extract::extract_images))
        .route("/download-zip", post(archive::download_zip))
}

/// Build the application router
pub fn router(state: AppState) -> Router {
    let body_limit = state.config().extract.max_upload_bytes;

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .merge(api_routes())
        .nest("/api", api_routes())
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
