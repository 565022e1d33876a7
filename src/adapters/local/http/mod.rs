//! HTTP inbound adapter.
//!
//! Exposes the clip API:
//! - `GET  /api/health`
//! - `POST /api/clip`
//! - `GET  /api/progress/:job_id`
//! - `GET  /api/download/:job_id`

pub mod api;
mod error;

pub use error::ApiError;

use crate::application::ClipService;
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub fn router(service: ClipService) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/health", get(api::health::handle))
        .route("/api/clip", post(api::clip::handle))
        .route("/api/progress/:job_id", get(api::progress::handle))
        .route("/api/download/:job_id", get(api::download::handle))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(service)
}
