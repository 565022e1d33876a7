use crate::application::ClipService;
use crate::domain::jobs::JobStatus;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct ProgressResponse {
    pub progress: u8,
    pub status: JobStatus,
    pub message: String,
}

/// Always answers with a well-formed payload; unknown ids are a 404 with
/// the `not_found` pseudo-status.
pub async fn handle(
    State(service): State<ClipService>,
    Path(job_id): Path<String>,
) -> (StatusCode, Json<ProgressResponse>) {
    let job = service.registry().get(&job_id);
    let code = match job.status {
        JobStatus::NotFound => StatusCode::NOT_FOUND,
        _ => StatusCode::OK,
    };

    (
        code,
        Json(ProgressResponse {
            progress: job.progress,
            status: job.status,
            message: job.message,
        }),
    )
}
