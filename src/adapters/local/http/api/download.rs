use super::super::error::ApiError;
use crate::application::ClipService;
use crate::ports::storage::StorageError;
use axum::body::Body;
use axum::extract::{Path, State};
use axum::http::header;
use axum::response::{IntoResponse, Response};
use tokio_util::io::ReaderStream;
use uuid::Uuid;

pub async fn handle(
    State(service): State<ClipService>,
    Path(job_id): Path<String>,
) -> Result<Response, ApiError> {
    // Job ids are UUIDs; anything else cannot name an artifact (and cannot escape the store).
    let job_id = Uuid::parse_str(&job_id)
        .map_err(|_| ApiError::VideoNotFound)?
        .to_string();

    let artifact = match service.store().open(&job_id).await {
        Ok(artifact) => artifact,
        Err(StorageError::NotFound) => return Err(ApiError::VideoNotFound),
        Err(e) => return Err(ApiError::Internal(e.to_string())),
    };

    let disposition = format!("attachment; filename=\"clip_{job_id}.mp4\"");
    let body = Body::from_stream(ReaderStream::new(artifact.file));

    Ok((
        [
            (header::CONTENT_TYPE, "video/mp4".to_string()),
            (header::CONTENT_LENGTH, artifact.len.to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        body,
    )
        .into_response())
}
