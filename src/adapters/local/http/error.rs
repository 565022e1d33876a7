use crate::domain::jobs::SubmitError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

/// Errors surfaced by the clip API, rendered in the shape clients expect.
#[derive(Debug)]
pub enum ApiError {
    Submit(SubmitError),
    BadRequest(String),
    VideoNotFound,
    Internal(String),
}

impl From<SubmitError> for ApiError {
    fn from(err: SubmitError) -> Self {
        ApiError::Submit(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::Submit(err) => {
                let status = match err {
                    SubmitError::MissingUrl | SubmitError::InvalidRange => StatusCode::BAD_REQUEST,
                    SubmitError::ToolUnavailable => StatusCode::INTERNAL_SERVER_ERROR,
                };
                let body = json!({ "success": false, "error": err.to_string() });
                (status, Json(body)).into_response()
            }
            ApiError::BadRequest(message) => (
                StatusCode::BAD_REQUEST,
                Json(json!({ "success": false, "error": message })),
            )
                .into_response(),
            ApiError::VideoNotFound => (
                StatusCode::NOT_FOUND,
                Json(json!({ "error": "Video not found" })),
            )
                .into_response(),
            ApiError::Internal(message) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": message })),
            )
                .into_response(),
        }
    }
}
