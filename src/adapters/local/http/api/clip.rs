use super::super::error::ApiError;
use crate::application::ClipService;
use crate::domain::jobs::ClipRequest;
use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::info;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClipBody {
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub start_time: Option<f64>,
    #[serde(default)]
    pub end_time: Option<f64>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClipAccepted {
    pub success: bool,
    pub job_id: String,
}

impl From<ClipBody> for ClipRequest {
    fn from(body: ClipBody) -> Self {
        ClipRequest {
            source: body.url.unwrap_or_default(),
            start_seconds: body.start_time.unwrap_or(0.0),
            end_seconds: body.end_time,
        }
    }
}

pub async fn handle(
    State(service): State<ClipService>,
    body: Result<Json<ClipBody>, JsonRejection>,
) -> Result<(StatusCode, Json<ClipAccepted>), ApiError> {
    let Json(body) = body.map_err(|rejection| ApiError::BadRequest(rejection.body_text()))?;
    info!(
        url = ?body.url,
        start = ?body.start_time,
        end = ?body.end_time,
        "received clip request"
    );

    let submitted = service.submit(body.into()).await?;

    Ok((
        StatusCode::ACCEPTED,
        Json(ClipAccepted {
            success: true,
            job_id: submitted.job_id,
        }),
    ))
}
