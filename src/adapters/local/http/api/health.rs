use crate::application::ClipService;
use axum::extract::State;
use axum::Json;
use serde::Serialize;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: &'static str,
    pub message: &'static str,
    pub ffmpeg_available: bool,
}

pub async fn handle(State(service): State<ClipService>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        message: "Clip API is running",
        ffmpeg_available: service.tool_available().await,
    })
}
