use std::time::{Duration, Instant};
use thiserror::Error;

/// Lifecycle of a clip job as seen by pollers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Queued,
    Resolving,
    Transcoding,
    Completed,
    Failed,
    /// Pseudo-status returned for ids the registry does not know.
    NotFound,
}

impl JobStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }
}

/// A tracked clip job. Status, progress and message are always replaced together.
#[derive(Debug, Clone)]
pub struct Job {
    pub id: String,
    pub status: JobStatus,
    pub progress: u8,
    pub message: String,
    pub updated_at: Instant,
}

impl Job {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            status: JobStatus::Queued,
            progress: 0,
            message: "Queued".to_string(),
            updated_at: Instant::now(),
        }
    }

    /// Snapshot handed out for ids that were never registered (or were evicted).
    pub fn not_found(id: impl Into<String>) -> Self {
        Self {
            status: JobStatus::NotFound,
            message: "Job not found".to_string(),
            ..Self::new(id)
        }
    }

    /// Apply a status transition.
    ///
    /// Terminal jobs are frozen. `Completed` always carries 100 and `Failed`
    /// always carries 0; any other transition never lowers progress.
    /// Returns false when the update was ignored.
    pub fn apply(&mut self, status: JobStatus, progress: u8, message: impl Into<String>) -> bool {
        if self.status.is_terminal() || status == JobStatus::NotFound {
            return false;
        }

        self.progress = match status {
            JobStatus::Completed => 100,
            JobStatus::Failed => 0,
            _ => progress.min(100).max(self.progress),
        };
        self.status = status;
        self.message = message.into();
        self.updated_at = Instant::now();
        true
    }

    pub fn idle_for(&self) -> Duration {
        self.updated_at.elapsed()
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum SubmitError {
    #[error("URL is required")]
    MissingUrl,
    #[error("Invalid time range")]
    InvalidRange,
    #[error("FFmpeg is not installed on the server")]
    ToolUnavailable,
}

/// An incoming clip request, before validation.
#[derive(Debug, Clone, PartialEq)]
pub struct ClipRequest {
    pub source: String,
    pub start_seconds: f64,
    pub end_seconds: Option<f64>,
}

/// A validated request: what the pipeline actually runs.
#[derive(Debug, Clone, PartialEq)]
pub struct ClipPlan {
    pub source: String,
    pub start_seconds: f64,
    pub duration_seconds: f64,
}

impl ClipRequest {
    pub fn validate(&self) -> Result<ClipPlan, SubmitError> {
        let source = self.source.trim();
        if source.is_empty() {
            return Err(SubmitError::MissingUrl);
        }

        let end = self.end_seconds.ok_or(SubmitError::InvalidRange)?;
        let start = self.start_seconds;
        if !start.is_finite() || !end.is_finite() || start < 0.0 || end <= start {
            return Err(SubmitError::InvalidRange);
        }

        Ok(ClipPlan {
            source: source.to_string(),
            start_seconds: start,
            duration_seconds: end - start,
        })
    }
}
