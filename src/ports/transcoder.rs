use async_trait::async_trait;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::mpsc::UnboundedSender;

/// Seek-and-encode parameters for one clip.
#[derive(Debug, Clone, PartialEq)]
pub struct TranscodeSpec {
    pub input: String,
    pub output: PathBuf,
    pub start_seconds: f64,
    pub duration_seconds: f64,
}

/// Result of a transcoder run that got as far as exiting.
#[derive(Debug, Clone, PartialEq)]
pub struct TranscodeOutcome {
    /// `None` when the process was terminated by a signal.
    pub exit_code: Option<i32>,
    /// Tail of the diagnostic stream.
    pub diagnostics: String,
}

impl TranscodeOutcome {
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }
}

#[derive(Debug, Error)]
pub enum TranscodeError {
    #[error("failed to launch transcoder: {0}")]
    Spawn(std::io::Error),
    #[error("transcoder i/o error: {0}")]
    Io(#[from] std::io::Error),
    #[error("transcoder timed out after {}s", .0.as_secs())]
    TimedOut(Duration),
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Transcoder: Send + Sync {
    /// Cheap capability check; must not have side effects.
    async fn probe(&self) -> bool;

    /// Run one transcode. Elapsed output seconds are sent on `progress` as
    /// they are parsed; the sender is dropped when the run is over.
    async fn transcode(
        &self,
        spec: &TranscodeSpec,
        progress: UnboundedSender<f64>,
    ) -> Result<TranscodeOutcome, TranscodeError>;
}
