use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

/// Constraints handed to the resolver so the stream can be fetched directly.
#[derive(Debug, Clone, PartialEq)]
pub struct FormatConstraints {
    /// Upper bound on the video height, in pixels.
    pub max_height: u32,
}

impl Default for FormatConstraints {
    fn default() -> Self {
        Self { max_height: 720 }
    }
}

#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("failed to launch resolver: {0}")]
    Spawn(#[from] std::io::Error),
    #[error("resolver failed: {0}")]
    Failed(String),
    #[error("no playable stream found")]
    NoStream,
    #[error("source only offers separate audio and video streams")]
    SplitStreams,
    #[error("resolver did not answer within {0:?}")]
    TimedOut(Duration),
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MediaResolver: Send + Sync {
    /// Turn a source reference into a single directly fetchable stream URL.
    async fn resolve(
        &self,
        source: &str,
        constraints: &FormatConstraints,
    ) -> Result<String, ResolveError>;
}
