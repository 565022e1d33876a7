use async_trait::async_trait;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("artifact not found")]
    NotFound,
    #[error("storage i/o error: {0}")]
    Io(#[from] std::io::Error),
}

/// An opened artifact, ready to be streamed.
#[derive(Debug)]
pub struct Artifact {
    pub file: tokio::fs::File,
    pub len: u64,
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SweepReport {
    pub removed: usize,
    pub failed: usize,
    pub kept: usize,
}

#[async_trait]
pub trait ArtifactStore: Send + Sync {
    /// Deterministic location of the artifact for `job_id`.
    fn path_for(&self, job_id: &str) -> PathBuf;

    /// Where the artifact is written while it is being produced. Never served.
    fn staging_path_for(&self, job_id: &str) -> PathBuf;

    /// Move a finished staging file to `path_for`. Fails with `NotFound`
    /// when nothing was staged.
    async fn publish(&self, job_id: &str) -> Result<(), StorageError>;

    async fn exists(&self, job_id: &str) -> bool;

    async fn open(&self, job_id: &str) -> Result<Artifact, StorageError>;

    /// Delete the artifact and any staging file. Missing files are not an error.
    async fn remove(&self, job_id: &str) -> Result<(), StorageError>;

    /// Delete every entry older than `max_age`. Individual failures are
    /// counted and logged, never propagated.
    async fn sweep(&self, max_age: Duration) -> SweepReport;
}
