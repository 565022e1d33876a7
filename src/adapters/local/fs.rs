use crate::ports::storage::{Artifact, ArtifactStore, StorageError, SweepReport};
use async_trait::async_trait;
use std::io;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};
use tracing::{debug, warn};

const ARTIFACT_EXTENSION: &str = "mp4";
// Keeps the real extension so ffmpeg still picks the mp4 muxer.
const STAGING_SUFFIX: &str = "partial";

/// Flat directory of finished clips, one `{job_id}.mp4` per job. Clips in
/// progress live next to them as `{job_id}.partial.mp4`.
#[derive(Debug, Clone)]
pub struct FsArtifactStore {
    root: PathBuf,
}

impl FsArtifactStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub async fn ensure_dir(&self) -> io::Result<()> {
        tokio::fs::create_dir_all(&self.root).await
    }
}

async fn remove_if_present(path: &Path) -> Result<(), StorageError> {
    match tokio::fs::remove_file(path).await {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e.into()),
    }
}

fn age_of(modified: SystemTime) -> Duration {
    // mtimes in the future count as brand new
    SystemTime::now()
        .duration_since(modified)
        .unwrap_or(Duration::ZERO)
}

#[async_trait]
impl ArtifactStore for FsArtifactStore {
    fn path_for(&self, job_id: &str) -> PathBuf {
        self.root.join(format!("{job_id}.{ARTIFACT_EXTENSION}"))
    }

    fn staging_path_for(&self, job_id: &str) -> PathBuf {
        self.root
            .join(format!("{job_id}.{STAGING_SUFFIX}.{ARTIFACT_EXTENSION}"))
    }

    async fn publish(&self, job_id: &str) -> Result<(), StorageError> {
        // Same directory, so the rename is atomic: readers see all or nothing.
        match tokio::fs::rename(self.staging_path_for(job_id), self.path_for(job_id)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Err(StorageError::NotFound),
            Err(e) => Err(e.into()),
        }
    }

    async fn exists(&self, job_id: &str) -> bool {
        tokio::fs::metadata(self.path_for(job_id))
            .await
            .map(|meta| meta.is_file())
            .unwrap_or(false)
    }

    async fn open(&self, job_id: &str) -> Result<Artifact, StorageError> {
        let file = match tokio::fs::File::open(self.path_for(job_id)).await {
            Ok(file) => file,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Err(StorageError::NotFound),
            Err(e) => return Err(e.into()),
        };
        let meta = file.metadata().await?;
        if !meta.is_file() {
            return Err(StorageError::NotFound);
        }
        Ok(Artifact {
            file,
            len: meta.len(),
        })
    }

    async fn remove(&self, job_id: &str) -> Result<(), StorageError> {
        remove_if_present(&self.staging_path_for(job_id)).await?;
        remove_if_present(&self.path_for(job_id)).await
    }

    async fn sweep(&self, max_age: Duration) -> SweepReport {
        let mut report = SweepReport::default();

        let mut entries = match tokio::fs::read_dir(&self.root).await {
            Ok(entries) => entries,
            Err(e) => {
                warn!(path = ?self.root, error = %e, "cannot scan artifact directory");
                return report;
            }
        };

        loop {
            let entry = match entries.next_entry().await {
                Ok(Some(entry)) => entry,
                Ok(None) => break,
                Err(e) => {
                    warn!(path = ?self.root, error = %e, "artifact directory scan interrupted");
                    break;
                }
            };
            let path = entry.path();

            let modified = match entry.metadata().await.and_then(|meta| meta.modified()) {
                Ok(modified) => modified,
                Err(e) => {
                    warn!(path = ?path, error = %e, "cannot read artifact age");
                    report.failed += 1;
                    continue;
                }
            };

            if age_of(modified) <= max_age {
                report.kept += 1;
                continue;
            }

            // The directory is flat; anything that is not a plain file fails here.
            match tokio::fs::remove_file(&path).await {
                Ok(()) => {
                    debug!(path = ?path, "evicted artifact");
                    report.removed += 1;
                }
                Err(e) => {
                    warn!(path = ?path, error = %e, "failed to evict artifact");
                    report.failed += 1;
                }
            }
        }

        report
    }
}
