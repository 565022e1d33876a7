use super::probe::ToolProbe;
use crate::domain::jobs::{ClipPlan, ClipRequest, JobStatus, SubmitError};
use crate::domain::progress::{
    excerpt, transcode_percent, EXCERPT_LIMIT, RESOLVING_PROGRESS, TRANSCODE_FLOOR,
};
use crate::domain::registry::JobRegistry;
use crate::ports::resolver::{FormatConstraints, MediaResolver, ResolveError};
use crate::ports::storage::{ArtifactStore, StorageError};
use crate::ports::transcoder::{TranscodeError, TranscodeSpec, Transcoder};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};
use uuid::Uuid;

const MSG_RESOLVING: &str = "Extracting video URL...";
const MSG_TRANSCODING: &str = "Processing video...";
const MSG_COMPLETED: &str = "Clip ready!";

/// Failure inside a running job. Its text becomes the job's message.
#[derive(Debug, Error)]
pub enum JobError {
    #[error("Failed to extract video URL: {0}")]
    Resolve(#[from] ResolveError),
    #[error("Failed to process video: {0}")]
    Transcode(#[from] TranscodeError),
    #[error("Failed to process video with FFmpeg: {0}")]
    Exit(String),
    #[error("FFmpeg finished without producing a clip")]
    MissingOutput,
    #[error("Failed to store clip: {0}")]
    Publish(StorageError),
}

#[derive(Debug, Clone)]
pub struct ServiceSettings {
    pub probe_ttl: Duration,
    pub constraints: FormatConstraints,
}

impl Default for ServiceSettings {
    fn default() -> Self {
        Self {
            probe_ttl: Duration::from_secs(30),
            constraints: FormatConstraints::default(),
        }
    }
}

/// A job that has been accepted and scheduled.
#[derive(Debug)]
pub struct Submitted {
    pub job_id: String,
    /// Completes once the job has reached a terminal state.
    pub task: JoinHandle<()>,
}

/// Accepts clip requests and drives each one through
/// resolve -> transcode -> finalize on its own task.
#[derive(Clone)]
pub struct ClipService {
    registry: Arc<JobRegistry>,
    resolver: Arc<dyn MediaResolver>,
    transcoder: Arc<dyn Transcoder>,
    store: Arc<dyn ArtifactStore>,
    probe: Arc<ToolProbe>,
    constraints: FormatConstraints,
}

impl ClipService {
    pub fn new(
        registry: Arc<JobRegistry>,
        resolver: Arc<dyn MediaResolver>,
        transcoder: Arc<dyn Transcoder>,
        store: Arc<dyn ArtifactStore>,
        settings: ServiceSettings,
    ) -> Self {
        Self {
            probe: Arc::new(ToolProbe::new(transcoder.clone(), settings.probe_ttl)),
            registry,
            resolver,
            transcoder,
            store,
            constraints: settings.constraints,
        }
    }

    pub fn registry(&self) -> &JobRegistry {
        &self.registry
    }

    pub fn store(&self) -> &dyn ArtifactStore {
        self.store.as_ref()
    }

    pub async fn tool_available(&self) -> bool {
        self.probe.available().await
    }

    /// Validate, register and schedule a clip job. Returns without waiting
    /// for any of the media work.
    pub async fn submit(&self, request: ClipRequest) -> Result<Submitted, SubmitError> {
        let plan = request.validate()?;
        if !self.tool_available().await {
            warn!("rejecting clip request, ffmpeg unavailable");
            return Err(SubmitError::ToolUnavailable);
        }

        let job_id = Uuid::new_v4().to_string();
        self.registry.create(&job_id);
        info!(
            job_id = %job_id,
            source = %plan.source,
            start = plan.start_seconds,
            duration = plan.duration_seconds,
            "clip job queued"
        );

        let task = self.spawn_job(job_id.clone(), plan);
        Ok(Submitted { job_id, task })
    }

    /// Run the pipeline on its own task and supervise it from another, so
    /// that errors and panics alike end in a terminal job state.
    fn spawn_job(&self, job_id: String, plan: ClipPlan) -> JoinHandle<()> {
        let worker = self.clone();

        tokio::spawn(async move {
            let pipeline = {
                let worker = worker.clone();
                let job_id = job_id.clone();
                tokio::spawn(async move { worker.run_pipeline(&job_id, &plan).await })
            };

            let failure = match pipeline.await {
                Ok(Ok(())) => return,
                Ok(Err(e)) => e.to_string(),
                Err(e) => format!("Clip job aborted: {e}"),
            };

            error!(job_id = %job_id, error = %failure, "clip job failed");
            worker
                .registry
                .update(&job_id, JobStatus::Failed, 0, failure);

            // Never leave a partial clip behind.
            if let Err(e) = worker.store.remove(&job_id).await {
                warn!(job_id = %job_id, error = %e, "failed to remove partial artifact");
            }
        })
    }

    async fn run_pipeline(&self, job_id: &str, plan: &ClipPlan) -> Result<(), JobError> {
        // 1. Resolve
        self.registry
            .update(job_id, JobStatus::Resolving, RESOLVING_PROGRESS, MSG_RESOLVING);
        let stream_url = self.resolver.resolve(&plan.source, &self.constraints).await?;

        // 2. Transcode
        self.registry
            .update(job_id, JobStatus::Transcoding, TRANSCODE_FLOOR, MSG_TRANSCODING);
        let spec = TranscodeSpec {
            input: stream_url,
            output: self.store.staging_path_for(job_id),
            start_seconds: plan.start_seconds,
            duration_seconds: plan.duration_seconds,
        };

        let (tx, rx) = mpsc::unbounded_channel();
        let tracker = tokio::spawn(track_progress(
            self.registry.clone(),
            job_id.to_string(),
            plan.duration_seconds,
            rx,
        ));
        let outcome = self.transcoder.transcode(&spec, tx).await;
        // The sender is gone once transcode returns, so this drains and ends.
        if let Err(e) = tracker.await {
            warn!(job_id = %job_id, error = %e, "progress tracker ended abnormally");
        }
        let outcome = outcome?;

        if !outcome.success() {
            let detail = excerpt(&outcome.diagnostics, EXCERPT_LIMIT);
            return Err(JobError::Exit(if detail.is_empty() {
                format!("exit code {:?}", outcome.exit_code)
            } else {
                detail
            }));
        }

        // 3. Finalize
        match self.store.publish(job_id).await {
            Ok(()) => {}
            Err(StorageError::NotFound) => return Err(JobError::MissingOutput),
            Err(e) => return Err(JobError::Publish(e)),
        }
        self.registry
            .update(job_id, JobStatus::Completed, 100, MSG_COMPLETED);
        info!(job_id = %job_id, "clip ready");
        Ok(())
    }
}

async fn track_progress(
    registry: Arc<JobRegistry>,
    job_id: String,
    total_seconds: f64,
    mut rx: mpsc::UnboundedReceiver<f64>,
) {
    while let Some(elapsed) = rx.recv().await {
        let percent = transcode_percent(elapsed, total_seconds);
        registry.update(&job_id, JobStatus::Transcoding, percent, MSG_TRANSCODING);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::local::fs::FsArtifactStore;
    use crate::domain::jobs::Job;
    use crate::ports::resolver::MockMediaResolver;
    use crate::testing::FakeTranscoder;
    use tempfile::{tempdir, TempDir};
    use tokio::sync::Notify;

    struct Harness {
        service: ClipService,
        transcoder: Arc<FakeTranscoder>,
        _dir: TempDir,
    }

    fn resolver_ok() -> MockMediaResolver {
        let mut resolver = MockMediaResolver::new();
        resolver
            .expect_resolve()
            .returning(|_, _| Ok("https://cdn.example.com/stream.mp4".to_string()));
        resolver
    }

    fn harness(resolver: MockMediaResolver, transcoder: FakeTranscoder) -> Harness {
        let dir = tempdir().unwrap();
        let transcoder = Arc::new(transcoder);
        let service = ClipService::new(
            Arc::new(JobRegistry::new()),
            Arc::new(resolver),
            transcoder.clone(),
            Arc::new(FsArtifactStore::new(dir.path())),
            ServiceSettings::default(),
        );
        Harness {
            service,
            transcoder,
            _dir: dir,
        }
    }

    fn request(start: f64, end: Option<f64>) -> ClipRequest {
        ClipRequest {
            source: "https://www.youtube.com/watch?v=abc".to_string(),
            start_seconds: start,
            end_seconds: end,
        }
    }

    async fn run_to_end(service: &ClipService, request: ClipRequest) -> Job {
        let submitted = service.submit(request).await.unwrap();
        submitted.task.await.unwrap();
        service.registry().get(&submitted.job_id)
    }

    #[tokio::test]
    async fn test_successful_job_completes_with_artifact() {
        let h = harness(resolver_ok(), FakeTranscoder::succeeding(vec![1.0, 2.5, 5.0]));

        let submitted = h.service.submit(request(10.0, Some(15.0))).await.unwrap();
        let job_id = submitted.job_id.clone();
        submitted.task.await.unwrap();

        let job = h.service.registry().get(&job_id);
        assert_eq!(job.status, JobStatus::Completed);
        assert_eq!(job.progress, 100);
        assert_eq!(job.message, "Clip ready!");
        assert!(h.service.store().exists(&job_id).await);

        let specs = h.transcoder.specs();
        assert_eq!(specs.len(), 1);
        assert_eq!(specs[0].input, "https://cdn.example.com/stream.mp4");
        assert_eq!(specs[0].start_seconds, 10.0);
        assert_eq!(specs[0].duration_seconds, 5.0);
        assert_eq!(specs[0].output, h.service.store().staging_path_for(&job_id));
        assert!(!specs[0].output.exists());
    }

    #[tokio::test]
    async fn test_polled_progress_is_monotonic() {
        let steps = (0..=50).map(|i| f64::from(i) * 0.1).collect();
        let h = harness(resolver_ok(), FakeTranscoder::succeeding(steps));

        let submitted = h.service.submit(request(0.0, Some(5.0))).await.unwrap();

        let mut last = 0;
        loop {
            let job = h.service.registry().get(&submitted.job_id);
            assert!(job.progress >= last, "progress went from {last} to {}", job.progress);
            assert_eq!(job.progress == 100, job.status == JobStatus::Completed);
            last = job.progress;
            if job.status.is_terminal() {
                assert_eq!(job.status, JobStatus::Completed);
                break;
            }
            tokio::task::yield_now().await;
        }
        submitted.task.await.unwrap();
    }

    #[tokio::test]
    async fn test_invalid_range_creates_no_job() {
        let h = harness(MockMediaResolver::new(), FakeTranscoder::succeeding(vec![]));

        for (start, end) in [(90.0, Some(30.0)), (5.0, None), (5.0, Some(5.0))] {
            let err = h.service.submit(request(start, end)).await.unwrap_err();
            assert_eq!(err, SubmitError::InvalidRange);
        }
        assert!(h.service.registry().is_empty());
    }

    #[tokio::test]
    async fn test_unavailable_tool_rejects_before_job_creation() {
        let h = harness(MockMediaResolver::new(), FakeTranscoder::unavailable());

        let err = h.service.submit(request(0.0, Some(3.0))).await.unwrap_err();

        assert_eq!(err, SubmitError::ToolUnavailable);
        assert!(h.service.registry().is_empty());
    }

    #[tokio::test]
    async fn test_resolution_failure_fails_job_without_transcoding() {
        let mut resolver = MockMediaResolver::new();
        resolver
            .expect_resolve()
            .returning(|_, _| Err(ResolveError::Failed("Video unavailable".to_string())));
        let h = harness(resolver, FakeTranscoder::succeeding(vec![]));

        let job = run_to_end(&h.service, request(0.0, Some(3.0))).await;

        assert_eq!(job.status, JobStatus::Failed);
        assert_eq!(job.progress, 0);
        assert!(job.message.contains("Video unavailable"), "{}", job.message);
        assert!(h.transcoder.specs().is_empty());
    }

    #[tokio::test]
    async fn test_hung_resolver_fails_job() {
        let mut resolver = MockMediaResolver::new();
        resolver
            .expect_resolve()
            .returning(|_, _| Err(ResolveError::TimedOut(Duration::from_secs(120))));
        let h = harness(resolver, FakeTranscoder::succeeding(vec![]));

        let job = run_to_end(&h.service, request(0.0, Some(3.0))).await;

        assert_eq!(job.status, JobStatus::Failed);
        assert_eq!(job.message, "Failed to extract video URL: resolver did not answer within 120s");
        assert!(h.transcoder.specs().is_empty());
    }

    #[tokio::test]
    async fn test_nonzero_exit_fails_and_removes_partial_output() {
        let diagnostics = format!("{}\nConversion failed!", "x".repeat(1000));
        let h = harness(resolver_ok(), FakeTranscoder::failing(1, &diagnostics));

        let job = run_to_end(&h.service, request(0.0, Some(3.0))).await;

        assert_eq!(job.status, JobStatus::Failed);
        assert_eq!(job.progress, 0);
        assert!(job.message.starts_with("Failed to process video with FFmpeg: "));
        assert!(job.message.ends_with("Conversion failed!"));
        let excerpt = job
            .message
            .trim_start_matches("Failed to process video with FFmpeg: ");
        assert!(excerpt.chars().count() <= EXCERPT_LIMIT);
        assert!(!h.service.store().exists(&job.id).await);
        assert!(!h.service.store().staging_path_for(&job.id).exists());
    }

    #[tokio::test]
    async fn test_panicking_transcoder_still_fails_job() {
        let h = harness(resolver_ok(), FakeTranscoder::panicking());

        let job = run_to_end(&h.service, request(0.0, Some(3.0))).await;

        assert_eq!(job.status, JobStatus::Failed);
        assert!(job.message.starts_with("Clip job aborted"), "{}", job.message);
    }

    #[tokio::test]
    async fn test_jobs_are_isolated() {
        let mut resolver = MockMediaResolver::new();
        resolver.expect_resolve().returning(|source, _| {
            if source.contains("bad") {
                Err(ResolveError::NoStream)
            } else {
                Ok("https://cdn.example.com/ok.mp4".to_string())
            }
        });
        let h = harness(resolver, FakeTranscoder::succeeding(vec![1.0]));

        let bad = h
            .service
            .submit(ClipRequest {
                source: "https://example.com/bad".to_string(),
                start_seconds: 0.0,
                end_seconds: Some(2.0),
            })
            .await
            .unwrap();
        let good = h.service.submit(request(0.0, Some(2.0))).await.unwrap();
        bad.task.await.unwrap();
        good.task.await.unwrap();

        assert_eq!(h.service.registry().get(&bad.job_id).status, JobStatus::Failed);
        assert_eq!(h.service.registry().get(&good.job_id).status, JobStatus::Completed);
    }

    #[tokio::test]
    async fn test_clip_in_progress_is_not_published() {
        let gate = Arc::new(Notify::new());
        let h = harness(resolver_ok(), FakeTranscoder::gated(gate.clone()));

        let submitted = h.service.submit(request(0.0, Some(3.0))).await.unwrap();
        let staging = h.service.store().staging_path_for(&submitted.job_id);
        while !staging.exists() {
            tokio::task::yield_now().await;
        }

        assert_eq!(
            h.service.registry().get(&submitted.job_id).status,
            JobStatus::Transcoding
        );
        assert!(!h.service.store().exists(&submitted.job_id).await);

        gate.notify_one();
        submitted.task.await.unwrap();

        assert!(h.service.store().exists(&submitted.job_id).await);
        assert!(!staging.exists());
    }

    #[tokio::test]
    async fn test_missing_output_fails_job() {
        let h = harness(resolver_ok(), FakeTranscoder::silent());

        let job = run_to_end(&h.service, request(0.0, Some(3.0))).await;

        assert_eq!(job.status, JobStatus::Failed);
        assert_eq!(job.message, "FFmpeg finished without producing a clip");
    }
}
