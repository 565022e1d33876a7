//! Server binary - wires the adapters to the clip service and serves the API.

use clipd::adapters::ffmpeg::FfmpegTranscoder;
use clipd::adapters::ytdlp::YtDlpResolver;
use clipd::ports::resolver::FormatConstraints;
use clipd::{router, ClipService, ClipperConfig, FsArtifactStore, JobRegistry, ServiceSettings, Sweeper};
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = ClipperConfig::from_env();

    // 1. Adapters
    let store = Arc::new(FsArtifactStore::new(&config.storage_dir));
    if let Err(e) = store.ensure_dir().await {
        error!(path = ?config.storage_dir, error = %e, "cannot create storage directory");
        return Err(e.into());
    }

    if let Err(e) = config.materialize_cookies() {
        // Resolution still works for public sources.
        error!(path = ?config.cookies_file, error = %e, "failed to write cookies file");
    }
    let resolver = YtDlpResolver::new(
        &config.ytdlp_bin,
        Some(config.cookies_file.clone()),
        config.resolve_timeout,
    );
    let transcoder = FfmpegTranscoder::new(&config.ffmpeg_bin, config.transcode_timeout);

    // 2. Application services
    let registry = Arc::new(JobRegistry::new());
    let service = ClipService::new(
        registry.clone(),
        Arc::new(resolver),
        Arc::new(transcoder),
        store.clone(),
        ServiceSettings {
            probe_ttl: config.probe_cache_ttl,
            constraints: FormatConstraints {
                max_height: config.max_height,
            },
        },
    );

    // 3. Background sweeper
    Sweeper::new(
        store,
        registry,
        config.artifact_max_age,
        config.sweep_interval,
    )
    .start();

    // 4. HTTP
    let app = router(service);
    let listener = tokio::net::TcpListener::bind(config.bind_addr()).await?;
    info!("Listening at {}", config.bind_addr());
    axum::serve(listener, app).await?;

    Ok(())
}
