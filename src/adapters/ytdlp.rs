//! yt-dlp adapter: resolves a page URL into a direct media URL without
//! downloading anything.

use crate::domain::progress::{excerpt, EXCERPT_LIMIT};
use crate::ports::resolver::{FormatConstraints, MediaResolver, ResolveError};
use async_trait::async_trait;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tracing::{debug, info, warn};

/// Some hosts answer 403 to the default client string.
const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

pub struct YtDlpResolver {
    binary: PathBuf,
    cookies_file: Option<PathBuf>,
    timeout: Duration,
}

impl YtDlpResolver {
    pub fn new(binary: impl Into<PathBuf>, cookies_file: Option<PathBuf>, timeout: Duration) -> Self {
        Self {
            binary: binary.into(),
            cookies_file,
            timeout,
        }
    }
}

/// Progressive (audio+video in one file) formats only, capped in height.
pub fn format_selector(constraints: &FormatConstraints) -> String {
    let h = constraints.max_height;
    format!("best[height<={h}][ext=mp4]/best[height<={h}]/best")
}

pub fn resolve_args(source: &str, constraints: &FormatConstraints, cookies: Option<&PathBuf>) -> Vec<String> {
    let mut args: Vec<String> = vec![
        "--no-playlist".into(),
        "--playlist-items".into(),
        "1".into(),
        "--no-warnings".into(),
        "--get-url".into(),
        "-f".into(),
        format_selector(constraints),
        "--user-agent".into(),
        USER_AGENT.into(),
    ];
    if let Some(cookies) = cookies {
        args.push("--cookies".into());
        args.push(cookies.to_string_lossy().into_owned());
    }
    // Sources that look like flags must not be read as options.
    args.push("--".into());
    args.push(source.to_string());
    args
}

/// yt-dlp prints one URL per selected stream. Anything but exactly one means
/// the format could not be served as a single addressable file.
pub fn parse_stream_urls(stdout: &str) -> Result<String, ResolveError> {
    let mut urls = stdout.lines().map(str::trim).filter(|line| !line.is_empty());
    match (urls.next(), urls.next()) {
        (None, _) => Err(ResolveError::NoStream),
        (Some(url), None) => Ok(url.to_string()),
        (Some(_), Some(_)) => Err(ResolveError::SplitStreams),
    }
}

#[async_trait]
impl MediaResolver for YtDlpResolver {
    async fn resolve(
        &self,
        source: &str,
        constraints: &FormatConstraints,
    ) -> Result<String, ResolveError> {
        let cookies = match &self.cookies_file {
            Some(path) if tokio::fs::try_exists(path).await.unwrap_or(false) => Some(path),
            Some(path) => {
                debug!(path = ?path, "cookies file missing, resolving anonymously");
                None
            }
            None => None,
        };

        info!(source, "resolving stream url");
        let run = Command::new(&self.binary)
            .args(resolve_args(source, constraints, cookies))
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output();

        // Dropping the timed-out future drops the child, which kills it.
        let output = match tokio::time::timeout(self.timeout, run).await {
            Ok(output) => output?,
            Err(_) => {
                warn!(source, timeout = ?self.timeout, "yt-dlp timed out, killing it");
                return Err(ResolveError::TimedOut(self.timeout));
            }
        };

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let detail = excerpt(&stderr, EXCERPT_LIMIT);
            return Err(ResolveError::Failed(if detail.is_empty() {
                format!("yt-dlp exited with {}", output.status)
            } else {
                detail
            }));
        }

        parse_stream_urls(&String::from_utf8_lossy(&output.stdout))
    }
}
