//! ffmpeg subprocess adapter.
//!
//! The diagnostic stream is drained on its own task for the whole life of the
//! process so a full pipe can never stall the encoder.

use crate::domain::progress::parse_time_marker;
use crate::ports::transcoder::{TranscodeError, TranscodeOutcome, TranscodeSpec, Transcoder};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Command;
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, warn};

/// Number of non-progress diagnostic lines kept for error reporting.
const DIAGNOSTIC_TAIL_LINES: usize = 12;
/// Longest diagnostic line kept; the rest of an overlong line is dropped.
const MAX_LINE_BYTES: usize = 4096;
const PROBE_TIMEOUT: Duration = Duration::from_secs(10);

pub struct FfmpegTranscoder {
    binary: PathBuf,
    timeout: Duration,
    probe_timeout: Duration,
}

impl FfmpegTranscoder {
    pub fn new(binary: impl Into<PathBuf>, timeout: Duration) -> Self {
        Self {
            binary: binary.into(),
            timeout,
            probe_timeout: PROBE_TIMEOUT,
        }
    }

    pub fn with_probe_timeout(mut self, probe_timeout: Duration) -> Self {
        self.probe_timeout = probe_timeout;
        self
    }
}

/// Command line for a fast seek-and-encode into a web-friendly mp4.
pub fn transcode_args(spec: &TranscodeSpec) -> Vec<String> {
    vec![
        "-hide_banner".into(),
        "-nostdin".into(),
        "-y".into(),
        "-ss".into(),
        format!("{:.3}", spec.start_seconds),
        "-i".into(),
        spec.input.clone(),
        "-t".into(),
        format!("{:.3}", spec.duration_seconds),
        "-c:v".into(),
        "libx264".into(),
        "-preset".into(),
        "veryfast".into(),
        "-c:a".into(),
        "aac".into(),
        "-movflags".into(),
        "+faststart".into(),
        "-stats".into(),
        spec.output.to_string_lossy().into_owned(),
    ]
}

#[async_trait]
impl Transcoder for FfmpegTranscoder {
    async fn probe(&self) -> bool {
        let status = Command::new(&self.binary)
            .arg("-version")
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .status();

        match tokio::time::timeout(self.probe_timeout, status).await {
            Ok(Ok(status)) => status.success(),
            Ok(Err(e)) => {
                debug!(binary = ?self.binary, error = %e, "ffmpeg probe failed");
                false
            }
            Err(_) => {
                warn!(binary = ?self.binary, timeout = ?self.probe_timeout, "ffmpeg probe timed out");
                false
            }
        }
    }

    async fn transcode(
        &self,
        spec: &TranscodeSpec,
        progress: UnboundedSender<f64>,
    ) -> Result<TranscodeOutcome, TranscodeError> {
        let mut child = Command::new(&self.binary)
            .args(transcode_args(spec))
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(TranscodeError::Spawn)?;

        let stderr = child.stderr.take().ok_or_else(|| {
            std::io::Error::new(std::io::ErrorKind::Other, "failed to capture ffmpeg stderr")
        })?;
        let drain = tokio::spawn(drain_diagnostics(stderr, progress));

        let waited = tokio::time::timeout(self.timeout, child.wait()).await;
        let status = match waited {
            Ok(status) => status?,
            Err(_) => {
                warn!(output = ?spec.output, timeout = ?self.timeout, "ffmpeg timed out, killing it");
                if let Err(e) = child.kill().await {
                    warn!(error = %e, "failed to kill ffmpeg");
                }
                drain.abort();
                return Err(TranscodeError::TimedOut(self.timeout));
            }
        };

        let diagnostics = drain.await.unwrap_or_default();
        Ok(TranscodeOutcome {
            exit_code: status.code(),
            diagnostics,
        })
    }
}

/// Read ffmpeg's stderr to the end, splitting on `\r` as well as `\n` since
/// stats lines are overwritten in place. Elapsed times go to `progress`; the
/// remaining lines are kept in a bounded tail which is returned at EOF.
pub async fn drain_diagnostics<R>(mut reader: R, progress: UnboundedSender<f64>) -> String
where
    R: AsyncRead + Unpin,
{
    let mut tail: VecDeque<String> = VecDeque::with_capacity(DIAGNOSTIC_TAIL_LINES);
    let mut line: Vec<u8> = Vec::new();
    let mut chunk = [0u8; 4096];

    let handle_line = |raw: &[u8], tail: &mut VecDeque<String>| {
        let text = String::from_utf8_lossy(raw);
        let text = text.trim();
        if text.is_empty() {
            return;
        }
        if let Some(elapsed) = parse_time_marker(text) {
            // Nobody listening is fine; keep draining regardless.
            let _ = progress.send(elapsed);
            return;
        }
        if tail.len() == DIAGNOSTIC_TAIL_LINES {
            tail.pop_front();
        }
        tail.push_back(text.to_string());
    };

    loop {
        let read = match reader.read(&mut chunk).await {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) => {
                warn!(error = %e, "error reading ffmpeg diagnostics");
                break;
            }
        };

        for &byte in &chunk[..read] {
            match byte {
                b'\r' | b'\n' => {
                    handle_line(&line, &mut tail);
                    line.clear();
                }
                other if line.len() < MAX_LINE_BYTES => line.push(other),
                _ => {}
            }
        }
    }
    handle_line(&line, &mut tail);

    Vec::from(tail).join("\n")
}
