//! Test doubles shared by unit tests across modules.

use crate::ports::transcoder::{TranscodeError, TranscodeOutcome, TranscodeSpec, Transcoder};
use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc::UnboundedSender;
use tokio::sync::Notify;

/// Contents of every clip a successful fake run produces.
pub const CLIP_BYTES: &[u8] = b"\x00\x00\x00\x18ftypisom";

enum Behaviour {
    Succeed,
    /// Writes part of the clip, then waits for the gate before finishing it.
    Gated(Arc<Notify>),
    /// Exits cleanly without writing anything.
    Silent,
    Fail { code: i32, diagnostics: String },
    Panic,
}

/// Transcoder that replays elapsed-time markers and writes a dummy clip.
pub struct FakeTranscoder {
    available: bool,
    steps: Vec<f64>,
    behaviour: Behaviour,
    specs: Mutex<Vec<TranscodeSpec>>,
}

impl FakeTranscoder {
    fn new(available: bool, steps: Vec<f64>, behaviour: Behaviour) -> Self {
        Self {
            available,
            steps,
            behaviour,
            specs: Mutex::new(Vec::new()),
        }
    }

    pub fn succeeding(steps: Vec<f64>) -> Self {
        Self::new(true, steps, Behaviour::Succeed)
    }

    /// Writes partial output, then exits with `code`.
    pub fn failing(code: i32, diagnostics: &str) -> Self {
        Self::new(
            true,
            vec![0.5],
            Behaviour::Fail {
                code,
                diagnostics: diagnostics.to_string(),
            },
        )
    }

    pub fn gated(gate: Arc<Notify>) -> Self {
        Self::new(true, vec![], Behaviour::Gated(gate))
    }

    pub fn silent() -> Self {
        Self::new(true, vec![], Behaviour::Silent)
    }

    pub fn panicking() -> Self {
        Self::new(true, vec![], Behaviour::Panic)
    }

    pub fn unavailable() -> Self {
        Self::new(false, vec![], Behaviour::Succeed)
    }

    pub fn specs(&self) -> Vec<TranscodeSpec> {
        self.specs.lock().unwrap().clone()
    }
}

#[async_trait]
impl Transcoder for FakeTranscoder {
    async fn probe(&self) -> bool {
        self.available
    }

    async fn transcode(
        &self,
        spec: &TranscodeSpec,
        progress: UnboundedSender<f64>,
    ) -> Result<TranscodeOutcome, TranscodeError> {
        self.specs.lock().unwrap().push(spec.clone());

        for &elapsed in &self.steps {
            let _ = progress.send(elapsed);
            tokio::task::yield_now().await;
        }

        match &self.behaviour {
            Behaviour::Succeed => {
                tokio::fs::write(&spec.output, CLIP_BYTES).await?;
                Ok(TranscodeOutcome {
                    exit_code: Some(0),
                    diagnostics: String::new(),
                })
            }
            Behaviour::Gated(gate) => {
                tokio::fs::write(&spec.output, b"half-written").await?;
                gate.notified().await;
                tokio::fs::write(&spec.output, CLIP_BYTES).await?;
                Ok(TranscodeOutcome {
                    exit_code: Some(0),
                    diagnostics: String::new(),
                })
            }
            Behaviour::Silent => Ok(TranscodeOutcome {
                exit_code: Some(0),
                diagnostics: String::new(),
            }),
            Behaviour::Fail { code, diagnostics } => {
                tokio::fs::write(&spec.output, b"partial").await?;
                Ok(TranscodeOutcome {
                    exit_code: Some(*code),
                    diagnostics: diagnostics.clone(),
                })
            }
            Behaviour::Panic => panic!("transcoder blew up"),
        }
    }
}

/// Write an executable shell script standing in for an external tool. The
/// script ignores its arguments.
#[cfg(unix)]
pub fn stub_binary(dir: &std::path::Path, body: &str) -> std::path::PathBuf {
    use std::os::unix::fs::PermissionsExt;

    let path = dir.join("stub-tool");
    std::fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
    path
}
