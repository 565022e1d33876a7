use crate::ports::transcoder::Transcoder;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

/// Transcoder availability check with a short-lived cached answer, so health
/// checks and submissions do not each fork a process.
pub struct ToolProbe {
    transcoder: Arc<dyn Transcoder>,
    ttl: Duration,
    last: Mutex<Option<(Instant, bool)>>,
}

impl ToolProbe {
    pub fn new(transcoder: Arc<dyn Transcoder>, ttl: Duration) -> Self {
        Self {
            transcoder,
            ttl,
            last: Mutex::new(None),
        }
    }

    pub async fn available(&self) -> bool {
        // Held across the probe so concurrent callers share one subprocess.
        let mut last = self.last.lock().await;
        if let Some((at, available)) = *last {
            if at.elapsed() < self.ttl {
                return available;
            }
        }

        let available = self.transcoder.probe().await;
        *last = Some((Instant::now(), available));
        available
    }
}
