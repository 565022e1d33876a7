use crate::domain::registry::JobRegistry;
use crate::ports::storage::{ArtifactStore, SweepReport};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::info;

/// Periodically evicts aged artifacts, together with the records of
/// finished jobs of the same age.
pub struct Sweeper {
    store: Arc<dyn ArtifactStore>,
    registry: Arc<JobRegistry>,
    max_age: Duration,
    interval: Duration,
}

impl Sweeper {
    pub fn new(
        store: Arc<dyn ArtifactStore>,
        registry: Arc<JobRegistry>,
        max_age: Duration,
        interval: Duration,
    ) -> Self {
        Self {
            store,
            registry,
            max_age,
            interval,
        }
    }

    pub async fn sweep_once(&self) -> SweepReport {
        let report = self.store.sweep(self.max_age).await;
        let evicted = self.registry.evict_finished(self.max_age);
        info!(
            removed = report.removed,
            failed = report.failed,
            kept = report.kept,
            jobs_evicted = evicted,
            "artifact sweep finished"
        );
        report
    }

    /// Sweep immediately, then every `interval`, until the runtime shuts down.
    pub fn start(self) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(self.interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                self.sweep_once().await;
            }
        })
    }
}
