//! In-memory job registry shared by job workers and pollers.

use super::jobs::{Job, JobStatus};
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

#[derive(Debug, Default)]
pub struct JobRegistry {
    jobs: Mutex<HashMap<String, Job>>,
}

impl JobRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    // A poisoned lock only means a holder panicked mid-update; the map is still usable.
    fn lock(&self) -> MutexGuard<'_, HashMap<String, Job>> {
        self.jobs.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Register a fresh `queued` job. Re-creating an existing id resets it.
    pub fn create(&self, id: &str) -> Job {
        let job = Job::new(id);
        self.lock().insert(id.to_string(), job.clone());
        job
    }

    /// Latest snapshot, or a `not_found` pseudo-job.
    pub fn get(&self, id: &str) -> Job {
        self.lock()
            .get(id)
            .cloned()
            .unwrap_or_else(|| Job::not_found(id))
    }

    /// Replace status, progress and message as one unit.
    /// Returns false if the job is unknown or already terminal.
    pub fn update(&self, id: &str, status: JobStatus, progress: u8, message: impl Into<String>) -> bool {
        match self.lock().get_mut(id) {
            Some(job) => job.apply(status, progress, message),
            None => false,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Drop terminal jobs that have not changed for longer than `max_idle`.
    /// Running jobs are never evicted.
    pub fn evict_finished(&self, max_idle: Duration) -> usize {
        let mut jobs = self.lock();
        let before = jobs.len();
        jobs.retain(|_, job| !(job.status.is_terminal() && job.idle_for() > max_idle));
        before - jobs.len()
    }
}
