//! Concurrency-safe job registry
//!
//! The registry is the only shared mutable state in the engine: one writer
//! (the job's own task) and any number of concurrent pollers. A single
//! RwLock write per update batch guarantees a poller never observes a
//! partially-applied multi-field update.

use super::state::{Job, JobReport, JobToken, JobUpdate};
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, warn};

/// Keyed store of job states, cheap to clone and share
#[derive(Clone, Default)]
pub struct JobRegistry {
    jobs: Arc<RwLock<HashMap<JobToken, Job>>>,
}

impl JobRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new pending job and hand back its token
    pub async fn create(&self) -> JobToken {
        let token = JobToken::new();
        let mut jobs = self.jobs.write().await;
        jobs.insert(token.clone(), Job::new());
        debug!("created job {token}");
        token
    }

    /// Apply a batch of field edits under one write lock.
    ///
    /// Unknown tokens are a logged no-op. Status edits on a terminal job are
    /// dropped; progress can only move forward and is capped at 100.
    pub async fn update<I>(&self, token: &JobToken, updates: I)
    where
        I: IntoIterator<Item = JobUpdate>,
    {
        let mut jobs = self.jobs.write().await;
        let Some(job) = jobs.get_mut(token) else {
            warn!("dropping update for unknown job {token}");
            return;
        };
        for update in updates {
            match update {
                JobUpdate::Status(status) => {
                    if job.status.is_terminal() {
                        warn!("job {token} already terminal; ignoring status edit");
                        continue;
                    }
                    job.status = status;
                }
                JobUpdate::Progress(progress) => {
                    job.progress = job.progress.max(progress.min(100));
                }
                JobUpdate::Error(error) => job.error = Some(error),
                JobUpdate::File(file) => job.file = Some(file),
            }
        }
        job.updated_at = Utc::now();
    }

    /// Snapshot of a job's full state
    pub async fn get(&self, token: &JobToken) -> Option<Job> {
        self.jobs.read().await.get(token).cloned()
    }

    /// Poller-facing report; unknown tokens get the not-found sentinel
    pub async fn status(&self, token: &JobToken) -> JobReport {
        match self.jobs.read().await.get(token) {
            Some(job) => JobReport::from(job),
            None => JobReport::NotFound,
        }
    }

    /// Number of tracked jobs
    pub async fn len(&self) -> usize {
        self.jobs.read().await.len()
    }

    /// Whether no jobs are tracked
    pub async fn is_empty(&self) -> bool {
        self.jobs.read().await.is_empty()
    }
}
