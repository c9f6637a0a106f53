//! Background job execution
//!
//! `submit` validates the batch, registers a pending job and spawns one
//! independent task to drive it: mark processing, enrich, persist, then
//! settle on completed or failed. Faults inside the task are recorded in
//! the registry and never escape; the submitting caller only ever blocks
//! for the validation and the token.

use super::registry::JobRegistry;
use super::state::{JobStatus, JobToken, JobUpdate};
use crate::error::{Error, Result};
use crate::pipeline::EnrichmentPipeline;
use crate::rows::{RowSet, RowStore};
use std::sync::Arc;
use tracing::{error, info};

/// Spawns and tracks enrichment jobs
pub struct JobRunner {
    registry: JobRegistry,
    pipeline: Arc<EnrichmentPipeline>,
    store: Arc<dyn RowStore>,
    max_rows: usize,
}

impl JobRunner {
    /// Create a runner over a pipeline and a row store.
    ///
    /// The runner reports into the same registry the pipeline writes
    /// progress to.
    pub fn new(
        pipeline: Arc<EnrichmentPipeline>,
        store: Arc<dyn RowStore>,
        max_rows: usize,
    ) -> Self {
        Self {
            registry: pipeline.registry().clone(),
            pipeline,
            store,
            max_rows,
        }
    }

    /// The registry pollers should query
    pub fn registry(&self) -> &JobRegistry {
        &self.registry
    }

    /// Validate a batch and start it as a background job.
    ///
    /// Oversized batches are rejected here, before any job exists. On
    /// success the returned token immediately resolves to a pending job.
    pub async fn submit(&self, rows: RowSet) -> Result<JobToken> {
        if rows.len() > self.max_rows {
            return Err(Error::validation(format!(
                "input has {} rows; the maximum per job is {}",
                rows.len(),
                self.max_rows
            )));
        }
        let token = self.registry.create().await;
        let registry = self.registry.clone();
        let pipeline = self.pipeline.clone();
        let store = self.store.clone();
        let job_token = token.clone();
        tokio::spawn(async move {
            run_job(registry, pipeline, store, rows, job_token).await;
        });
        Ok(token)
    }
}

/// Drive one job to its terminal state
async fn run_job(
    registry: JobRegistry,
    pipeline: Arc<EnrichmentPipeline>,
    store: Arc<dyn RowStore>,
    rows: RowSet,
    token: JobToken,
) {
    info!("job {token} started with {} rows", rows.len());
    registry
        .update(
            &token,
            [
                JobUpdate::Status(JobStatus::Processing),
                JobUpdate::Progress(0),
            ],
        )
        .await;

    let outcome = async {
        let set = pipeline.enrich(&rows, Some(&token)).await?;
        store.persist(&set).await
    }
    .await;

    match outcome {
        Ok(artifact) => {
            registry
                .update(
                    &token,
                    [
                        JobUpdate::Status(JobStatus::Completed),
                        JobUpdate::Progress(100),
                        JobUpdate::File(artifact.clone()),
                    ],
                )
                .await;
            info!("job {token} completed; artifact {artifact}");
        }
        Err(err) => {
            error!("job {token} failed: {err}");
            registry
                .update(
                    &token,
                    [
                        JobUpdate::Status(JobStatus::Failed),
                        JobUpdate::Error(err.to_string()),
                    ],
                )
                .await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cnpj::Cnpj;
    use crate::jobs::state::JobReport;
    use crate::lookup::model::OfficeRecord;
    use crate::lookup::LookupClient;
    use crate::rows::EnrichedSet;
    use async_trait::async_trait;
    use std::path::Path;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Duration;

    struct StaticClient;

    #[async_trait]
    impl LookupClient for StaticClient {
        async fn fetch(&self, _cnpj: &Cnpj) -> anyhow::Result<Option<OfficeRecord>> {
            Ok(Some(OfficeRecord::default()))
        }
    }

    struct MemoryStore {
        persisted: AtomicU32,
        failing: bool,
    }

    impl MemoryStore {
        fn new() -> Self {
            Self {
                persisted: AtomicU32::new(0),
                failing: false,
            }
        }

        fn failing() -> Self {
            Self {
                persisted: AtomicU32::new(0),
                failing: true,
            }
        }
    }

    #[async_trait]
    impl RowStore for MemoryStore {
        async fn load(&self, _path: &Path) -> crate::error::Result<RowSet> {
            Err(Error::validation("memory store does not load"))
        }

        async fn persist(&self, set: &EnrichedSet) -> crate::error::Result<String> {
            if self.failing {
                return Err(Error::Io(std::io::Error::other("disk full")));
            }
            self.persisted.fetch_add(1, Ordering::SeqCst);
            Ok(format!("rows-{}.csv", set.len()))
        }
    }

    fn runner_with(store: MemoryStore, max_rows: usize) -> (Arc<MemoryStore>, JobRunner) {
        let store = Arc::new(store);
        let pipeline = Arc::new(EnrichmentPipeline::new(
            Arc::new(StaticClient),
            JobRegistry::new(),
            Duration::ZERO,
        ));
        let runner = JobRunner::new(pipeline, store.clone(), max_rows);
        (store, runner)
    }

    fn rows(ids: &[&str]) -> RowSet {
        RowSet::new(
            vec!["cnpj".to_string()],
            ids.iter().map(|id| vec![id.to_string()]).collect(),
        )
        .unwrap()
    }

    async fn wait_terminal(registry: &JobRegistry, token: &JobToken) -> JobReport {
        loop {
            let report = registry.status(token).await;
            if report.is_terminal() {
                return report;
            }
            tokio::time::sleep(Duration::from_millis(2)).await;
        }
    }

    #[tokio::test]
    async fn oversized_batches_are_rejected_before_any_job_exists() {
        let (_, runner) = runner_with(MemoryStore::new(), 1);
        let err = runner
            .submit(rows(&["11222333000181", "11222333000262"]))
            .await
            .unwrap_err();
        assert!(err.is_validation());
        assert!(runner.registry().is_empty().await);
    }

    #[tokio::test]
    async fn submitted_jobs_complete_with_an_artifact() {
        let (store, runner) = runner_with(MemoryStore::new(), 100);
        let token = runner
            .submit(rows(&["11222333000181", "11222333000262"]))
            .await
            .unwrap();

        // the token resolves immediately, never to the sentinel
        assert_ne!(runner.registry().status(&token).await, JobReport::NotFound);

        let report = wait_terminal(runner.registry(), &token).await;
        assert_eq!(report.progress(), Some(100));
        assert_eq!(report.file(), Some("rows-2.csv"));
        assert_eq!(store.persisted.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn persist_failures_mark_the_job_failed() {
        let (_, runner) = runner_with(MemoryStore::failing(), 100);
        let token = runner.submit(rows(&["11222333000181"])).await.unwrap();

        let report = wait_terminal(runner.registry(), &token).await;
        assert!(matches!(report, JobReport::Failed { .. }));
        assert!(report.error().unwrap().contains("disk full"));
    }

    #[tokio::test]
    async fn empty_batches_complete_trivially() {
        let (_, runner) = runner_with(MemoryStore::new(), 100);
        let token = runner.submit(rows(&[])).await.unwrap();
        let report = wait_terminal(runner.registry(), &token).await;
        assert_eq!(report.progress(), Some(100));
        assert_eq!(report.file(), Some("rows-0.csv"));
    }

    #[tokio::test]
    async fn concurrent_jobs_do_not_interfere() {
        let (store, runner) = runner_with(MemoryStore::new(), 100);
        let first = runner.submit(rows(&["11222333000181"])).await.unwrap();
        let second = runner.submit(rows(&["99888777000155"])).await.unwrap();
        assert_ne!(first, second);

        let a = wait_terminal(runner.registry(), &first).await;
        let b = wait_terminal(runner.registry(), &second).await;
        assert!(matches!(a, JobReport::Completed { .. }));
        assert!(matches!(b, JobReport::Completed { .. }));
        assert_eq!(store.persisted.load(Ordering::SeqCst), 2);
        assert_eq!(runner.registry().len().await, 2);
    }
}
