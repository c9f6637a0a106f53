//! The enrichment pipeline
//!
//! One pass over a validated row set, strictly in input order: normalize
//! the identifier, report progress, look the identifier up, flatten the
//! result, and collect a fresh enriched row. A fault in one row never stops
//! the batch; invalid identifiers skip the lookup but still count toward
//! progress. After the last row the relationship pass classifies
//! headquarters and branches.

pub mod relationships;

pub use relationships::derive_relationships;

use crate::cnpj::{self, Cnpj};
use crate::error::Result;
use crate::extract::{self, FieldSet};
use crate::jobs::{JobRegistry, JobToken, JobUpdate};
use crate::lookup::LookupClient;
use crate::rows::{EnrichedRow, EnrichedSet, RowSet};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, warn};

/// The enrichment pipeline: sole writer of job progress
pub struct EnrichmentPipeline {
    client: Arc<dyn LookupClient>,
    registry: JobRegistry,
    request_delay: Duration,
}

impl EnrichmentPipeline {
    /// Create a pipeline over a lookup client and the shared registry
    pub fn new(
        client: Arc<dyn LookupClient>,
        registry: JobRegistry,
        request_delay: Duration,
    ) -> Self {
        Self {
            client,
            registry,
            request_delay,
        }
    }

    /// The registry this pipeline reports into
    pub fn registry(&self) -> &JobRegistry {
        &self.registry
    }

    /// Enrich every row of `rows`, in order, into a fresh table.
    ///
    /// With a job token, progress is updated before each row's lookup to
    /// `floor(started_rows / total × 100)`, so it reflects rows started and
    /// reaches 100 while the final row is being processed.
    pub async fn enrich(&self, rows: &RowSet, job: Option<&JobToken>) -> Result<EnrichedSet> {
        let total = rows.len();
        let mut enriched = Vec::with_capacity(total);

        for index in 0..total {
            let raw = rows.raw_identifier(index);
            let identifier = cnpj::normalize(raw);
            let parsed = Cnpj::parse(raw);

            if let Some(token) = job {
                let progress = progress_for(index, total);
                self.registry
                    .update(token, [JobUpdate::Progress(progress)])
                    .await;
            }

            let fields = match &parsed {
                Some(key) => self.lookup_fields(key).await,
                None => {
                    debug!("identifier '{raw}' failed validation; skipping lookup");
                    FieldSet::default()
                }
            };

            enriched.push(EnrichedRow {
                input: rows.rows()[index].clone(),
                identifier,
                cnpj: parsed,
                fields,
            });

            // spacing between lookups, not after the final row
            if index + 1 < total {
                sleep(self.request_delay).await;
            }
        }

        let mut set = EnrichedSet {
            columns: rows.columns().to_vec(),
            rows: enriched,
        };
        relationships::derive_relationships(&mut set.rows);
        Ok(set)
    }

    /// One row's lookup with fault isolation: any error leaves the row
    /// empty and the batch running.
    async fn lookup_fields(&self, key: &Cnpj) -> FieldSet {
        match self.client.fetch(key).await {
            Ok(Some(record)) => extract::extract(&record),
            Ok(None) => {
                debug!("no record for {key}; row left empty");
                FieldSet::default()
            }
            Err(err) => {
                warn!("enrichment of {key} failed: {err:#}; row left empty");
                FieldSet::default()
            }
        }
    }
}

/// Progress reported before row `index` of `total` is looked up
fn progress_for(index: usize, total: usize) -> u8 {
    if total == 0 {
        return 100;
    }
    (((index + 1) * 100) / total) as u8
}
