//! CSV-backed row store
//!
//! Input tables are CSV files with a header row; output artifacts are CSV
//! files named `<uuid>.csv` inside the configured directory. Load failures
//! are validation errors (bad input rejected before a job exists); persist
//! failures surface as IO/CSV errors and fail the owning job.

use super::{EnrichedSet, RowSet, RowStore};
use crate::error::{Error, Result};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use uuid::Uuid;

/// Row store reading and writing CSV tables under one directory
#[derive(Debug, Clone)]
pub struct CsvRowStore {
    dir: PathBuf,
}

impl CsvRowStore {
    /// Create a store writing artifacts into `dir`
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// The artifact directory
    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

#[async_trait]
impl RowStore for CsvRowStore {
    async fn load(&self, path: &Path) -> Result<RowSet> {
        let mut reader = csv::Reader::from_path(path)
            .map_err(|e| Error::validation(format!("cannot read {}: {e}", path.display())))?;
        let columns: Vec<String> = reader
            .headers()
            .map_err(|e| Error::validation(format!("malformed header in {}: {e}", path.display())))?
            .iter()
            .map(|h| h.to_string())
            .collect();
        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record.map_err(|e| {
                Error::validation(format!("malformed row in {}: {e}", path.display()))
            })?;
            rows.push(record.iter().map(|cell| cell.to_string()).collect());
        }
        RowSet::new(columns, rows)
    }

    async fn persist(&self, set: &EnrichedSet) -> Result<String> {
        std::fs::create_dir_all(&self.dir)?;
        let name = format!("{}.csv", Uuid::new_v4());
        let path = self.dir.join(&name);
        let mut writer = csv::Writer::from_path(&path)?;
        if let Err(err) = write_table(&mut writer, set) {
            // do not leave a partial artifact behind
            drop(writer);
            if let Err(remove_err) = std::fs::remove_file(&path) {
                warn!(
                    "cannot remove partial artifact {}: {remove_err}",
                    path.display()
                );
            }
            return Err(err);
        }
        info!("wrote {} enriched rows to {}", set.len(), path.display());
        Ok(name)
    }
}

fn write_table(writer: &mut csv::Writer<std::fs::File>, set: &EnrichedSet) -> Result<()> {
    writer.write_record(set.output_columns())?;
    for row in &set.rows {
        writer.write_record(row.output_cells())?;
    }
    writer.flush()?;
    Ok(())
}
