//! Artifact sweep
//!
//! Output artifacts are meant to be downloaded shortly after a job
//! finishes; anything older than the configured age is disposable. A sweep
//! pass walks the artifact directory and removes aged `.csv` files,
//! skipping (and logging) anything it cannot stat or delete. The periodic
//! loop runs a pass every hour, backing off for ten minutes after a failed
//! pass.

use crate::error::Result;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};
use tokio::fs;
use tracing::{debug, info, warn};

/// Time between successful sweep passes
pub const SWEEP_INTERVAL: Duration = Duration::from_secs(3600);

/// Wait before retrying after a failed pass
pub const SWEEP_RETRY: Duration = Duration::from_secs(600);

/// Counters from one sweep pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepStats {
    /// Artifacts examined
    pub scanned: usize,
    /// Artifacts removed
    pub removed: usize,
}

/// Remove artifacts older than `max_age` from `dir`.
///
/// Only `.csv` files are considered. Per-file failures are logged and
/// skipped; a missing directory is an empty pass, not an error.
pub async fn sweep_once(dir: &Path, max_age: Duration) -> Result<SweepStats> {
    let mut stats = SweepStats::default();
    if !dir.exists() {
        return Ok(stats);
    }
    let now = SystemTime::now();
    let mut entries = fs::read_dir(dir).await?;
    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        if path.extension().and_then(|e| e.to_str()) != Some("csv") {
            continue;
        }
        stats.scanned += 1;
        let modified = match entry.metadata().await.and_then(|m| m.modified()) {
            Ok(modified) => modified,
            Err(err) => {
                warn!("cannot stat {}: {err}; skipping", path.display());
                continue;
            }
        };
        let age = now.duration_since(modified).unwrap_or_default();
        if age <= max_age {
            continue;
        }
        match fs::remove_file(&path).await {
            Ok(()) => {
                debug!("removed aged artifact {}", path.display());
                stats.removed += 1;
            }
            Err(err) => warn!("cannot remove {}: {err}; skipping", path.display()),
        }
    }
    if stats.removed > 0 {
        info!(
            "sweep removed {} of {} artifacts in {}",
            stats.removed,
            stats.scanned,
            dir.display()
        );
    }
    Ok(stats)
}

/// Run sweep passes forever at the fixed cadence
pub async fn run_sweeper(dir: PathBuf, max_age: Duration) {
    info!(
        "artifact sweeper watching {} (max age {max_age:?})",
        dir.display()
    );
    loop {
        match sweep_once(&dir, max_age).await {
            Ok(stats) => {
                debug!(
                    "sweep pass scanned {} artifacts, removed {}",
                    stats.scanned, stats.removed
                );
                tokio::time::sleep(SWEEP_INTERVAL).await;
            }
            Err(err) => {
                warn!("sweep pass failed: {err}; retrying in {SWEEP_RETRY:?}");
                tokio::time::sleep(SWEEP_RETRY).await;
            }
        }
    }
}
