//! Job state definitions
//!
//! A job tracks one asynchronous enrichment run: an opaque token, a status
//! that moves `pending → processing → completed|failed`, a 0-100 progress
//! value, and the failure message or artifact name once the run ends.
//! Terminal states are never left.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Opaque identifier handed to the submitter of a job
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct JobToken(String);

impl JobToken {
    /// Create a fresh token
    pub fn new() -> Self {
        Self(format!("job-{}", Uuid::new_v4()))
    }

    /// Get the inner string
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for JobToken {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for JobToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Lifecycle states of a job
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Pending,
    Processing,
    Completed,
    Failed,
}

impl JobStatus {
    /// Whether this status ends the lifecycle
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }
}

/// Tracked state of one enrichment job
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
    pub status: JobStatus,
    pub progress: u8,
    pub error: Option<String>,
    pub file: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Job {
    /// A freshly created job: pending, nothing done yet
    pub fn new() -> Self {
        let now = Utc::now();
        Self {
            status: JobStatus::Pending,
            progress: 0,
            error: None,
            file: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Whether the job has reached a terminal status
    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }
}

impl Default for Job {
    fn default() -> Self {
        Self::new()
    }
}

/// Field edits applied to a job, batched per registry update
#[derive(Debug, Clone)]
pub enum JobUpdate {
    Status(JobStatus),
    Progress(u8),
    Error(String),
    File(String),
}

/// Poller-facing view of a job, shaped for the wire.
///
/// Serializes to `{"status": ..., "progress": ..., "error": ..., "file": ...}`
/// with the bare `{"status":"not_found"}` sentinel for unknown tokens.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum JobReport {
    Pending {
        progress: u8,
        error: Option<String>,
        file: Option<String>,
    },
    Processing {
        progress: u8,
        error: Option<String>,
        file: Option<String>,
    },
    Completed {
        progress: u8,
        error: Option<String>,
        file: Option<String>,
    },
    Failed {
        progress: u8,
        error: Option<String>,
        file: Option<String>,
    },
    NotFound,
}

impl JobReport {
    /// Progress carried by the report, absent for the sentinel
    pub fn progress(&self) -> Option<u8> {
        match self {
            JobReport::Pending { progress, .. }
            | JobReport::Processing { progress, .. }
            | JobReport::Completed { progress, .. }
            | JobReport::Failed { progress, .. } => Some(*progress),
            JobReport::NotFound => None,
        }
    }

    /// Artifact name, present only on completed reports
    pub fn file(&self) -> Option<&str> {
        match self {
            JobReport::Completed { file, .. } => file.as_deref(),
            _ => None,
        }
    }

    /// Failure message, present only on failed reports
    pub fn error(&self) -> Option<&str> {
        match self {
            JobReport::Failed { error, .. } => error.as_deref(),
            _ => None,
        }
    }

    /// Whether the underlying job can no longer change
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            JobReport::Completed { .. } | JobReport::Failed { .. } | JobReport::NotFound
        )
    }
}

impl From<&Job> for JobReport {
    fn from(job: &Job) -> Self {
        let progress = job.progress;
        let error = job.error.clone();
        let file = job.file.clone();
        match job.status {
            JobStatus::Pending => JobReport::Pending {
                progress,
                error,
                file,
            },
            JobStatus::Processing => JobReport::Processing {
                progress,
                error,
                file,
            },
            JobStatus::Completed => JobReport::Completed {
                progress,
                error,
                file,
            },
            JobStatus::Failed => JobReport::Failed {
                progress,
                error,
                file,
            },
        }
    }
}
