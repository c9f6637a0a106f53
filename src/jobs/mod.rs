//! Asynchronous job tracking
//!
//! Submitting a batch yields an opaque token; the job runs as one
//! background task while pollers query the registry for a consistent
//! snapshot of its status, progress and outcome.

pub mod registry;
pub mod runner;
pub mod state;

pub use registry::JobRegistry;
pub use runner::JobRunner;
pub use state::{Job, JobReport, JobStatus, JobToken, JobUpdate};
