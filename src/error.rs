//! Error types for the enrichment engine

use std::fmt;
use thiserror::Error;

/// Result type for enrichment operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors surfaced by the crate API.
///
/// Lookup misses and retried transients never appear here; they are control
/// flow inside the lookup client. Per-row faults are logged and absorbed by
/// the pipeline, so a caller only sees errors raised before a job exists
/// (validation, configuration) or while producing the output artifact.
#[derive(Error, Debug)]
pub enum Error {
    /// Input rejected before any job was created
    #[error("Validation error: {0}")]
    Validation(String),

    /// Bad configuration (endpoint URL, client construction)
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Reading or writing tabular data failed
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

impl Error {
    /// Create a validation error
    pub fn validation<M: fmt::Display>(msg: M) -> Self {
        Self::Validation(msg.to_string())
    }

    /// Create a configuration error
    pub fn config<M: fmt::Display>(msg: M) -> Self {
        Self::Config(msg.to_string())
    }

    /// Check if this is a validation error
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }
}
