//! # Matriz
//!
//! Batch enrichment of Brazilian company identifiers (CNPJ) with
//! asynchronous job tracking. A batch of identifiers is normalized,
//! looked up against a CNPJá-style open API with retry and backoff,
//! flattened into a fixed field set, classified into headquarters/branch
//! groups, and written out as a CSV artifact while a job registry tracks
//! progress for pollers.
//!
//! ## Usage
//!
//! ```bash
//! matriz enrich companies.csv
//! matriz lookup 11.222.333/0001-81
//! matriz sweep --once
//! ```
//!
//! ## Modules
//!
//! - `cnpj` - Identifier normalization, validation and structure
//! - `cleanup` - Aged artifact sweep
//! - `config` - Environment-driven runtime configuration
//! - `error` - Crate error type
//! - `extract` - Flat field extraction from lookup records
//! - `jobs` - Job tokens, registry and background runner
//! - `lookup` - Lookup client: HTTP, retry policy, cache, wire model
//! - `pipeline` - The enrichment pipeline and relationship deriver
//! - `rows` - Row sets, enriched rows and the CSV row store

pub mod cleanup;
pub mod cnpj;
pub mod config;
pub mod error;
pub mod extract;
pub mod jobs;
pub mod lookup;
pub mod pipeline;
pub mod rows;

pub use config::Config;
pub use error::{Error, Result};
