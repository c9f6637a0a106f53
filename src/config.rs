//! Runtime configuration
//!
//! Every knob has a default suitable for the public lookup endpoint and can
//! be overridden through the environment variables the original deployment
//! used. Unparseable values are logged and ignored so a typo in the
//! environment never takes the service down.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use tracing::warn;

/// Configuration for the enrichment engine
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Base URL of the company lookup service
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Fixed delay between consecutive lookups in one batch
    #[serde(default = "default_request_delay", with = "humantime_serde")]
    pub request_delay: Duration,

    /// Total attempt budget per identifier
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Multiplier for exponential backoff after rate limiting
    #[serde(default = "default_backoff_factor")]
    pub backoff_factor: f64,

    /// Per-attempt HTTP timeout
    #[serde(default = "default_request_timeout", with = "humantime_serde")]
    pub request_timeout: Duration,

    /// Directory that receives output artifacts
    #[serde(default = "default_files_dir")]
    pub files_dir: PathBuf,

    /// Age past which the sweeper removes an artifact
    #[serde(default = "default_max_file_age", with = "humantime_serde")]
    pub max_file_age: Duration,

    /// Upload size cap in megabytes, enforced at ingress
    #[serde(default = "default_max_file_size_mb")]
    pub max_file_size_mb: u64,

    /// Maximum rows accepted per job
    #[serde(default = "default_max_rows")]
    pub max_rows: usize,

    /// Capacity of the read-through lookup cache; 0 disables it
    #[serde(default)]
    pub lookup_cache_size: usize,
}

fn default_base_url() -> String {
    "https://open.cnpja.com/office".to_string()
}

fn default_request_delay() -> Duration {
    Duration::from_secs(2)
}

fn default_max_retries() -> u32 {
    3
}

fn default_backoff_factor() -> f64 {
    2.0
}

fn default_request_timeout() -> Duration {
    Duration::from_secs(30)
}

fn default_files_dir() -> PathBuf {
    PathBuf::from("files")
}

fn default_max_file_age() -> Duration {
    Duration::from_secs(24 * 3600)
}

fn default_max_file_size_mb() -> u64 {
    10
}

fn default_max_rows() -> usize {
    1000
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            request_delay: default_request_delay(),
            max_retries: default_max_retries(),
            backoff_factor: default_backoff_factor(),
            request_timeout: default_request_timeout(),
            files_dir: default_files_dir(),
            max_file_age: default_max_file_age(),
            max_file_size_mb: default_max_file_size_mb(),
            max_rows: default_max_rows(),
            lookup_cache_size: 0,
        }
    }
}

impl Config {
    /// Build a configuration from defaults overlaid with environment variables
    pub fn from_env() -> Self {
        let mut config = Self::default();
        config.merge_env_vars();
        config
    }

    /// Upload size cap in bytes
    pub fn max_upload_bytes(&self) -> u64 {
        self.max_file_size_mb.saturating_mul(1024 * 1024)
    }

    /// Overlay environment variables onto this configuration
    pub fn merge_env_vars(&mut self) {
        if let Ok(url) = std::env::var("CNPJA_API_URL") {
            self.base_url = url;
        }

        if let Ok(raw) = std::env::var("API_DELAY") {
            match raw.parse::<f64>() {
                Ok(secs) if secs.is_finite() && secs >= 0.0 => {
                    self.request_delay = Duration::from_secs_f64(secs);
                }
                _ => warn!("ignoring invalid API_DELAY value: {raw}"),
            }
        }

        if let Ok(raw) = std::env::var("MAX_RETRIES") {
            match raw.parse::<u32>() {
                Ok(n) => self.max_retries = n,
                Err(_) => warn!("ignoring invalid MAX_RETRIES value: {raw}"),
            }
        }

        if let Ok(raw) = std::env::var("BACKOFF_FACTOR") {
            match raw.parse::<f64>() {
                Ok(factor) if factor.is_finite() && factor >= 1.0 => {
                    self.backoff_factor = factor;
                }
                _ => warn!("ignoring invalid BACKOFF_FACTOR value: {raw}"),
            }
        }

        if let Ok(raw) = std::env::var("REQUEST_TIMEOUT") {
            match raw.parse::<u64>() {
                Ok(secs) => self.request_timeout = Duration::from_secs(secs),
                Err(_) => warn!("ignoring invalid REQUEST_TIMEOUT value: {raw}"),
            }
        }

        if let Ok(dir) = std::env::var("FILES_DIR") {
            self.files_dir = PathBuf::from(dir);
        }

        if let Ok(raw) = std::env::var("MAX_FILE_AGE_HOURS") {
            match raw.parse::<u64>() {
                Ok(hours) => {
                    self.max_file_age = Duration::from_secs(hours.saturating_mul(3600));
                }
                Err(_) => warn!("ignoring invalid MAX_FILE_AGE_HOURS value: {raw}"),
            }
        }

        if let Ok(raw) = std::env::var("MAX_FILE_SIZE_MB") {
            match raw.parse::<u64>() {
                Ok(mb) => self.max_file_size_mb = mb,
                Err(_) => warn!("ignoring invalid MAX_FILE_SIZE_MB value: {raw}"),
            }
        }

        if let Ok(raw) = std::env::var("MAX_CNPJS_TOTAL") {
            match raw.parse::<usize>() {
                Ok(n) => self.max_rows = n,
                Err(_) => warn!("ignoring invalid MAX_CNPJS_TOTAL value: {raw}"),
            }
        }

        if let Ok(raw) = std::env::var("LOOKUP_CACHE_SIZE") {
            match raw.parse::<usize>() {
                Ok(n) => self.lookup_cache_size = n,
                Err(_) => warn!("ignoring invalid LOOKUP_CACHE_SIZE value: {raw}"),
            }
        }
    }
}
