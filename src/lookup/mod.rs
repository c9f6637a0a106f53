//! Company lookup client
//!
//! [`LookupClient`] is the seam between the pipeline and the external
//! service: the HTTP implementation talks to a CNPJá-style open API, the
//! cache wrapper decorates any client, and tests substitute mocks. The
//! retry loop is a free driver over single-attempt outcomes so its behavior
//! is testable with scripted attempts and millisecond policies.
//!
//! A missing record is `Ok(None)`, never an error; so is a record the
//! service refused to give up after the retry budget. The `Err` channel
//! exists for other implementations and feeds the pipeline's per-row fault
//! isolation.

pub mod cache;
pub mod model;
pub mod retry;

pub use cache::CachedLookupClient;
pub use model::OfficeRecord;
pub use retry::RetryPolicy;

use crate::cnpj::Cnpj;
use crate::config::Config;
use crate::error::{Error, Result};
use async_trait::async_trait;
use reqwest::StatusCode;
use std::future::Future;
use std::num::NonZeroUsize;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, warn};
use url::Url;

/// Query flags sent with every lookup request
const REQUEST_FLAGS: [(&str, &str); 4] = [
    ("simples", "true"),
    ("registrations", "BR"),
    ("suframa", "true"),
    ("geocoding", "true"),
];

/// Client abstraction for the company lookup service
#[async_trait]
pub trait LookupClient: Send + Sync {
    /// Fetch the record for an identifier. `Ok(None)` means the service has
    /// no record (or gave none within the retry budget).
    async fn fetch(&self, cnpj: &Cnpj) -> anyhow::Result<Option<OfficeRecord>>;
}

/// What one request attempt produced
#[derive(Debug)]
enum AttemptOutcome {
    /// Decoded record
    Found(Box<OfficeRecord>),
    /// Service definitively has no record; do not retry
    NotFound,
    /// Service asked us to slow down; exponential backoff
    RateLimited,
    /// Unexpected status or undecodable body; linear backoff
    ServiceError(String),
    /// Connection or timeout failure; exponential backoff
    TransportError(String),
}

/// Drive attempts until success, definitive absence, or budget exhaustion.
///
/// `attempt_fn` issues exactly one request per call. The policy computes
/// every wait; this driver only sleeps and counts.
async fn run_with_retry<F, Fut>(
    policy: &RetryPolicy,
    identifier: &str,
    mut attempt_fn: F,
) -> Option<OfficeRecord>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = AttemptOutcome>,
{
    let mut attempts = 0u32;
    loop {
        let outcome = attempt_fn().await;
        attempts += 1;
        let failed = attempts - 1;
        let (wait, reason) = match outcome {
            AttemptOutcome::Found(record) => return Some(*record),
            AttemptOutcome::NotFound => {
                debug!("no record for {identifier}");
                return None;
            }
            AttemptOutcome::RateLimited => {
                (policy.backoff_delay(failed), "rate limited".to_string())
            }
            AttemptOutcome::TransportError(err) => (policy.backoff_delay(failed), err),
            AttemptOutcome::ServiceError(err) => (policy.linear_delay(failed), err),
        };
        if policy.is_exhausted(attempts) {
            warn!("lookup for {identifier} exhausted {attempts} attempts ({reason}); treating as missing");
            return None;
        }
        debug!("lookup attempt {attempts} for {identifier} failed ({reason}); retrying in {wait:?}");
        sleep(wait).await;
    }
}

/// HTTP client for the lookup service
pub struct HttpLookupClient {
    http: reqwest::Client,
    base_url: String,
    policy: RetryPolicy,
}

impl HttpLookupClient {
    /// Create a client against `base_url` with a per-attempt timeout
    pub fn new(base_url: &str, timeout: Duration, policy: RetryPolicy) -> Result<Self> {
        Url::parse(base_url)
            .map_err(|e| Error::config(format!("invalid lookup base URL {base_url}: {e}")))?;
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::config(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            policy,
        })
    }

    /// Create a client from the runtime configuration
    pub fn from_config(config: &Config) -> Result<Self> {
        let policy = RetryPolicy::new(
            config.max_retries,
            config.request_delay,
            config.backoff_factor,
        );
        Self::new(&config.base_url, config.request_timeout, policy)
    }

    async fn attempt(&self, cnpj: &Cnpj) -> AttemptOutcome {
        let url = format!("{}/{}", self.base_url, cnpj.as_str());
        let response = match self.http.get(&url).query(&REQUEST_FLAGS).send().await {
            Ok(response) => response,
            Err(err) => return AttemptOutcome::TransportError(err.to_string()),
        };
        match response.status() {
            StatusCode::NOT_FOUND => AttemptOutcome::NotFound,
            StatusCode::TOO_MANY_REQUESTS => AttemptOutcome::RateLimited,
            status if status.is_success() => match response.json::<OfficeRecord>().await {
                Ok(record) => AttemptOutcome::Found(Box::new(record)),
                Err(err) => AttemptOutcome::ServiceError(format!("undecodable body: {err}")),
            },
            status => AttemptOutcome::ServiceError(format!("unexpected status {status}")),
        }
    }
}

#[async_trait]
impl LookupClient for HttpLookupClient {
    async fn fetch(&self, cnpj: &Cnpj) -> anyhow::Result<Option<OfficeRecord>> {
        Ok(run_with_retry(&self.policy, cnpj.as_str(), || self.attempt(cnpj)).await)
    }
}

/// Build the configured client stack: the HTTP client, wrapped by the LRU
/// cache when a capacity is configured.
pub fn client_from_config(config: &Config) -> Result<Arc<dyn LookupClient>> {
    let http = HttpLookupClient::from_config(config)?;
    match NonZeroUsize::new(config.lookup_cache_size) {
        Some(capacity) => Ok(Arc::new(CachedLookupClient::new(Arc::new(http), capacity))),
        None => Ok(Arc::new(http)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;

    fn fast_policy(max_retries: u32) -> RetryPolicy {
        RetryPolicy::new(max_retries, Duration::from_millis(1), 2.0)
    }

    fn found() -> AttemptOutcome {
        AttemptOutcome::Found(Box::new(OfficeRecord::default()))
    }

    async fn run_script(
        policy: &RetryPolicy,
        outcomes: Vec<AttemptOutcome>,
    ) -> (Option<OfficeRecord>, u32) {
        let mut script = VecDeque::from(outcomes);
        let mut calls = 0u32;
        let result = run_with_retry(policy, "11222333000181", || {
            calls += 1;
            let outcome = script.pop_front().unwrap();
            async move { outcome }
        })
        .await;
        (result, calls)
    }

    #[tokio::test]
    async fn success_uses_a_single_attempt() {
        let (result, calls) = run_script(&fast_policy(3), vec![found()]).await;
        assert!(result.is_some());
        assert_eq!(calls, 1);
    }

    #[tokio::test]
    async fn not_found_never_retries() {
        let (result, calls) = run_script(&fast_policy(3), vec![AttemptOutcome::NotFound]).await;
        assert!(result.is_none());
        assert_eq!(calls, 1);
    }

    #[tokio::test]
    async fn rate_limiting_retries_up_to_the_budget() {
        let outcomes = vec![
            AttemptOutcome::RateLimited,
            AttemptOutcome::RateLimited,
            AttemptOutcome::RateLimited,
            // never reached: the budget is three attempts
            found(),
        ];
        let (result, calls) = run_script(&fast_policy(3), outcomes).await;
        assert!(result.is_none());
        assert_eq!(calls, 3);
    }

    #[tokio::test]
    async fn recovers_after_transient_rate_limiting() {
        let outcomes = vec![AttemptOutcome::RateLimited, AttemptOutcome::RateLimited, found()];
        let (result, calls) = run_script(&fast_policy(3), outcomes).await;
        assert!(result.is_some());
        assert_eq!(calls, 3);
    }

    #[tokio::test]
    async fn service_errors_exhaust_to_absence() {
        let outcomes = vec![
            AttemptOutcome::ServiceError("unexpected status 500".to_string()),
            AttemptOutcome::ServiceError("unexpected status 502".to_string()),
            AttemptOutcome::ServiceError("undecodable body".to_string()),
        ];
        let (result, calls) = run_script(&fast_policy(3), outcomes).await;
        assert!(result.is_none());
        assert_eq!(calls, 3);
    }

    #[tokio::test]
    async fn transport_errors_recover_like_rate_limits() {
        let outcomes = vec![
            AttemptOutcome::TransportError("connection refused".to_string()),
            found(),
        ];
        let (result, calls) = run_script(&fast_policy(3), outcomes).await;
        assert!(result.is_some());
        assert_eq!(calls, 2);
    }

    #[tokio::test]
    async fn single_attempt_budget_fails_fast() {
        let (result, calls) =
            run_script(&fast_policy(1), vec![AttemptOutcome::RateLimited]).await;
        assert!(result.is_none());
        assert_eq!(calls, 1);
    }

    #[test]
    fn construction_rejects_bad_base_url() {
        let err = HttpLookupClient::new("not a url", Duration::from_secs(1), fast_policy(3));
        assert!(err.is_err());
    }

    #[test]
    fn construction_trims_trailing_slash() {
        let client = HttpLookupClient::new(
            "https://open.cnpja.com/office/",
            Duration::from_secs(1),
            fast_policy(3),
        )
        .unwrap();
        assert_eq!(client.base_url, "https://open.cnpja.com/office");
    }
}
