//! Read-through cache over a lookup client
//!
//! Identifiers repeat across batches (one company uploaded by many users),
//! so a small LRU in front of the HTTP client saves real requests. Present
//! and absent outcomes are both cached; errors are not, so a transient
//! fault never poisons an entry.

use crate::cnpj::Cnpj;
use crate::lookup::model::OfficeRecord;
use crate::lookup::LookupClient;
use async_trait::async_trait;
use lru::LruCache;
use std::num::NonZeroUsize;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::debug;

/// LRU-caching decorator for any [`LookupClient`]
pub struct CachedLookupClient {
    inner: Arc<dyn LookupClient>,
    cache: Mutex<LruCache<String, Option<OfficeRecord>>>,
}

impl CachedLookupClient {
    /// Wrap `inner` with a cache holding up to `capacity` outcomes
    pub fn new(inner: Arc<dyn LookupClient>, capacity: NonZeroUsize) -> Self {
        Self {
            inner,
            cache: Mutex::new(LruCache::new(capacity)),
        }
    }

    /// Number of cached outcomes
    pub async fn len(&self) -> usize {
        self.cache.lock().await.len()
    }
}

#[async_trait]
impl LookupClient for CachedLookupClient {
    async fn fetch(&self, cnpj: &Cnpj) -> anyhow::Result<Option<OfficeRecord>> {
        {
            let mut cache = self.cache.lock().await;
            if let Some(outcome) = cache.get(cnpj.as_str()) {
                debug!("lookup cache hit for {cnpj}");
                return Ok(outcome.clone());
            }
        }
        // lock released while the inner client works
        let outcome = self.inner.fetch(cnpj).await?;
        let mut cache = self.cache.lock().await;
        cache.put(cnpj.as_str().to_string(), outcome.clone());
        Ok(outcome)
    }
}
