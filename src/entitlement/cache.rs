//! Bounded TTL cache in front of an [`EntitlementChecker`].
//!
//! Entries are soft state: a read never extends an entry's lifetime, so any
//! answer is served for at most `ttl` after it was fetched. Failures are
//! never cached.

use async_trait::async_trait;
use cached::{Cached, TimedSizedCache};
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::debug;

use super::{EntitlementChecker, EntitlementError};
use crate::identity::Identity;
use crate::policy::EntitlementLevel;

type CacheKey = (String, EntitlementLevel);

pub struct CachedEntitlementChecker<C> {
    inner: C,
    cache: Mutex<TimedSizedCache<CacheKey, bool>>,
}

impl<C: EntitlementChecker> CachedEntitlementChecker<C> {
    /// `ttl` is rounded down to whole seconds, minimum one.
    pub fn new(inner: C, ttl: Duration, max_entries: usize) -> Self {
        let lifespan = ttl.as_secs().max(1);
        Self {
            inner,
            cache: Mutex::new(TimedSizedCache::with_size_and_lifespan(
                max_entries.max(1),
                lifespan,
            )),
        }
    }

    pub async fn len(&self) -> usize {
        self.cache.lock().await.cache_size()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl<C: EntitlementChecker> EntitlementChecker for CachedEntitlementChecker<C> {
    async fn has_entitlement(
        &self,
        identity: &Identity,
        level: EntitlementLevel,
    ) -> Result<bool, EntitlementError> {
        let key = (identity.subject.clone(), level);

        if let Some(hit) = self.cache.lock().await.cache_get(&key).copied() {
            debug!(subject = %identity, %level, granted = hit, "[cache] entitlement hit");
            return Ok(hit);
        }

        // Lock is not held across the lookup; concurrent misses may both fetch.
        let granted = self.inner.has_entitlement(identity, level).await?;
        self.cache.lock().await.cache_set(key, granted);
        Ok(granted)
    }
}
