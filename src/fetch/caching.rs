//! Fetch-through caching.
//!
//! The cache is consulted first. Stale entries are refetched with no slot
//! lock held, so a slow download never blocks readers of the old entry.
//! Publishing then goes through the cache's exclusive lock.

use tracing::{debug, info};

use super::ExternalResourceAccessor;
use crate::cache::{
    CachedExternalResource, ExternalResourceCache, ExternalResourceMetaData, FreshnessDecision,
    FreshnessRequirement, RemoteCheck, ResourceKey,
};
use crate::error::Result;

/// Resolves resources from the cache, falling back to an accessor.
pub struct CachingFetcher<'a, A> {
    cache: &'a ExternalResourceCache,
    accessor: A,
}

impl<'a, A: ExternalResourceAccessor> CachingFetcher<'a, A> {
    /// Create a fetcher over `cache` using `accessor` for remote access.
    pub fn new(cache: &'a ExternalResourceCache, accessor: A) -> Self {
        Self { cache, accessor }
    }

    /// Resolve `key`, fetching from `location` when the cache cannot serve it.
    ///
    /// The returned entry may be a negative one; check
    /// [`is_missing`](CachedExternalResource::is_missing).
    pub fn get(
        &self,
        key: &ResourceKey,
        location: &str,
        requirement: &FreshnessRequirement,
    ) -> Result<CachedExternalResource> {
        let (requirement, seen) = match self.cache.use_cached(key, requirement)? {
            FreshnessDecision::Fresh(entry) => {
                debug!("Cache hit for {}", key);
                return Ok(entry);
            }
            FreshnessDecision::Unknown(seen) => {
                let Some(observed) = self.accessor.probe(location)? else {
                    return self.record_missing(key, location);
                };
                let revalidated = FreshnessRequirement {
                    max_age: requirement.max_age,
                    remote: RemoteCheck::Observed(observed),
                };
                match self.cache.use_cached(key, &revalidated)? {
                    FreshnessDecision::Fresh(entry) => {
                        debug!("Revalidated {} against {}", key, location);
                        return Ok(entry);
                    }
                    decision => (revalidated, decision.into_entry().or(seen)),
                }
            }
            FreshnessDecision::Stale(seen) => (requirement.clone(), seen),
        };

        info!("Fetching {}", location);
        let Some(remote) = self.accessor.fetch(location)? else {
            return self.record_missing(key, location);
        };

        // Another caller may have published while this one was downloading.
        let recheck = FreshnessRequirement {
            max_age: requirement.max_age,
            remote: RemoteCheck::Observed(remote.metadata.clone()),
        };
        if let FreshnessDecision::Fresh(entry) = self.cache.use_cached(key, &recheck)? {
            if seen.as_ref() != Some(&entry) {
                debug!("{} was published concurrently, discarding download", key);
                return Ok(entry);
            }
        }

        self.cache
            .save_resource(key, remote.body, Some(remote.metadata))
    }

    fn record_missing(&self, key: &ResourceKey, location: &str) -> Result<CachedExternalResource> {
        debug!("{} not found at {}", key, location);
        self.cache
            .save_missing(key, Some(ExternalResourceMetaData::new(location)))
    }
}
