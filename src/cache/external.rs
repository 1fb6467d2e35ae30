//! The external resource cache.
//!
//! Composes the metadata store, the per-key slot locks and the freshness
//! policy. Reads take their slot's lock shared and writes take it exclusive,
//! so a reader never sees a half-published entry and two writers never
//! interleave on the same slot.
//!
//! Saving streams the new bytes into the staging area *before* taking the
//! slot lock; the lock is only held while the staged file and its record are
//! renamed into place. When two writers race on a key, the one that takes
//! the lock last wins.

use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

use super::entry::{CachedExternalResource, ExternalResourceMetaData};
use super::freshness::{
    Clock, Freshness, FreshnessDecision, FreshnessPolicy, FreshnessRequirement, RemoteCheck,
    SystemClock,
};
use super::key::ResourceKey;
use super::lock::SlotLocks;
use super::store::{corrupt, MetadataStore, SUPERSEDED_RETENTION};
use crate::config::CacheConfig;
use crate::error::Result;

/// Cache of resources fetched from remote repositories.
pub struct ExternalResourceCache {
    store: MetadataStore,
    locks: SlotLocks,
    clock: Arc<dyn Clock>,
    verify_checksums: bool,
}

impl ExternalResourceCache {
    /// Open (or create) a cache rooted at `root`.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let store = MetadataStore::open(root)?;
        let locks = SlotLocks::new(store.root());
        Ok(Self {
            store,
            locks,
            clock: Arc::new(SystemClock),
            verify_checksums: false,
        })
    }

    /// Open the cache described by a configuration.
    pub fn from_config(config: &CacheConfig) -> Result<Self> {
        Ok(Self::open(config.resolved_cache_dir())?.verify_checksums(config.verify_checksums))
    }

    /// Use a different time source.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Re-hash stored bytes in [`use_cached`](Self::use_cached).
    pub fn verify_checksums(mut self, verify: bool) -> Self {
        self.verify_checksums = verify;
        self
    }

    /// How long a replaced entry's content file stays readable.
    ///
    /// Defaults to [`SUPERSEDED_RETENTION`].
    pub fn superseded_retention(mut self, retention: Duration) -> Self {
        self.store = self.store.with_retention(retention);
        self
    }

    /// Get the cache root directory.
    pub fn root(&self) -> &Path {
        self.store.root()
    }

    /// Current entry for `key`, without any network activity.
    ///
    /// Waits while another caller is publishing the same key.
    pub fn lookup(&self, key: &ResourceKey) -> Result<Option<CachedExternalResource>> {
        let _guard = self.locks.shared(key)?;
        self.store.load(key)
    }

    /// Decide whether the entry for `key` can be used as is.
    ///
    /// Returns [`FreshnessDecision::Unknown`] when the requirement asks for a
    /// remote check the caller has not performed yet.
    pub fn use_cached(
        &self,
        key: &ResourceKey,
        requirement: &FreshnessRequirement,
    ) -> Result<FreshnessDecision> {
        let entry = {
            let _guard = self.locks.shared(key)?;
            let entry = self.store.load(key)?;
            match entry {
                Some(entry) if self.verify_checksums => match self.store.verify(&entry) {
                    Ok(()) => Some(entry),
                    Err(corruption) => {
                        warn!("{}", corrupt(key, &corruption));
                        None
                    }
                },
                other => other,
            }
        };

        let now = self.clock.now();
        let decision = match (FreshnessPolicy::decide(entry.as_ref(), requirement, now), entry) {
            (Freshness::Fresh, Some(entry)) if requirement.remote == RemoteCheck::Required => {
                FreshnessDecision::Unknown(Some(entry))
            }
            (Freshness::Fresh, Some(entry)) => FreshnessDecision::Fresh(entry),
            (_, entry) => FreshnessDecision::Stale(entry),
        };
        debug!(
            "Freshness of {}: {}",
            key,
            match &decision {
                FreshnessDecision::Fresh(_) => "fresh",
                FreshnessDecision::Stale(_) => "stale",
                FreshnessDecision::Unknown(_) => "unknown",
            }
        );
        Ok(decision)
    }

    /// Store the bytes `content` yields as the entry for `key`.
    ///
    /// Length and hash are computed from the bytes actually written. On
    /// failure the previous entry, if any, is left untouched.
    pub fn save_resource(
        &self,
        key: &ResourceKey,
        content: impl Read,
        remote_metadata: Option<ExternalResourceMetaData>,
    ) -> Result<CachedExternalResource> {
        // Stage outside the lock; `content` may be a network stream.
        let staged = self.store.stage(content)?;

        let _guard = self.locks.exclusive(key)?;
        let previous = self.store.load(key)?;
        let entry = CachedExternalResource::stored(
            key.clone(),
            self.store.content_path(key, staged.hash()),
            self.stamp(previous.as_ref()),
            staged.len(),
            staged.hash().clone(),
            remote_metadata,
        );
        self.store.publish(&entry, Some(staged), previous.as_ref())?;

        debug!(
            "Cached {} ({} bytes, sha256 {})",
            key,
            entry.content_length(),
            hash_label(&entry)
        );
        Ok(entry)
    }

    /// Record that `key` does not exist remotely.
    pub fn save_missing(
        &self,
        key: &ResourceKey,
        remote_metadata: Option<ExternalResourceMetaData>,
    ) -> Result<CachedExternalResource> {
        let _guard = self.locks.exclusive(key)?;
        let previous = self.store.load(key)?;
        let entry = CachedExternalResource::missing(
            key.clone(),
            self.stamp(previous.as_ref()),
            remote_metadata,
        );
        self.store.publish(&entry, None, previous.as_ref())?;

        debug!("Cached {} as missing", key);
        Ok(entry)
    }

    /// Remove the entry for `key`. Returns whether one existed.
    pub fn invalidate(&self, key: &ResourceKey) -> Result<bool> {
        let _guard = self.locks.exclusive(key)?;
        let removed = self.store.remove(key)?;
        if removed {
            debug!("Invalidated {}", key);
        }
        Ok(removed)
    }

    /// All readable entries, newest first.
    pub fn list(&self) -> Result<Vec<CachedExternalResource>> {
        let mut entries = Vec::new();
        for key in self.store.keys()? {
            if let Some(entry) = self.lookup(&key)? {
                entries.push(entry);
            }
        }
        entries.sort_by(|a, b| b.cached_at().cmp(&a.cached_at()));
        Ok(entries)
    }

    /// Invalidate every entry. Returns how many were removed.
    pub fn clear(&self) -> Result<usize> {
        let mut removed = 0;
        for key in self.store.keys()? {
            if self.invalidate(&key)? {
                removed += 1;
            }
        }
        Ok(removed)
    }

    /// Total bytes held by stored entries.
    pub fn total_size(&self) -> Result<u64> {
        Ok(self.list()?.iter().map(|e| e.content_length()).sum())
    }

    /// Timestamp for a replacement entry, never earlier than the one it replaces.
    fn stamp(&self, previous: Option<&CachedExternalResource>) -> chrono::DateTime<chrono::Utc> {
        let now = self.clock.now();
        match previous {
            Some(previous) if previous.cached_at() > now => previous.cached_at(),
            _ => now,
        }
    }
}

fn hash_label(entry: &CachedExternalResource) -> &str {
    entry.content_hash().map_or("-", |h| h.as_hex())
}
