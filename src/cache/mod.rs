//! External resource caching.
//!
//! Resources fetched from remote repositories are kept on disk together with
//! a metadata record describing where they came from, when they were cached
//! and what the remote reported about them. Entries are immutable: an update
//! publishes a new entry in place of the old one.

pub mod entry;
pub mod external;
pub mod freshness;
pub mod hash;
pub mod key;
pub mod lock;
pub mod store;

pub use entry::{CachedExternalResource, ExternalResourceMetaData, UNKNOWN_TIMESTAMP};
pub use external::ExternalResourceCache;
pub use freshness::{
    format_duration, parse_ttl, Clock, Freshness, FreshnessDecision, FreshnessPolicy,
    FreshnessRequirement, RemoteCheck, SystemClock,
};
pub use hash::{ContentHash, HashingWriter};
pub use key::ResourceKey;
pub use lock::{LockMode, SlotGuard, SlotLocks};
pub use store::{MetadataStore, SUPERSEDED_RETENTION};

/// Get the default cache directory.
pub fn default_cache_dir() -> std::path::PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(|| std::path::PathBuf::from("."))
        .join("rescache")
        .join("resources")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_cache_dir_valid() {
        let path = default_cache_dir();
        assert!(path.ends_with("resources"));
    }
}
