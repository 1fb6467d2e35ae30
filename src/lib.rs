//! rescache - Consistent on-disk cache for remotely fetched resources.
//!
//! Resources downloaded from remote repositories are stored on disk with a
//! metadata record (when they were cached, their length and SHA-256, and what
//! the remote reported). Concurrent readers and writers of the same key are
//! serialized per key, and every update is published atomically.
//!
//! # Modules
//!
//! - [`cache`] - Entries, storage, per-key locking and freshness rules
//! - [`cli`] - Command-line interface and argument parsing
//! - [`config`] - Configuration loading
//! - [`error`] - Error types and result aliases
//! - [`fetch`] - Remote transports and fetch-through caching
//! - [`ui`] - Terminal output, prompts and spinners
//!
//! # Example
//!
//! ```
//! use rescache::cache::{ExternalResourceCache, FreshnessRequirement, ResourceKey};
//! use tempfile::TempDir;
//!
//! let temp = TempDir::new().unwrap();
//! let cache = ExternalResourceCache::open(temp.path()).unwrap();
//! let key = ResourceKey::new("https://repo.example.com/lib-1.0.jar");
//!
//! cache.save_resource(&key, &b"jar bytes"[..], None).unwrap();
//!
//! let decision = cache.use_cached(&key, &FreshnessRequirement::any_age()).unwrap();
//! assert!(decision.is_fresh());
//! assert_eq!(decision.entry().unwrap().content_length(), 9);
//! ```

pub mod cache;
pub mod cli;
pub mod config;
pub mod error;
pub mod fetch;
pub mod ui;

pub use error::{CacheError, Result};
