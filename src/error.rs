//! Error types for rescache operations.
//!
//! This module defines [`CacheError`], the primary error type used throughout
//! the crate, and a [`Result`] type alias for convenience.
//!
//! # Error Handling Strategy
//!
//! - Storage failures surface to the caller and leave the cache unchanged
//! - Corrupt entries are never fatal: readers treat them as absent
//! - Use `anyhow::Error` (via `CacheError::Other`) for unexpected errors

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for cache operations.
#[derive(Debug, Error)]
pub enum CacheError {
    /// Reading from or writing to the backing store failed.
    #[error("Storage error while {context}: {source}")]
    Storage {
        context: String,
        #[source]
        source: std::io::Error,
    },

    /// A stored entry no longer matches its recorded length or hash.
    #[error("Corrupt cache entry for '{key}': {reason}")]
    CorruptEntry { key: String, reason: String },

    /// A metadata record could not be encoded or decoded.
    #[error("Failed to serialize metadata record: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The transport could not fetch or probe a resource.
    #[error("Failed to access {location}: {message}")]
    Transport { location: String, message: String },

    /// Configuration file could not be read or parsed.
    #[error("Invalid configuration at {path}: {message}")]
    Config { path: PathBuf, message: String },

    /// Generic wrapped error for anyhow interop.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl CacheError {
    /// Create a storage error with context.
    pub fn storage(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Storage {
            context: context.into(),
            source,
        }
    }

    /// Create a transport error.
    pub fn transport(location: impl Into<String>, message: impl ToString) -> Self {
        Self::Transport {
            location: location.into(),
            message: message.to_string(),
        }
    }

    /// Whether retrying the surrounding fetch-and-populate may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Storage { .. } | Self::Transport { .. })
    }
}

/// Result type alias for cache operations.
pub type Result<T> = std::result::Result<T, CacheError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn storage_error_displays_context() {
        let err = CacheError::storage(
            "writing /cache/meta/abc.json",
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        );
        let msg = err.to_string();
        assert!(msg.contains("/cache/meta/abc.json"));
        assert!(msg.contains("denied"));
    }

    #[test]
    fn corrupt_entry_displays_key_and_reason() {
        let err = CacheError::CorruptEntry {
            key: "https://repo/a.jar".into(),
            reason: "hash mismatch".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("https://repo/a.jar"));
        assert!(msg.contains("hash mismatch"));
    }

    #[test]
    fn transport_error_displays_location() {
        let err = CacheError::transport("https://repo/a.pom", "HTTP 500");
        assert!(err.to_string().contains("https://repo/a.pom"));
        assert!(err.to_string().contains("HTTP 500"));
    }

    #[test]
    fn config_error_displays_path() {
        let err = CacheError::Config {
            path: PathBuf::from("/home/u/.rescache/config.yml"),
            message: "bad ttl".into(),
        };
        assert!(err.to_string().contains("config.yml"));
    }

    #[test]
    fn retryable_kinds() {
        assert!(CacheError::transport("x", "timeout").is_retryable());
        assert!(!CacheError::CorruptEntry {
            key: "k".into(),
            reason: "r".into()
        }
        .is_retryable());
    }

    #[test]
    fn anyhow_converts() {
        let err: CacheError = anyhow::anyhow!("boom").into();
        assert!(matches!(err, CacheError::Other(_)));
    }
}
