//! Cache entry and remote metadata types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use super::hash::ContentHash;
use super::key::ResourceKey;

/// Millisecond timestamp reported when the remote last-modified is unknown.
pub const UNKNOWN_TIMESTAMP: i64 = -1;

/// Metadata the transport observed for a remote resource.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExternalResourceMetaData {
    /// Location the resource was fetched or probed from.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    /// Remote last-modified time, if the remote reports one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_modified: Option<DateTime<Utc>>,
    /// Declared content length. Advisory only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_length: Option<u64>,
    /// Declared content type.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
    /// ETag, recorded for display. Never used for negotiation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub etag: Option<String>,
    /// Label of the provider that produced the metadata (e.g. "http").
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,
}

impl ExternalResourceMetaData {
    /// Metadata for a resource at `location`.
    pub fn new(location: impl Into<String>) -> Self {
        Self {
            location: Some(location.into()),
            ..Self::default()
        }
    }

    /// Set the remote last-modified time.
    pub fn with_last_modified(mut self, last_modified: DateTime<Utc>) -> Self {
        self.last_modified = Some(last_modified);
        self
    }

    /// Set the declared content length.
    pub fn with_content_length(mut self, len: u64) -> Self {
        self.content_length = Some(len);
        self
    }

    /// Set the declared content type.
    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    /// Set the ETag.
    pub fn with_etag(mut self, etag: impl Into<String>) -> Self {
        self.etag = Some(etag.into());
        self
    }

    /// Set the provider label.
    pub fn with_provider(mut self, provider: impl Into<String>) -> Self {
        self.provider = Some(provider.into());
        self
    }
}

/// One immutable cache entry.
///
/// Either describes stored bytes (`cached_file` present, length and hash
/// computed from those bytes) or records that the resource is known to be
/// missing remotely. Updates never mutate an entry; the cache publishes a
/// new one in its place.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedExternalResource {
    key: ResourceKey,
    cached_file: Option<PathBuf>,
    cached_at: DateTime<Utc>,
    content_length: u64,
    content_hash: Option<ContentHash>,
    external_metadata: Option<ExternalResourceMetaData>,
}

impl CachedExternalResource {
    /// Entry describing bytes stored at `cached_file`.
    pub(crate) fn stored(
        key: ResourceKey,
        cached_file: PathBuf,
        cached_at: DateTime<Utc>,
        content_length: u64,
        content_hash: ContentHash,
        external_metadata: Option<ExternalResourceMetaData>,
    ) -> Self {
        Self {
            key,
            cached_file: Some(cached_file),
            cached_at,
            content_length,
            content_hash: Some(content_hash),
            external_metadata,
        }
    }

    /// Negative entry for a resource confirmed absent.
    pub(crate) fn missing(
        key: ResourceKey,
        cached_at: DateTime<Utc>,
        external_metadata: Option<ExternalResourceMetaData>,
    ) -> Self {
        Self {
            key,
            cached_file: None,
            cached_at,
            content_length: 0,
            content_hash: None,
            external_metadata,
        }
    }

    /// Key this entry is stored under.
    pub fn key(&self) -> &ResourceKey {
        &self.key
    }

    /// Whether a prior probe found the resource absent.
    pub fn is_missing(&self) -> bool {
        self.cached_file.is_none()
    }

    /// Path of the stored bytes; `None` for missing entries.
    ///
    /// The file is never modified. It stays readable after the entry is
    /// replaced, for the store's retention window, and is deleted when the
    /// entry is invalidated.
    pub fn cached_file(&self) -> Option<&Path> {
        self.cached_file.as_deref()
    }

    /// When this entry was written.
    pub fn cached_at(&self) -> DateTime<Utc> {
        self.cached_at
    }

    /// Actual length of the stored bytes.
    pub fn content_length(&self) -> u64 {
        self.content_length
    }

    /// Actual SHA-256 of the stored bytes; `None` for missing entries.
    pub fn content_hash(&self) -> Option<&ContentHash> {
        self.content_hash.as_ref()
    }

    /// Remote metadata observed when the entry was written.
    pub fn external_metadata(&self) -> Option<&ExternalResourceMetaData> {
        self.external_metadata.as_ref()
    }

    /// Remote last-modified time; `None` when unknown or no metadata exists.
    pub fn external_last_modified(&self) -> Option<DateTime<Utc>> {
        self.external_metadata.as_ref()?.last_modified
    }

    /// Remote last-modified as epoch milliseconds, or [`UNKNOWN_TIMESTAMP`].
    pub fn external_last_modified_millis(&self) -> i64 {
        self.external_last_modified()
            .map_or(UNKNOWN_TIMESTAMP, |t| t.timestamp_millis())
    }

    /// Age of this entry relative to `now`.
    pub fn age(&self, now: DateTime<Utc>) -> chrono::Duration {
        now.signed_duration_since(self.cached_at)
    }
}
