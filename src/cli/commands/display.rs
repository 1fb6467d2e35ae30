//! Shared display helpers for cache entries.
//!
//! Used by `list`, `show` and `fetch` to render entries consistently.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::PathBuf;

use crate::cache::{format_duration, CachedExternalResource, ContentHash, ExternalResourceMetaData};
use crate::ui::UserInterface;

/// JSON view of a cache entry.
#[derive(Debug, Serialize)]
pub struct EntryView {
    pub key: String,
    pub missing: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<PathBuf>,
    pub cached_at: DateTime<Utc>,
    pub content_length: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_hash: Option<ContentHash>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<ExternalResourceMetaData>,
}

impl From<&CachedExternalResource> for EntryView {
    fn from(entry: &CachedExternalResource) -> Self {
        Self {
            key: entry.key().to_string(),
            missing: entry.is_missing(),
            file: entry.cached_file().map(PathBuf::from),
            cached_at: entry.cached_at(),
            content_length: entry.content_length(),
            content_hash: entry.content_hash().cloned(),
            metadata: entry.external_metadata().cloned(),
        }
    }
}

/// Human-readable byte count.
pub fn format_bytes(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["KiB", "MiB", "GiB", "TiB"];
    if bytes < 1024 {
        return format!("{} B", bytes);
    }
    let mut value = bytes as f64 / 1024.0;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    format!("{:.1} {}", value, UNITS[unit])
}

/// "5m ago" style age of a timestamp.
pub fn format_age(timestamp: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let age = now.signed_duration_since(timestamp);
    if age.num_seconds() < 1 {
        return "just now".to_string();
    }
    format!("{} ago", format_duration(age))
}

/// One-line summary of an entry.
pub fn entry_summary(entry: &CachedExternalResource, now: DateTime<Utc>) -> String {
    let state = if entry.is_missing() {
        "missing".to_string()
    } else {
        format_bytes(entry.content_length())
    };
    format!(
        "{} [{}] {}",
        entry.key(),
        state,
        format_age(entry.cached_at(), now)
    )
}

/// Print every recorded field of an entry.
pub fn show_entry_details(ui: &mut dyn UserInterface, entry: &CachedExternalResource) {
    ui.message(&format!("  {}", entry.key()));
    if entry.is_missing() {
        ui.message("    Status: missing remotely");
    } else {
        ui.message(&format!("    Size: {} bytes", entry.content_length()));
    }
    if let Some(path) = entry.cached_file() {
        ui.message(&format!("    File: {}", path.display()));
    }
    if let Some(hash) = entry.content_hash() {
        ui.message(&format!("    SHA-256: {}", hash));
    }
    ui.message(&format!("    Cached at: {}", entry.cached_at().to_rfc3339()));
    if let Some(modified) = entry.external_last_modified() {
        ui.message(&format!("    Last modified: {}", modified.to_rfc3339()));
    }
    if let Some(meta) = entry.external_metadata() {
        if let Some(location) = &meta.location {
            ui.message(&format!("    Location: {}", location));
        }
        if let Some(content_type) = &meta.content_type {
            ui.message(&format!("    Content type: {}", content_type));
        }
        if let Some(etag) = &meta.etag {
            ui.message(&format!("    ETag: {}", etag));
        }
    }
}
