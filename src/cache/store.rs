//! On-disk storage for cache entries.
//!
//! Layout under the cache root:
//!
//! ```text
//! meta/<slot>.json          metadata record (the commit point)
//! files/<slot>/<sha256>     stored bytes, named by their content hash
//! tmp/                      staging area for in-flight writes
//! ```
//!
//! Bytes are staged in `tmp/`, renamed into `files/<slot>/`, and only then is
//! the record renamed into `meta/`. A reader that finds a record therefore
//! always finds the bytes it describes.
//!
//! Content files of a replaced entry stay in their slot for a retention
//! window, so a path handed out before the replacement keeps pointing at the
//! bytes its entry describes. Later publishes to the slot sweep files whose
//! window has passed. Removing an entry deletes the whole slot at once.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::{self, BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};
use tempfile::NamedTempFile;
use tracing::{debug, warn};

use super::entry::{CachedExternalResource, ExternalResourceMetaData};
use super::hash::{ContentHash, HashingWriter};
use super::key::ResourceKey;
use crate::error::{CacheError, Result};

const RECORD_VERSION: u32 = 1;

/// How long a replaced content file outlives the entry that referenced it.
pub const SUPERSEDED_RETENTION: Duration = Duration::from_secs(10 * 60);

/// Serialized form of a cache entry.
#[derive(Debug, Serialize, Deserialize)]
struct StoredRecord {
    version: u32,
    key: ResourceKey,
    missing: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    file: Option<String>,
    cached_at: DateTime<Utc>,
    content_length: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    content_hash: Option<ContentHash>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    metadata: Option<ExternalResourceMetaData>,
}

/// Bytes written to the staging area but not yet published.
///
/// Dropping a staged write deletes the temporary file.
pub struct StagedContent {
    file: NamedTempFile,
    hash: ContentHash,
    len: u64,
}

impl StagedContent {
    /// Hash of the staged bytes.
    pub fn hash(&self) -> &ContentHash {
        &self.hash
    }

    /// Length of the staged bytes.
    pub fn len(&self) -> u64 {
        self.len
    }

    /// Whether nothing was staged.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

/// Why a record failed verification against its bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Corruption {
    /// The content file is gone.
    FileMissing,
    /// The file length differs from the record.
    LengthMismatch { recorded: u64, actual: u64 },
    /// The file hash differs from the record.
    HashMismatch,
}

impl std::fmt::Display for Corruption {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::FileMissing => write!(f, "content file is missing"),
            Self::LengthMismatch { recorded, actual } => {
                write!(f, "recorded length {} but file has {} bytes", recorded, actual)
            }
            Self::HashMismatch => write!(f, "content hash mismatch"),
        }
    }
}

/// Storage for metadata records and content files.
pub struct MetadataStore {
    /// Root directory for cache.
    root: PathBuf,
    retention: Duration,
}

impl MetadataStore {
    /// Open a store rooted at `root`, creating its directories.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let store = Self {
            root: root.into(),
            retention: SUPERSEDED_RETENTION,
        };
        for dir in [store.meta_dir(), store.files_dir(), store.tmp_dir()] {
            fs::create_dir_all(&dir)
                .map_err(|e| CacheError::storage(format!("creating {}", dir.display()), e))?;
        }
        Ok(store)
    }

    /// Keep replaced content files for `retention` before sweeping them.
    pub fn with_retention(mut self, retention: Duration) -> Self {
        self.retention = retention;
        self
    }

    /// Get the cache root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn meta_dir(&self) -> PathBuf {
        self.root.join("meta")
    }

    fn files_dir(&self) -> PathBuf {
        self.root.join("files")
    }

    fn tmp_dir(&self) -> PathBuf {
        self.root.join("tmp")
    }

    /// Path of the metadata record for a key.
    pub fn record_path(&self, key: &ResourceKey) -> PathBuf {
        self.meta_dir().join(format!("{}.json", key.slot_name()))
    }

    /// Directory holding a key's content files.
    fn slot_dir(&self, key: &ResourceKey) -> PathBuf {
        self.files_dir().join(key.slot_name())
    }

    /// Stream `reader` into the staging area, hashing as it is written.
    pub fn stage(&self, mut reader: impl Read) -> Result<StagedContent> {
        let tmp_dir = self.tmp_dir();
        let file = tempfile::Builder::new()
            .prefix(".staged-")
            .tempfile_in(&tmp_dir)
            .map_err(|e| CacheError::storage(format!("creating file in {}", tmp_dir.display()), e))?;

        let mut writer = HashingWriter::new(BufWriter::new(file.as_file()));
        io::copy(&mut reader, &mut writer)
            .map_err(|e| CacheError::storage("writing resource content", e))?;
        writer
            .flush()
            .map_err(|e| CacheError::storage("flushing resource content", e))?;
        let (_, hash, len) = writer.finish();

        file.as_file()
            .sync_all()
            .map_err(|e| CacheError::storage("syncing resource content", e))?;

        Ok(StagedContent { file, hash, len })
    }

    /// Load the record for `key`.
    ///
    /// Unreadable records, records for a different key, and records whose
    /// file is gone or has the wrong length are treated as absent.
    pub fn load(&self, key: &ResourceKey) -> Result<Option<CachedExternalResource>> {
        let path = self.record_path(key);
        let json = match fs::read_to_string(&path) {
            Ok(json) => json,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(CacheError::storage(format!("reading {}", path.display()), e)),
        };

        let record: StoredRecord = match serde_json::from_str(&json) {
            Ok(record) => record,
            Err(e) => {
                warn!("Ignoring unreadable cache record {}: {}", path.display(), e);
                return Ok(None);
            }
        };
        if record.key != *key {
            warn!(
                "Cache record {} belongs to '{}', not '{}'",
                path.display(),
                record.key,
                key
            );
            return Ok(None);
        }

        let Some(entry) = self.entry_from_record(record) else {
            warn!("Ignoring malformed cache record {}", path.display());
            return Ok(None);
        };

        if let Err(corruption) = self.check_length(&entry) {
            warn!("{}", corrupt(key, &corruption));
            return Ok(None);
        }
        Ok(Some(entry))
    }

    /// Publish an entry, making it visible to subsequent loads.
    ///
    /// `staged` must be present for stored entries and absent for missing
    /// ones. `previous` is the entry being replaced; once the new record is
    /// committed its content file starts its retention window.
    pub fn publish(
        &self,
        entry: &CachedExternalResource,
        staged: Option<StagedContent>,
        previous: Option<&CachedExternalResource>,
    ) -> Result<()> {
        let key = entry.key();
        let new_file = match (staged, entry.cached_file()) {
            (Some(staged), Some(target)) => {
                self.persist_content(staged, target)?;
                Some(target.to_path_buf())
            }
            (None, None) => None,
            _ => {
                return Err(CacheError::Other(anyhow::anyhow!(
                    "content and record disagree for '{}'",
                    key
                )))
            }
        };

        if let Err(e) = self.write_record(entry) {
            // Leave the previous entry as it was. Only drop the new file if
            // it is not also the previous entry's file.
            if let Some(path) = &new_file {
                if previous.and_then(|p| p.cached_file()) != Some(path.as_path()) {
                    let _ = fs::remove_file(path);
                }
            }
            return Err(e);
        }

        if let Some(old) = previous.and_then(|p| p.cached_file()) {
            if Some(old) != new_file.as_deref() {
                retire(old);
            }
        }
        self.sweep_superseded(key, new_file.as_deref());
        debug!("Published cache entry for {}", key);
        Ok(())
    }

    /// Target path for content with the given hash.
    pub fn content_path(&self, key: &ResourceKey, hash: &ContentHash) -> PathBuf {
        self.slot_dir(key).join(hash.as_hex())
    }

    fn persist_content(&self, staged: StagedContent, target: &Path) -> Result<()> {
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| CacheError::storage(format!("creating {}", parent.display()), e))?;
        }
        staged
            .file
            .persist(target)
            .map_err(|e| CacheError::storage(format!("publishing {}", target.display()), e.error))?;
        Ok(())
    }

    fn write_record(&self, entry: &CachedExternalResource) -> Result<()> {
        let record = StoredRecord {
            version: RECORD_VERSION,
            key: entry.key().clone(),
            missing: entry.is_missing(),
            file: entry.content_hash().map(|h| h.as_hex().to_string()),
            cached_at: entry.cached_at(),
            content_length: entry.content_length(),
            content_hash: entry.content_hash().cloned(),
            metadata: entry.external_metadata().cloned(),
        };
        let json = serde_json::to_vec_pretty(&record)?;

        let meta_dir = self.meta_dir();
        let mut tmp = tempfile::Builder::new()
            .prefix(".record-")
            .tempfile_in(&meta_dir)
            .map_err(|e| CacheError::storage(format!("creating file in {}", meta_dir.display()), e))?;
        tmp.write_all(&json)
            .and_then(|()| tmp.as_file().sync_all())
            .map_err(|e| CacheError::storage("writing metadata record", e))?;

        let path = self.record_path(entry.key());
        tmp.persist(&path)
            .map_err(|e| CacheError::storage(format!("publishing {}", path.display()), e.error))?;
        Ok(())
    }

    /// Remove content files of a slot, other than `keep`, whose retention
    /// window has passed.
    fn sweep_superseded(&self, key: &ResourceKey, keep: Option<&Path>) {
        let dir = self.slot_dir(key);
        let Ok(entries) = fs::read_dir(&dir) else {
            return;
        };
        let now = SystemTime::now();
        for entry in entries.flatten() {
            let path = entry.path();
            if Some(path.as_path()) == keep {
                continue;
            }
            let expired = entry
                .metadata()
                .and_then(|m| m.modified())
                .map(|modified| now.duration_since(modified).unwrap_or_default() >= self.retention)
                .unwrap_or(true);
            if !expired {
                continue;
            }
            match fs::remove_file(&path) {
                Ok(()) => debug!("Swept superseded file {}", path.display()),
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(e) => warn!("Failed to remove superseded file {}: {}", path.display(), e),
            }
        }
    }

    /// Remove the record and content of `key`.
    ///
    /// Returns whether a record existed.
    pub fn remove(&self, key: &ResourceKey) -> Result<bool> {
        let path = self.record_path(key);
        let removed = match fs::remove_file(&path) {
            Ok(()) => true,
            Err(e) if e.kind() == io::ErrorKind::NotFound => false,
            Err(e) => return Err(CacheError::storage(format!("removing {}", path.display()), e)),
        };

        let dir = self.slot_dir(key);
        match fs::remove_dir_all(&dir) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => warn!("Failed to remove {}: {}", dir.display(), e),
        }
        Ok(removed)
    }

    /// Keys of all records currently on disk.
    ///
    /// Records that cannot be parsed are skipped.
    pub fn keys(&self) -> Result<Vec<ResourceKey>> {
        let dir = self.meta_dir();
        let entries = fs::read_dir(&dir)
            .map_err(|e| CacheError::storage(format!("listing {}", dir.display()), e))?;

        let mut keys = Vec::new();
        for entry in entries {
            let path = entry
                .map_err(|e| CacheError::storage(format!("listing {}", dir.display()), e))?
                .path();
            if path.extension().is_some_and(|e| e == "json") {
                if let Ok(json) = fs::read_to_string(&path) {
                    if let Ok(record) = serde_json::from_str::<StoredRecord>(&json) {
                        keys.push(record.key);
                    }
                }
            }
        }
        Ok(keys)
    }

    /// Re-hash an entry's file and compare it with the record.
    pub fn verify(&self, entry: &CachedExternalResource) -> std::result::Result<(), Corruption> {
        self.check_length(entry)?;
        let (Some(path), Some(expected)) = (entry.cached_file(), entry.content_hash()) else {
            return Ok(());
        };
        let file = fs::File::open(path).map_err(|_| Corruption::FileMissing)?;
        let (actual, _) = ContentHash::of_reader(file).map_err(|_| Corruption::FileMissing)?;
        if actual != *expected {
            return Err(Corruption::HashMismatch);
        }
        Ok(())
    }

    fn check_length(&self, entry: &CachedExternalResource) -> std::result::Result<(), Corruption> {
        let Some(path) = entry.cached_file() else {
            return Ok(());
        };
        let actual = fs::metadata(path)
            .map_err(|_| Corruption::FileMissing)?
            .len();
        if actual != entry.content_length() {
            return Err(Corruption::LengthMismatch {
                recorded: entry.content_length(),
                actual,
            });
        }
        Ok(())
    }

    fn entry_from_record(&self, record: StoredRecord) -> Option<CachedExternalResource> {
        if record.missing {
            return Some(CachedExternalResource::missing(
                record.key,
                record.cached_at,
                record.metadata,
            ));
        }
        let hash = record.content_hash?;
        let file = record.file?;
        // File names are hex digests; anything else would escape the slot.
        if !file.chars().all(|c| c.is_ascii_hexdigit()) {
            return None;
        }
        let path = self.slot_dir(&record.key).join(file);
        Some(CachedExternalResource::stored(
            record.key,
            path,
            record.cached_at,
            record.content_length,
            hash,
            record.metadata,
        ))
    }
}

/// Start the retention window of a content file that just lost its record.
fn retire(path: &Path) {
    let touched = fs::File::options()
        .write(true)
        .open(path)
        .and_then(|file| file.set_modified(SystemTime::now()));
    if let Err(e) = touched {
        if e.kind() != io::ErrorKind::NotFound {
            warn!("Failed to retire {}: {}", path.display(), e);
        }
    }
}

/// Build the error value used to log a corrupt entry.
pub(crate) fn corrupt(key: &ResourceKey, corruption: &Corruption) -> CacheError {
    CacheError::CorruptEntry {
        key: key.to_string(),
        reason: corruption.to_string(),
    }
}
