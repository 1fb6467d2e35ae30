//! Per-key locking for cache slots.
//!
//! Every key gets its own reader/writer lock. Readers of a settled slot share
//! it; a writer excludes everyone else on that slot. Keys never contend with
//! each other.
//!
//! Two layers are stacked:
//!
//! - an in-process lock, held in a map of weak references so that slots
//!   nobody is using can be dropped, and
//! - an advisory `flock(2)` on `<root>/.locks/<slot>.lock` so that processes
//!   sharing the cache directory also exclude each other. On non-Unix
//!   platforms this layer is a no-op.

use std::collections::HashMap;
use std::fs::{self, File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError, Weak};

#[cfg(unix)]
use std::os::unix::io::AsRawFd;

use super::key::ResourceKey;
use crate::error::{CacheError, Result};

/// Subdirectory within the cache for lock files.
const LOCKS_SUBDIR: &str = ".locks";

/// Map size at which dead slots are swept for the first time.
const MIN_PRUNE_AT: usize = 64;

/// How a slot is held.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockMode {
    /// Many readers at once, no writer.
    Shared,
    /// One writer, nobody else.
    Exclusive,
}

#[derive(Debug, Default)]
struct SlotState {
    readers: usize,
    writer: bool,
    waiting_writers: usize,
}

/// In-process lock for one slot.
#[derive(Debug, Default)]
struct Slot {
    state: Mutex<SlotState>,
    released: Condvar,
}

impl Slot {
    fn state(&self) -> MutexGuard<'_, SlotState> {
        // The state is a few counters that are always left consistent.
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn acquire(&self, mode: LockMode) {
        let mut state = self.state();
        match mode {
            LockMode::Shared => {
                // Waiting writers go first so readers cannot starve them.
                while state.writer || state.waiting_writers > 0 {
                    state = self
                        .released
                        .wait(state)
                        .unwrap_or_else(PoisonError::into_inner);
                }
                state.readers += 1;
            }
            LockMode::Exclusive => {
                state.waiting_writers += 1;
                while state.writer || state.readers > 0 {
                    state = self
                        .released
                        .wait(state)
                        .unwrap_or_else(PoisonError::into_inner);
                }
                state.waiting_writers -= 1;
                state.writer = true;
            }
        }
    }

    fn release(&self, mode: LockMode) {
        let mut state = self.state();
        match mode {
            LockMode::Shared => state.readers = state.readers.saturating_sub(1),
            LockMode::Exclusive => state.writer = false,
        }
        drop(state);
        self.released.notify_all();
    }
}

#[derive(Debug)]
struct SlotMap {
    slots: HashMap<String, Weak<Slot>>,
    prune_at: usize,
}

/// Lock manager for all slots of one cache directory.
#[derive(Debug)]
pub struct SlotLocks {
    locks_dir: PathBuf,
    map: Mutex<SlotMap>,
}

impl SlotLocks {
    /// Create a lock manager for the cache rooted at `cache_root`.
    pub fn new(cache_root: &Path) -> Self {
        Self {
            locks_dir: cache_root.join(LOCKS_SUBDIR),
            map: Mutex::new(SlotMap {
                slots: HashMap::new(),
                prune_at: MIN_PRUNE_AT,
            }),
        }
    }

    /// Acquire a shared (read) lock on a key's slot.
    pub fn shared(&self, key: &ResourceKey) -> Result<SlotGuard> {
        self.acquire(key, LockMode::Shared)
    }

    /// Acquire an exclusive (write) lock on a key's slot.
    pub fn exclusive(&self, key: &ResourceKey) -> Result<SlotGuard> {
        self.acquire(key, LockMode::Exclusive)
    }

    /// Acquire a lock, blocking until it is available.
    ///
    /// The lock is not reentrant: acquiring an exclusive lock on a slot the
    /// calling thread already holds deadlocks.
    pub fn acquire(&self, key: &ResourceKey, mode: LockMode) -> Result<SlotGuard> {
        let slot_name = key.slot_name();
        let slot = self.slot(&slot_name);
        slot.acquire(mode);

        // From here on the guard releases the in-process lock on any exit.
        let mut guard = SlotGuard {
            slot,
            mode,
            file: None,
        };
        guard.file = Some(self.lock_file(&slot_name, mode)?);
        Ok(guard)
    }

    /// Number of slots currently tracked, after dropping unused ones.
    pub fn tracked_slots(&self) -> usize {
        let mut map = self.map();
        map.slots.retain(|_, slot| slot.strong_count() > 0);
        map.slots.len()
    }

    fn map(&self) -> MutexGuard<'_, SlotMap> {
        self.map.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn slot(&self, slot_name: &str) -> Arc<Slot> {
        let mut map = self.map();
        if let Some(slot) = map.slots.get(slot_name).and_then(Weak::upgrade) {
            return slot;
        }

        let slot = Arc::new(Slot::default());
        map.slots
            .insert(slot_name.to_string(), Arc::downgrade(&slot));

        if map.slots.len() >= map.prune_at {
            map.slots.retain(|_, slot| slot.strong_count() > 0);
            map.prune_at = (map.slots.len() * 2).max(MIN_PRUNE_AT);
        }
        slot
    }

    fn lock_file(&self, slot_name: &str, mode: LockMode) -> Result<File> {
        fs::create_dir_all(&self.locks_dir).map_err(|e| {
            CacheError::storage(format!("creating {}", self.locks_dir.display()), e)
        })?;

        let path = self.locks_dir.join(format!("{}.lock", slot_name));
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&path)
            .map_err(|e| CacheError::storage(format!("opening {}", path.display()), e))?;

        flock(&file, mode)
            .map_err(|e| CacheError::storage(format!("locking {}", path.display()), e))?;
        Ok(file)
    }
}

#[cfg(unix)]
fn flock(file: &File, mode: LockMode) -> io::Result<()> {
    let op = match mode {
        LockMode::Shared => libc::LOCK_SH,
        LockMode::Exclusive => libc::LOCK_EX,
    };
    loop {
        // SAFETY: `file` is an open file owned by the caller for the whole
        // call, so its descriptor is valid.
        let result = unsafe { libc::flock(file.as_raw_fd(), op) };
        if result == 0 {
            return Ok(());
        }
        let err = io::Error::last_os_error();
        if err.kind() != io::ErrorKind::Interrupted {
            return Err(err);
        }
    }
}

#[cfg(not(unix))]
fn flock(_file: &File, _mode: LockMode) -> io::Result<()> {
    // Cross-process locking not supported; in-process locking still applies.
    Ok(())
}

/// Held lock on one slot. Released when dropped.
#[derive(Debug)]
pub struct SlotGuard {
    slot: Arc<Slot>,
    mode: LockMode,
    file: Option<File>,
}

impl SlotGuard {
    /// Mode the slot is held in.
    pub fn mode(&self) -> LockMode {
        self.mode
    }
}

impl Drop for SlotGuard {
    fn drop(&mut self) {
        // Closing the descriptor releases the flock.
        drop(self.file.take());
        self.slot.release(self.mode);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::Barrier;
    use std::thread;
    use std::time::Duration;
    use tempfile::TempDir;

    #[test]
    fn acquire_creates_lock_file() {
        let temp = TempDir::new().unwrap();
        let locks = SlotLocks::new(temp.path());
        let key = ResourceKey::new("https://repo/a.jar");

        let _guard = locks.exclusive(&key).unwrap();

        let lock_path = temp
            .path()
            .join(LOCKS_SUBDIR)
            .join(format!("{}.lock", key.slot_name()));
        assert!(lock_path.exists(), "lock file should be created");
    }

    #[test]
    fn multiple_shared_locks_can_coexist() {
        let temp = TempDir::new().unwrap();
        let locks = SlotLocks::new(temp.path());
        let key = ResourceKey::new("k");

        let first = locks.shared(&key).unwrap();
        let second = locks.shared(&key).unwrap();

        assert_eq!(first.mode(), LockMode::Shared);
        drop(first);
        drop(second);
    }

    #[test]
    fn different_keys_do_not_block() {
        let temp = TempDir::new().unwrap();
        let locks = SlotLocks::new(temp.path());

        let a = locks.exclusive(&ResourceKey::new("a")).unwrap();
        let b = locks.exclusive(&ResourceKey::new("b")).unwrap();

        drop(a);
        drop(b);
    }

    #[test]
    fn writer_excludes_reader() {
        let temp = TempDir::new().unwrap();
        let locks = Arc::new(SlotLocks::new(temp.path()));
        let key = ResourceKey::new("k");
        let read_done = Arc::new(AtomicBool::new(false));

        let writer = locks.exclusive(&key).unwrap();

        let handle = {
            let locks = Arc::clone(&locks);
            let key = key.clone();
            let read_done = Arc::clone(&read_done);
            thread::spawn(move || {
                let _reader = locks.shared(&key).unwrap();
                read_done.store(true, Ordering::SeqCst);
            })
        };

        thread::sleep(Duration::from_millis(100));
        assert!(!read_done.load(Ordering::SeqCst), "reader must wait for writer");

        drop(writer);
        handle.join().unwrap();
        assert!(read_done.load(Ordering::SeqCst));
    }

    #[test]
    fn writers_are_serialized() {
        let temp = TempDir::new().unwrap();
        let locks = Arc::new(SlotLocks::new(temp.path()));
        let key = ResourceKey::new("k");
        let inside = Arc::new(AtomicUsize::new(0));
        let barrier = Arc::new(Barrier::new(4));

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let locks = Arc::clone(&locks);
                let key = key.clone();
                let inside = Arc::clone(&inside);
                let barrier = Arc::clone(&barrier);
                thread::spawn(move || {
                    barrier.wait();
                    let _guard = locks.exclusive(&key).unwrap();
                    assert_eq!(inside.fetch_add(1, Ordering::SeqCst), 0);
                    thread::sleep(Duration::from_millis(10));
                    inside.fetch_sub(1, Ordering::SeqCst);
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }
    }

    #[test]
    fn unused_slots_are_dropped() {
        let temp = TempDir::new().unwrap();
        let locks = SlotLocks::new(temp.path());

        for i in 0..200 {
            let _guard = locks.shared(&ResourceKey::new(format!("key-{}", i))).unwrap();
        }
        let held = locks.exclusive(&ResourceKey::new("held")).unwrap();

        assert_eq!(locks.tracked_slots(), 1);
        drop(held);
        assert_eq!(locks.tracked_slots(), 0);
    }
}
