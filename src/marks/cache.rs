//! Process-wide cache of loaded mark arrays.
//!
//! Each key owns a slot with a one-shot cell. The map lock is only held to
//! find or create a slot, so loads of different keys run in parallel while
//! concurrent loads of the same key collapse into a single execution of the
//! load function.

use std::{collections::HashMap, fmt, path::Path, sync::Arc};

use log::Level;
use once_cell::sync::OnceCell;
use parking_lot::Mutex;
use sha2::{Digest, Sha256};

use super::{
    mark::MarksInCompressedFile,
    metrics::{CacheCounters, MarkCacheMetrics},
};
use crate::logging::granule_log;

/// Cache key derived from a mark file path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MarkCacheKey(u128);

impl MarkCacheKey {
    /// Raw 128-bit digest.
    pub fn as_u128(&self) -> u128 {
        self.0
    }
}

impl fmt::Display for MarkCacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:032x}", self.0)
    }
}

#[derive(Default)]
struct Slot {
    marks: OnceCell<Arc<MarksInCompressedFile>>,
}

/// Shared, thread-safe store of mark arrays keyed by file path digest.
///
/// Eviction is driven from outside through [`MarkCache::remove`] and
/// [`MarkCache::reset`]; entries already handed out stay alive for as long
/// as their holders keep them.
#[derive(Default)]
pub struct MarkCache {
    slots: Mutex<HashMap<MarkCacheKey, Arc<Slot>>>,
    counters: CacheCounters,
}

impl MarkCache {
    /// Empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Key for the mark file at `path`: the first 128 bits of its SHA-256.
    ///
    /// Slots store only the key, not the path, so two paths sharing a digest
    /// would share an entry. Collisions are not detected.
    pub fn hash(&self, path: impl AsRef<Path>) -> MarkCacheKey {
        key_for_path(path.as_ref())
    }

    /// Cached marks for `key`, without loading or inserting anything.
    pub fn get(&self, key: &MarkCacheKey) -> Option<Arc<MarksInCompressedFile>> {
        let marks = self
            .slots
            .lock()
            .get(key)
            .and_then(|slot| slot.marks.get().cloned());
        match marks {
            Some(_) => self.counters.record_hit(),
            None => self.counters.record_miss(),
        }
        marks
    }

    /// Cached marks for `key`, running `load` on a miss.
    ///
    /// Among concurrent callers for the same key exactly one runs its `load`;
    /// the others block until it finishes and receive the same array. If the
    /// load fails its caller gets the error, the lookup counts as a miss,
    /// nothing is cached, and a blocked caller (if any) runs its own load
    /// next.
    pub fn get_or_set<F, E>(&self, key: MarkCacheKey, load: F) -> Result<Arc<MarksInCompressedFile>, E>
    where
        F: FnOnce() -> Result<Arc<MarksInCompressedFile>, E>,
    {
        let slot = self.slot(key);
        if let Some(marks) = slot.marks.get() {
            self.counters.record_hit();
            return Ok(marks.clone());
        }

        let mut loaded_here = false;
        let loaded = slot.marks.get_or_try_init(|| {
            loaded_here = true;
            self.counters.record_load();
            granule_log!(Level::Trace, "mark_cache_miss_load", "key={}", key);
            load()
        });

        match loaded {
            Ok(marks) => {
                if loaded_here {
                    self.counters.record_miss();
                } else {
                    self.counters.record_hit();
                }
                Ok(marks.clone())
            }
            Err(err) => {
                self.counters.record_miss();
                self.discard_empty_slot(key, &slot);
                Err(err)
            }
        }
    }

    /// Drop the entry for `key`, returning it if it was loaded.
    pub fn remove(&self, key: &MarkCacheKey) -> Option<Arc<MarksInCompressedFile>> {
        self.slots
            .lock()
            .remove(key)
            .and_then(|slot| slot.marks.get().cloned())
    }

    /// Drop every entry.
    pub fn reset(&self) {
        self.slots.lock().clear();
    }

    /// Number of loaded entries.
    pub fn len(&self) -> usize {
        self.slots
            .lock()
            .values()
            .filter(|slot| slot.marks.get().is_some())
            .count()
    }

    /// Whether no entry is loaded.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Approximate bytes held by loaded entries.
    pub fn size_in_bytes(&self) -> usize {
        self.slots
            .lock()
            .values()
            .filter_map(|slot| slot.marks.get())
            .map(|marks| marks.size_in_bytes())
            .sum()
    }

    /// Counter snapshot.
    pub fn metrics(&self) -> MarkCacheMetrics {
        self.counters.snapshot()
    }

    fn slot(&self, key: MarkCacheKey) -> Arc<Slot> {
        self.slots.lock().entry(key).or_default().clone()
    }

    /// Drop `slot` from the map after a failed load, unless it was replaced,
    /// got filled, or another caller is still waiting on it.
    fn discard_empty_slot(&self, key: MarkCacheKey, slot: &Arc<Slot>) {
        let mut slots = self.slots.lock();
        let unused = slots.get(&key).is_some_and(|current| {
            Arc::ptr_eq(current, slot)
                && current.marks.get().is_none()
                && Arc::strong_count(slot) == 2
        });
        if unused {
            slots.remove(&key);
        }
    }
}

impl fmt::Debug for MarkCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MarkCache")
            .field("entries", &self.len())
            .field("metrics", &self.metrics())
            .finish()
    }
}

pub(crate) fn key_for_path(path: &Path) -> MarkCacheKey {
    let digest = Sha256::digest(path.as_os_str().as_encoded_bytes());
    let mut prefix = [0u8; 16];
    prefix.copy_from_slice(&digest[..16]);
    MarkCacheKey(u128::from_be_bytes(prefix))
}
