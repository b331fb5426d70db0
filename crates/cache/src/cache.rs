use crate::hash::cache_key;
use crate::snapshot::{read_snapshot, write_snapshot, SnapshotLoad, SnapshotSave};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::{HashMap, VecDeque};
use std::path::Path;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Default bound used by [`DriftCache::default`].
pub const DEFAULT_MAX_ENTRIES: usize = 1000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub size: usize,
    pub max_size: usize,
}

/// Size-bounded memo table with strict FIFO eviction.
///
/// Reads never reorder entries. The lock is only held around map operations, never around
/// the compute closure, so a slow miss does not block unrelated lookups. Two threads missing
/// on the same key may both compute; the last write is kept.
pub struct DriftCache<V> {
    state: Mutex<CacheState<V>>,
}

struct CacheState<V> {
    map: HashMap<String, V>,
    order: VecDeque<String>,
    max_size: usize,
}

impl<V> CacheState<V> {
    fn insert(&mut self, key: String, value: V) {
        if let Some(slot) = self.map.get_mut(&key) {
            *slot = value;
            return;
        }
        if self.max_size == 0 {
            return;
        }
        while self.order.len() >= self.max_size {
            let Some(oldest) = self.order.pop_front() else {
                break;
            };
            self.map.remove(&oldest);
        }
        self.order.push_back(key.clone());
        self.map.insert(key, value);
    }
}

impl<V: Clone> DriftCache<V> {
    pub fn new(max_size: usize) -> Self {
        Self {
            state: Mutex::new(CacheState {
                map: HashMap::new(),
                order: VecDeque::new(),
                max_size,
            }),
        }
    }

    /// Cache key for a drift check. See [`cache_key`].
    pub fn key(&self, context: &str, current_doc: &str, model_id: &str) -> String {
        cache_key(context, current_doc, model_id)
    }

    /// Return the cached value for `key`, or run `compute` and remember its result.
    ///
    /// Errors from `compute` are returned as-is and nothing is stored.
    pub fn get_or_compute<E, F>(&self, key: &str, compute: F) -> Result<V, E>
    where
        F: FnOnce() -> Result<V, E>,
    {
        let cached = self.lock().map.get(key).cloned();
        if let Some(hit) = cached {
            return Ok(hit);
        }

        let value = compute()?;
        self.lock().insert(key.to_string(), value.clone());
        Ok(value)
    }

    pub fn get(&self, key: &str) -> Option<V> {
        self.lock().map.get(key).cloned()
    }

    pub fn insert(&self, key: impl Into<String>, value: V) {
        self.lock().insert(key.into(), value);
    }

    pub fn contains(&self, key: &str) -> bool {
        self.lock().map.contains_key(key)
    }

    /// Change the bound for future inserts. Existing entries stay until the next insert.
    pub fn set_max_size(&self, max_size: usize) {
        self.lock().max_size = max_size;
    }

    pub fn clear(&self) {
        let mut state = self.lock();
        state.map.clear();
        state.order.clear();
    }

    pub fn stats(&self) -> CacheStats {
        let state = self.lock();
        CacheStats {
            size: state.map.len(),
            max_size: state.max_size,
        }
    }

    pub fn len(&self) -> usize {
        self.lock().map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().map.is_empty()
    }

    /// Keys in insertion order, oldest first.
    pub fn keys(&self) -> Vec<String> {
        self.lock().order.iter().cloned().collect()
    }

    fn lock(&self) -> MutexGuard<'_, CacheState<V>> {
        // Every mutation leaves the map and order consistent between statements.
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn ordered_entries(&self) -> Vec<(String, V)> {
        let state = self.lock();
        state
            .order
            .iter()
            .filter_map(|key| state.map.get(key).map(|v| (key.clone(), v.clone())))
            .collect()
    }
}

impl<V: Clone + Serialize> DriftCache<V> {
    /// Write a versioned JSON snapshot via temp file + rename. Never fails loudly.
    pub fn save_to_disk(&self, path: &Path) -> SnapshotSave {
        let entries = self.ordered_entries();
        write_snapshot(path, &entries)
    }
}

impl<V: Clone + DeserializeOwned> DriftCache<V> {
    /// Insert snapshot entries in on-disk order. Anything other than
    /// [`SnapshotLoad::Loaded`] leaves the cache untouched.
    pub fn load_from_disk(&self, path: &Path) -> SnapshotLoad {
        let entries = match read_snapshot::<V>(path) {
            Ok(entries) => entries,
            Err(outcome) => return outcome,
        };
        let count = entries.len();
        let mut state = self.lock();
        for (key, value) in entries {
            state.insert(key, value);
        }
        SnapshotLoad::Loaded { entries: count }
    }
}

impl<V: Clone> Default for DriftCache<V> {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_ENTRIES)
    }
}

impl<V> std::fmt::Debug for DriftCache<V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        f.debug_struct("DriftCache")
            .field("size", &state.map.len())
            .field("max_size", &state.max_size)
            .finish()
    }
}
