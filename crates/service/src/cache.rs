//! Bounded cache of files opened in the backend
//!
//! Every entry corresponds to a file the backend holds open. Evicting an
//! entry runs the close callback given at construction before the slot is
//! reused, so the two views never drift apart.

use lru::LruCache;
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Callback run for every entry leaving the cache
pub type EvictFn<V> = Box<dyn FnMut(&Path, V) + Send>;

/// LRU map from absolute path to an opened-file value
pub struct OpenFileCache<V> {
    entries: LruCache<PathBuf, V>,
    on_evict: EvictFn<V>,
}

impl<V> OpenFileCache<V> {
    /// Create a cache holding at most `capacity` files
    pub fn new(capacity: NonZeroUsize, on_evict: EvictFn<V>) -> Self {
        Self {
            entries: LruCache::new(capacity),
            on_evict,
        }
    }

    /// Check if `path` is cached, without touching recency
    pub fn contains(&self, path: &Path) -> bool {
        self.entries.contains(path)
    }

    /// Get the value for `path` and mark it most recently used
    pub fn get(&mut self, path: &Path) -> Option<&V> {
        self.entries.get(path)
    }

    /// Get the value for `path` mutably and mark it most recently used
    pub fn get_mut(&mut self, path: &Path) -> Option<&mut V> {
        self.entries.get_mut(path)
    }

    /// Insert or replace the value for `path`
    ///
    /// Replacing an existing value does not run the callback. Going over
    /// capacity evicts the least recently used entry through it.
    pub fn insert(&mut self, path: PathBuf, value: V) {
        let key = path.clone();
        if let Some((evicted_path, evicted)) = self.entries.push(path, value) {
            if evicted_path != key {
                debug!("Evicting open file: {}", evicted_path.display());
                (self.on_evict)(&evicted_path, evicted);
            }
        }
    }

    /// Remove `path`, running the callback
    pub fn remove(&mut self, path: &Path) -> bool {
        match self.entries.pop_entry(path) {
            Some((path, value)) => {
                (self.on_evict)(&path, value);
                true
            }
            None => false,
        }
    }

    /// Remove every entry, least recently used first
    pub fn clear(&mut self) {
        while let Some((path, value)) = self.entries.pop_lru() {
            (self.on_evict)(&path, value);
        }
    }

    /// Cached paths, most recently used first
    pub fn paths(&self) -> impl Iterator<Item = &Path> {
        self.entries.iter().map(|(path, _)| path.as_path())
    }

    /// Number of cached files
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if nothing is cached
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Maximum number of cached files
    pub fn capacity(&self) -> usize {
        self.entries.cap().get()
    }
}
