//! Query result cache with tag invalidation and LRU eviction.

use std::any::Any;
use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockWriteGuard};

use tracing::debug;

use super::tag::{CacheKey, Tag};
use crate::error::ErrorInfo;

type CachedValue = Arc<dyn Any + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryStatus {
    /// A request is in flight.
    Fetching,
    Fresh,
    /// Invalidated; the next read refetches.
    Stale,
    /// The last fetch failed; earlier data, if any, is kept.
    Failed,
}

/// Point-in-time view of one cache entry.
#[derive(Debug, Clone, PartialEq)]
pub struct CachedQuery<T> {
    pub data: Option<T>,
    pub status: EntryStatus,
    pub error: Option<ErrorInfo>,
}

struct CacheEntry {
    data: Option<CachedValue>,
    status: EntryStatus,
    error: Option<ErrorInfo>,
    tags: Vec<Tag>,
    generation: u64,
    last_accessed: u64,
}

struct CacheInner {
    entries: HashMap<CacheKey, CacheEntry>,
    capacity: usize,
    clock: u64,
}

impl CacheInner {
    fn tick(&mut self) -> u64 {
        self.clock += 1;
        self.clock
    }

    fn evict_for_insert(&mut self) {
        if self.entries.len() < self.capacity {
            return;
        }
        if let Some(lru_key) = self
            .entries
            .iter()
            .min_by_key(|(_, e)| e.last_accessed)
            .map(|(k, _)| k.clone())
        {
            debug!(key = %lru_key, "Evicting least recently used cache entry");
            self.entries.remove(&lru_key);
        }
    }
}

/// Shared store of query results keyed by [`CacheKey`].
///
/// Each entry carries a generation counter. Invalidation bumps it, so a
/// fetch that was already in flight lands as `Stale` rather than `Fresh`.
#[derive(Clone)]
pub struct QueryCache {
    inner: Arc<RwLock<CacheInner>>,
}

impl QueryCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: Arc::new(RwLock::new(CacheInner {
                entries: HashMap::new(),
                capacity: capacity.max(1),
                clock: 0,
            })),
        }
    }

    /// Read an entry and mark it recently used.
    ///
    /// Data stored under a different type reads as absent.
    pub fn lookup<T>(&self, key: &CacheKey) -> Option<CachedQuery<T>>
    where
        T: Clone + Send + Sync + 'static,
    {
        let mut inner = self.write();
        let now = inner.tick();
        let entry = inner.entries.get_mut(key)?;
        entry.last_accessed = now;
        Some(CachedQuery {
            data: entry
                .data
                .as_ref()
                .and_then(|data| data.downcast_ref::<T>())
                .cloned(),
            status: entry.status,
            error: entry.error.clone(),
        })
    }

    /// Mark `key` as fetching and return the generation the result must
    /// match to be stored as fresh.
    pub fn begin_fetch(&self, key: &CacheKey) -> u64 {
        let mut inner = self.write();
        let now = inner.tick();
        if let Some(entry) = inner.entries.get_mut(key) {
            entry.status = EntryStatus::Fetching;
            entry.last_accessed = now;
            return entry.generation;
        }
        inner.evict_for_insert();
        inner.entries.insert(
            key.clone(),
            CacheEntry {
                data: None,
                status: EntryStatus::Fetching,
                error: None,
                tags: Vec::new(),
                generation: 0,
                last_accessed: now,
            },
        );
        0
    }

    /// Store a successful result.
    ///
    /// An entry evicted (or cleared) while its fetch was in flight lost any
    /// invalidation that happened meanwhile, so it comes back `Stale`.
    pub fn complete<T>(&self, key: &CacheKey, generation: u64, data: T, tags: Vec<Tag>)
    where
        T: Send + Sync + 'static,
    {
        let mut inner = self.write();
        let now = inner.tick();
        let recreated = !inner.entries.contains_key(key);
        if recreated {
            inner.evict_for_insert();
        }
        let entry = inner.entries.entry(key.clone()).or_insert(CacheEntry {
            data: None,
            status: EntryStatus::Fetching,
            error: None,
            tags: Vec::new(),
            generation,
            last_accessed: now,
        });
        entry.status = if !recreated && entry.generation == generation {
            EntryStatus::Fresh
        } else {
            EntryStatus::Stale
        };
        entry.data = Some(Arc::new(data));
        entry.error = None;
        entry.tags = tags;
        entry.last_accessed = now;
        debug!(key = %key, status = ?entry.status, "Cached query result");
    }

    /// Record a failed fetch, keeping previous data.
    pub fn fail(&self, key: &CacheKey, error: ErrorInfo) {
        let mut inner = self.write();
        if let Some(entry) = inner.entries.get_mut(key) {
            entry.status = EntryStatus::Failed;
            entry.error = Some(error);
        }
    }

    /// Stale every entry that provided a tag matched by `tags`. Returns the
    /// number of entries affected.
    pub fn invalidate(&self, tags: &[Tag]) -> usize {
        if tags.is_empty() {
            return 0;
        }
        let mut inner = self.write();
        let mut count = 0;
        for (key, entry) in inner.entries.iter_mut() {
            let hit = entry
                .tags
                .iter()
                .any(|provided| tags.iter().any(|tag| tag.invalidates(provided)));
            if hit {
                entry.generation += 1;
                if entry.status != EntryStatus::Fetching {
                    entry.status = EntryStatus::Stale;
                }
                count += 1;
                debug!(key = %key, "Invalidated cache entry");
            }
        }
        count
    }

    pub fn remove(&self, key: &CacheKey) -> bool {
        self.write().entries.remove(key).is_some()
    }

    pub fn clear(&self) {
        self.write().entries.clear();
    }

    pub fn len(&self) -> usize {
        self.inner
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .entries
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn write(&self) -> RwLockWriteGuard<'_, CacheInner> {
        self.inner
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Default for QueryCache {
    fn default() -> Self {
        Self::new(crate::config::DEFAULT_CACHE_CAPACITY)
    }
}

impl std::fmt::Debug for QueryCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueryCache").field("len", &self.len()).finish()
    }
}
