//! Per-backend store of handles and their results.

use rustc_hash::FxHashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::debug;

use crate::handle::ResultHandle;
use crate::result::BackendResult;
use crate::status::CircuitStatus;

/// Default number of entries kept before completed ones are evicted.
pub const DEFAULT_MAX_ENTRIES: usize = 1024;

/// What a backend remembers about one handle.
#[derive(Debug, Clone, Default)]
pub struct CacheEntry {
    /// Result, once known.
    pub result: Option<BackendResult>,
    /// Last status seen.
    pub status: Option<CircuitStatus>,
    seq: u64,
}

#[derive(Debug, Default)]
struct Inner {
    entries: FxHashMap<ResultHandle, CacheEntry>,
    next_seq: u64,
}

/// Shared, cloneable result cache.
#[derive(Debug, Clone)]
pub struct ResultCache {
    inner: Arc<Mutex<Inner>>,
    max_entries: usize,
}

impl Default for ResultCache {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_ENTRIES)
    }
}

impl ResultCache {
    /// Create a cache that starts evicting above `max_entries`.
    pub fn new(max_entries: usize) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner::default())),
            max_entries,
        }
    }

    /// Register a handle. Existing entries are kept.
    pub async fn insert(&self, handle: ResultHandle) {
        let mut inner = self.inner.lock().await;
        if !inner.entries.contains_key(&handle) {
            let seq = inner.next_seq;
            inner.next_seq += 1;
            inner.entries.insert(
                handle,
                CacheEntry {
                    seq,
                    ..CacheEntry::default()
                },
            );
            Self::evict(&mut inner, self.max_entries);
        }
    }

    /// Store a result, registering the handle if needed.
    pub async fn set_result(&self, handle: &ResultHandle, result: BackendResult) {
        self.insert(handle.clone()).await;
        let mut inner = self.inner.lock().await;
        if let Some(entry) = inner.entries.get_mut(handle) {
            entry.result = Some(result);
        }
    }

    /// Store the latest status of a handle.
    pub async fn set_status(&self, handle: &ResultHandle, status: CircuitStatus) {
        self.insert(handle.clone()).await;
        let mut inner = self.inner.lock().await;
        if let Some(entry) = inner.entries.get_mut(handle) {
            entry.status = Some(status);
        }
    }

    /// Cached result of a handle.
    pub async fn result(&self, handle: &ResultHandle) -> Option<BackendResult> {
        let inner = self.inner.lock().await;
        inner.entries.get(handle).and_then(|e| e.result.clone())
    }

    /// Check whether a handle is known.
    pub async fn contains(&self, handle: &ResultHandle) -> bool {
        self.inner.lock().await.entries.contains_key(handle)
    }

    /// Remove and return a handle's entry.
    pub async fn remove(&self, handle: &ResultHandle) -> Option<CacheEntry> {
        self.inner.lock().await.entries.remove(handle)
    }

    /// Forget everything.
    pub async fn clear(&self) {
        self.inner.lock().await.entries.clear();
    }

    /// Number of entries.
    pub async fn len(&self) -> usize {
        self.inner.lock().await.entries.len()
    }

    /// Check whether the cache is empty.
    pub async fn is_empty(&self) -> bool {
        self.inner.lock().await.entries.is_empty()
    }

    fn evict(inner: &mut Inner, max_entries: usize) {
        let excess = inner.entries.len().saturating_sub(max_entries);
        if excess == 0 {
            return;
        }
        let mut completed: Vec<(u64, ResultHandle)> = inner
            .entries
            .iter()
            .filter(|(_, e)| e.result.is_some())
            .map(|(h, e)| (e.seq, h.clone()))
            .collect();
        completed.sort_unstable_by_key(|(seq, _)| *seq);
        for (_, handle) in completed.into_iter().take(excess) {
            inner.entries.remove(&handle);
        }
        debug!(remaining = inner.entries.len(), "evicted completed results");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handle::HandleItem;
    use crate::result::{Counts, Outcome};

    fn handle(id: &str) -> ResultHandle {
        ResultHandle::new([HandleItem::from(id)])
    }

    fn result() -> BackendResult {
        BackendResult::from_counts([(Outcome::zeros(1), 1)].into_iter().collect::<Counts>())
    }

    #[tokio::test]
    async fn test_set_and_pop() {
        let cache = ResultCache::default();
        cache.insert(handle("a")).await;
        assert!(cache.result(&handle("a")).await.is_none());
        cache.set_result(&handle("a"), result()).await;
        assert_eq!(cache.result(&handle("a")).await, Some(result()));
        let entry = cache.remove(&handle("a")).await.unwrap();
        assert!(entry.result.is_some());
        assert!(cache.is_empty().await);
    }

    #[tokio::test]
    async fn test_evicts_oldest_completed_only() {
        let cache = ResultCache::new(2);
        cache.set_result(&handle("done-1"), result()).await;
        cache.insert(handle("pending")).await;
        cache.set_result(&handle("done-2"), result()).await;
        assert_eq!(cache.len().await, 2);
        assert!(!cache.contains(&handle("done-1")).await);
        assert!(cache.contains(&handle("pending")).await);

        cache.insert(handle("pending-2")).await;
        assert!(!cache.contains(&handle("done-2")).await);
        cache.insert(handle("pending-3")).await;
        assert_eq!(cache.len().await, 3);
    }
}
