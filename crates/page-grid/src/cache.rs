//! Read-through cache of extracted pages, keyed by document content
//!
//! Slide conversion and rasterization are slow, so repeated uploads of the
//! same bytes reuse the first extraction. For each content hash at most one
//! extraction runs at a time; concurrent requests for the same hash wait
//! for it. Failures are not stored, so a later request tries again.
//!
//! The cache holds at most `capacity` documents. Adding one more evicts
//! the least recently used document first.

use crate::constants::DEFAULT_CACHE_CAPACITY;
use crate::types::ExtractionError;
use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::OnceCell;

/// BLAKE3 digest of a document's raw bytes
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct ContentHash([u8; 32]);

impl ContentHash {
    pub fn of(bytes: &[u8]) -> Self {
        Self(*blake3::hash(bytes).as_bytes())
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl fmt::Display for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in &self.0 {
            write!(f, "{:02x}", byte)?;
        }
        Ok(())
    }
}

impl fmt::Debug for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ContentHash({})", self)
    }
}

struct Slot<P> {
    cell: Arc<OnceCell<Vec<P>>>,
    last_used: u64,
}

struct Entries<P> {
    slots: HashMap<ContentHash, Slot<P>>,
    clock: u64,
}

impl<P> Entries<P> {
    /// Evict least recently used slots until one more fits
    fn make_room(&mut self, capacity: usize) {
        while self.slots.len() >= capacity {
            let Some(oldest) = self
                .slots
                .iter()
                .min_by_key(|(_, slot)| slot.last_used)
                .map(|(key, _)| *key)
            else {
                break;
            };
            log::debug!("Evicting cached extraction {}", oldest);
            self.slots.remove(&oldest);
        }
    }
}

/// Extracted pages shared between requests for identical content.
pub struct ExtractionCache<P> {
    entries: Mutex<Entries<P>>,
    capacity: usize,
}

impl<P> Default for ExtractionCache<P> {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_CACHE_CAPACITY)
    }
}

impl<P> ExtractionCache<P> {
    /// A cache keeping at most `capacity` documents; 0 disables caching.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Mutex::new(Entries {
                slots: HashMap::new(),
                clock: 0,
            }),
            capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl<P: Clone> ExtractionCache<P> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the pages cached for `key`, running `extract` if none are.
    pub async fn get_or_extract<F, Fut>(
        &self,
        key: ContentHash,
        extract: F,
    ) -> Result<Vec<P>, ExtractionError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Vec<P>, ExtractionError>>,
    {
        if self.capacity == 0 {
            return extract().await;
        }

        let cell = {
            let mut guard = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
            let entries = &mut *guard;
            entries.clock += 1;
            if !entries.slots.contains_key(&key) {
                entries.make_room(self.capacity);
            }
            let slot = entries.slots.entry(key).or_insert_with(|| Slot {
                cell: Arc::default(),
                last_used: 0,
            });
            slot.last_used = entries.clock;
            Arc::clone(&slot.cell)
        };

        if let Some(pages) = cell.get() {
            log::debug!("Extraction cache hit for {}", key);
            return Ok(pages.clone());
        }

        let result = cell
            .get_or_try_init(|| {
                log::debug!("Extraction cache miss for {}", key);
                extract()
            })
            .await;

        match result {
            Ok(pages) => Ok(pages.clone()),
            Err(e) => {
                self.forget_failed(key, &cell);
                Err(e)
            }
        }
    }

    /// Drop the slot a failed extraction left behind, unless it was
    /// replaced or filled in the meantime.
    fn forget_failed(&self, key: ContentHash, cell: &Arc<OnceCell<Vec<P>>>) {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        let stale = entries
            .slots
            .get(&key)
            .is_some_and(|slot| Arc::ptr_eq(&slot.cell, cell) && !slot.cell.initialized());
        if stale {
            entries.slots.remove(&key);
        }
    }

    /// Number of documents with completed extractions
    pub fn len(&self) -> usize {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .slots
            .values()
            .filter(|slot| slot.cell.initialized())
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .slots
            .clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_hash_is_content_based() {
        assert_eq!(ContentHash::of(b"abc"), ContentHash::of(b"abc"));
        assert_ne!(ContentHash::of(b"abc"), ContentHash::of(b"abd"));
        assert_eq!(ContentHash::of(b"").to_string().len(), 64);
    }

    #[tokio::test]
    async fn test_second_request_is_served_from_cache() {
        let cache = ExtractionCache::<u32>::new();
        let calls = AtomicUsize::new(0);
        let counter = &calls;
        let key = ContentHash::of(b"doc");

        for _ in 0..3 {
            let pages = cache
                .get_or_extract(key, || async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Ok(vec![1, 2, 3])
                })
                .await
                .unwrap();
            assert_eq!(pages, vec![1, 2, 3]);
        }

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(cache.len(), 1);
    }

    #[tokio::test]
    async fn test_concurrent_requests_share_one_extraction() {
        let cache = ExtractionCache::<u32>::new();
        let calls = AtomicUsize::new(0);
        let counter = &calls;
        let key = ContentHash::of(b"deck");

        let extract = || async move {
            counter.fetch_add(1, Ordering::SeqCst);
            tokio::task::yield_now().await;
            Ok(vec![7])
        };

        let (a, b, c) = tokio::join!(
            cache.get_or_extract(key, extract),
            cache.get_or_extract(key, extract),
            cache.get_or_extract(key, extract),
        );

        assert_eq!(a.unwrap(), vec![7]);
        assert_eq!(b.unwrap(), vec![7]);
        assert_eq!(c.unwrap(), vec![7]);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_failures_are_retried() {
        let cache = ExtractionCache::<u32>::new();
        let key = ContentHash::of(b"flaky");

        let first = cache
            .get_or_extract(key, || async {
                Err(ExtractionError::ConversionFailed("boom".to_string()))
            })
            .await;
        assert!(first.is_err());
        assert!(cache.is_empty());
        assert!(cache.entries.lock().unwrap().slots.is_empty());

        let second = cache
            .get_or_extract(key, || async { Ok(vec![1]) })
            .await;
        assert_eq!(second.unwrap(), vec![1]);
    }

    #[tokio::test]
    async fn test_distinct_content_is_cached_separately() {
        let cache = ExtractionCache::<u32>::new();
        cache
            .get_or_extract(ContentHash::of(b"a"), || async { Ok(vec![1]) })
            .await
            .unwrap();
        let b = cache
            .get_or_extract(ContentHash::of(b"b"), || async { Ok(vec![2]) })
            .await
            .unwrap();

        assert_eq!(b, vec![2]);
        assert_eq!(cache.len(), 2);

        cache.clear();
        assert!(cache.is_empty());
    }

    async fn cache_numbers(cache: &ExtractionCache<u32>, name: &str, calls: &AtomicUsize) {
        cache
            .get_or_extract(ContentHash::of(name.as_bytes()), || async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok(vec![name.len() as u32])
            })
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_capacity_evicts_least_recently_used() {
        let cache = ExtractionCache::<u32>::with_capacity(2);
        let calls = AtomicUsize::new(0);

        cache_numbers(&cache, "a", &calls).await;
        cache_numbers(&cache, "b", &calls).await;
        // Touch "a" so "b" becomes the oldest
        cache_numbers(&cache, "a", &calls).await;
        cache_numbers(&cache, "c", &calls).await;

        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert_eq!(cache.len(), 2);

        // "a" and "c" are still cached, "b" was evicted
        cache_numbers(&cache, "a", &calls).await;
        cache_numbers(&cache, "c", &calls).await;
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        cache_numbers(&cache, "b", &calls).await;
        assert_eq!(calls.load(Ordering::SeqCst), 4);
        assert_eq!(cache.len(), 2);
    }

    #[tokio::test]
    async fn test_many_documents_never_exceed_capacity() {
        let cache = ExtractionCache::<u32>::with_capacity(3);
        let calls = AtomicUsize::new(0);

        for n in 0..20 {
            cache_numbers(&cache, &format!("doc-{}", n), &calls).await;
            assert!(cache.len() <= 3);
        }
        assert_eq!(cache.len(), 3);
        assert_eq!(cache.entries.lock().unwrap().slots.len(), 3);
    }

    #[tokio::test]
    async fn test_zero_capacity_disables_caching() {
        let cache = ExtractionCache::<u32>::with_capacity(0);
        let calls = AtomicUsize::new(0);

        cache_numbers(&cache, "a", &calls).await;
        cache_numbers(&cache, "a", &calls).await;

        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert!(cache.is_empty());
    }
}
