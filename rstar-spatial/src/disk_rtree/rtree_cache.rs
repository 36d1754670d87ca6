//! LRU cache for R*-tree pages.
//!
//! The cache holds nodes exactly as they were last loaded from or committed
//! to the store. Pages are only brought in on first access; nothing is
//! preloaded. Nodes are shared as `Arc<Node>` so a search can hold on to a
//! page while the cache evicts it.

use std::num::NonZeroUsize;
use std::sync::Arc;

use lru::LruCache;

use super::rtree_types::{Node, PageId};

/// LRU cache for R*-tree pages
pub struct PageCache {
    pages: LruCache<PageId, Arc<Node>>,
}

impl PageCache {
    /// Create a new page cache with specified maximum size
    pub fn new(max_pages: usize) -> Self {
        let capacity = NonZeroUsize::new(max_pages).unwrap_or(NonZeroUsize::MIN);
        Self {
            pages: LruCache::new(capacity),
        }
    }

    /// Get a page from cache, updating LRU order.
    /// Returns None if page is not in cache (must be loaded from the store).
    pub fn get(&mut self, page_id: PageId) -> Option<Arc<Node>> {
        self.pages.get(&page_id).cloned()
    }

    /// Insert or replace a page, evicting the least recently used one if the
    /// cache is full. Returns the id of the evicted page.
    pub fn insert(&mut self, page_id: PageId, node: Arc<Node>) -> Option<PageId> {
        match self.pages.push(page_id, node) {
            Some((evicted, _)) if evicted != page_id => Some(evicted),
            _ => None,
        }
    }

    /// Remove a page from cache
    pub fn remove(&mut self, page_id: PageId) -> Option<Arc<Node>> {
        self.pages.pop(&page_id)
    }

    /// Drop every cached page
    pub fn clear(&mut self) {
        self.pages.clear();
    }

    /// Get number of cached pages
    pub fn len(&self) -> usize {
        self.pages.len()
    }

    /// Check if cache is empty
    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    /// Check if page is in cache
    pub fn contains(&self, page_id: PageId) -> bool {
        self.pages.contains(&page_id)
    }

    /// Maximum number of cached pages
    pub fn capacity(&self) -> usize {
        self.pages.cap().get()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn leaf() -> Arc<Node> {
        Arc::new(Node::empty_leaf())
    }

    #[test]
    fn test_page_cache_new() {
        let cache = PageCache::new(10);
        assert_eq!(cache.len(), 0);
        assert!(cache.is_empty());
        assert_eq!(cache.capacity(), 10);
    }

    #[test]
    fn test_page_cache_zero_size_holds_one_page() {
        let cache = PageCache::new(0);
        assert_eq!(cache.capacity(), 1);
    }

    #[test]
    fn test_page_cache_insert_and_get() {
        let mut cache = PageCache::new(10);
        cache.insert(1, leaf());
        assert_eq!(cache.len(), 1);
        assert!(cache.contains(1));
        assert!(cache.get(1).is_some());
        assert!(cache.get(999).is_none());
    }

    #[test]
    fn test_page_cache_lru_eviction() {
        let mut cache = PageCache::new(3);
        cache.insert(1, leaf());
        cache.insert(2, leaf());
        cache.insert(3, leaf());

        // Access page 1 to make it most recent
        let _ = cache.get(1);

        let evicted = cache.insert(4, leaf());
        assert_eq!(evicted, Some(2)); // Page 2 was least recently used
        assert!(!cache.contains(2));
        assert!(cache.contains(1));
        assert!(cache.contains(3));
        assert!(cache.contains(4));
    }

    #[test]
    fn test_page_cache_replace_is_not_eviction() {
        let mut cache = PageCache::new(2);
        cache.insert(1, leaf());
        cache.insert(2, leaf());
        assert_eq!(cache.insert(2, leaf()), None);
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn test_page_cache_remove_and_clear() {
        let mut cache = PageCache::new(10);
        cache.insert(1, leaf());
        cache.insert(2, leaf());

        assert!(cache.remove(1).is_some());
        assert!(cache.remove(1).is_none());
        assert_eq!(cache.len(), 1);

        cache.clear();
        assert!(cache.is_empty());
    }
}
