// src/services/cache.rs
// DOCUMENTATION: In-memory TTL cache for listing lookups
// PURPOSE: Spare the database on repeated listing reads. Availability and
// booking reads never go through here.

use crate::models::Listing;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

/// Cache entry with expiration
#[derive(Clone, Debug)]
struct CacheEntry<T> {
    data: T,
    expires_at: Instant,
}

impl<T> CacheEntry<T> {
    fn new(data: T, ttl: Duration) -> Self {
        Self {
            data,
            expires_at: Instant::now() + ttl,
        }
    }

    fn is_expired(&self) -> bool {
        Instant::now() > self.expires_at
    }
}

/// Thread-safe TTL cache keyed by listing ID
pub struct ListingCache {
    store: RwLock<HashMap<String, CacheEntry<Listing>>>,
    default_ttl: Duration,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl ListingCache {
    /// Create new cache with default TTL
    pub fn new(ttl_seconds: u64) -> Self {
        Self {
            store: RwLock::new(HashMap::new()),
            default_ttl: Duration::from_secs(ttl_seconds),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// Get cached listing
    pub async fn get(&self, listing_id: &str) -> Option<Listing> {
        let store = self.store.read().await;

        match store.get(listing_id) {
            Some(entry) if !entry.is_expired() => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                log::debug!("Cache HIT for listing: {}", listing_id);
                Some(entry.data.clone())
            }
            Some(_) => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                log::debug!("Cache EXPIRED for listing: {}", listing_id);
                None
            }
            None => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                log::debug!("Cache MISS for listing: {}", listing_id);
                None
            }
        }
    }

    /// Cache a listing with the default TTL
    pub async fn set(&self, listing: Listing) {
        self.set_with_ttl(listing, self.default_ttl).await;
    }

    /// Cache a listing with a custom TTL
    pub async fn set_with_ttl(&self, listing: Listing, ttl: Duration) {
        let mut store = self.store.write().await;
        log::debug!("Cache SET for listing: {} (TTL: {}s)", listing.id, ttl.as_secs());
        store.insert(listing.id.clone(), CacheEntry::new(listing, ttl));
    }

    /// Drop one listing, e.g. after the read model changed
    pub async fn invalidate(&self, listing_id: &str) -> bool {
        let removed = self.store.write().await.remove(listing_id).is_some();
        if removed {
            log::info!("Invalidated cache for listing {}", listing_id);
        }
        removed
    }

    /// Clear expired entries
    pub async fn cleanup(&self) {
        let mut store = self.store.write().await;
        let before_count = store.len();
        store.retain(|_, entry| !entry.is_expired());
        let after_count = store.len();

        if before_count > after_count {
            log::info!(
                "Cache cleanup: removed {} expired entries ({} remaining)",
                before_count - after_count,
                after_count
            );
        }
    }

    /// Get cache statistics
    pub async fn stats(&self) -> CacheStats {
        let store = self.store.read().await;
        let total = store.len();
        let expired = store.values().filter(|e| e.is_expired()).count();
        let hits = self.hits.load(Ordering::Relaxed);
        let misses = self.misses.load(Ordering::Relaxed);
        let requests = hits + misses;

        CacheStats {
            total_entries: total,
            expired_entries: expired,
            active_entries: total - expired,
            hits,
            misses,
            hit_rate: if requests == 0 {
                0.0
            } else {
                hits as f64 / requests as f64
            },
        }
    }

    /// Clear all cache entries
    pub async fn clear(&self) -> usize {
        let mut store = self.store.write().await;
        let count = store.len();
        store.clear();
        log::info!("Cache cleared: {} entries removed", count);
        count
    }
}

/// Cache statistics
#[derive(Debug, Serialize, Deserialize)]
pub struct CacheStats {
    pub total_entries: usize,
    pub expired_entries: usize,
    pub active_entries: usize,
    pub hits: u64,
    pub misses: u64,
    pub hit_rate: f64,
}

/// Start background cleanup task
/// DOCUMENTATION: Periodically removes expired entries
pub fn start_cleanup_task(cache: Arc<ListingCache>, interval_seconds: u64) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(interval_seconds));

        loop {
            interval.tick().await;
            cache.cleanup().await;
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::listing::sample_listing;

    #[tokio::test]
    async fn test_cache_set_get() {
        let cache = ListingCache::new(60);
        let listing = sample_listing();

        cache.set(listing.clone()).await;
        let result = cache.get(&listing.id).await;

        assert_eq!(result.map(|l| l.title), Some(listing.title));
    }

    #[tokio::test]
    async fn test_cache_expiration() {
        let cache = ListingCache::new(60);
        let listing = sample_listing();

        cache
            .set_with_ttl(listing.clone(), Duration::from_millis(50))
            .await;
        assert!(cache.get(&listing.id).await.is_some());

        tokio::time::sleep(Duration::from_millis(120)).await;

        assert!(cache.get(&listing.id).await.is_none());
    }

    #[tokio::test]
    async fn test_hit_and_miss_counters() {
        let cache = ListingCache::new(60);
        let listing = sample_listing();

        assert!(cache.get(&listing.id).await.is_none());
        cache.set(listing.clone()).await;
        assert!(cache.get(&listing.id).await.is_some());
        assert!(cache.get(&listing.id).await.is_some());

        let stats = cache.stats().await;
        assert_eq!(stats.hits, 2);
        assert_eq!(stats.misses, 1);
        assert!((stats.hit_rate - 2.0 / 3.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_invalidate_and_clear() {
        let cache = ListingCache::new(60);
        let listing = sample_listing();

        cache.set(listing.clone()).await;
        assert!(cache.invalidate(&listing.id).await);
        assert!(!cache.invalidate(&listing.id).await);

        cache.set(listing).await;
        assert_eq!(cache.clear().await, 1);
        assert_eq!(cache.stats().await.total_entries, 0);
    }

    #[test]
    fn test_cache_cleanup() {
        tokio_test::block_on(async {
            let cache = ListingCache::new(60);
            let mut other = sample_listing();
            other.id = "lst_other".to_string();

            cache
                .set_with_ttl(sample_listing(), Duration::from_millis(0))
                .await;
            cache.set(other).await;

            std::thread::sleep(Duration::from_millis(5));
            cache.cleanup().await;

            let stats = cache.stats().await;
            assert_eq!(stats.total_entries, 1);
            assert_eq!(stats.active_entries, 1);
        });
    }
}
