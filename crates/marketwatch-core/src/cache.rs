//! Short-lived memoization of market views keyed by (symbol, range).

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::{MarketView, Range, Symbol};

type ViewKey = (Symbol, Range);

#[derive(Debug, Clone)]
struct CacheEntry {
    view: MarketView,
    expires_at: Instant,
}

#[derive(Debug)]
struct CacheInner {
    map: HashMap<ViewKey, CacheEntry>,
    ttl: Duration,
}

impl CacheInner {
    fn get(&self, key: &ViewKey) -> Option<MarketView> {
        self.map
            .get(key)
            .filter(|entry| Instant::now() <= entry.expires_at)
            .map(|entry| entry.view.clone())
    }

    fn put(&mut self, view: MarketView) {
        let key = (view.symbol.clone(), view.range);
        let expires_at = Instant::now() + self.ttl;
        self.map.insert(key, CacheEntry { view, expires_at });
    }

    fn clear_expired(&mut self) {
        let now = Instant::now();
        self.map.retain(|_, entry| entry.expires_at > now);
    }
}

/// Thread-safe view cache.
///
/// A zero TTL disables the cache entirely: nothing is stored and every
/// lookup misses. That is the default, so each selection change reaches the
/// provider exactly once.
#[derive(Debug, Clone)]
pub struct ViewCache {
    inner: Arc<tokio::sync::RwLock<CacheInner>>,
}

impl Default for ViewCache {
    fn default() -> Self {
        Self::disabled()
    }
}

impl ViewCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            inner: Arc::new(tokio::sync::RwLock::new(CacheInner {
                map: HashMap::new(),
                ttl,
            })),
        }
    }

    pub fn disabled() -> Self {
        Self::new(Duration::ZERO)
    }

    pub async fn get(&self, symbol: &Symbol, range: Range) -> Option<MarketView> {
        let store = self.inner.read().await;
        if store.ttl.is_zero() {
            return None;
        }
        store.get(&(symbol.clone(), range))
    }

    /// Store a successfully fetched view. No-op when disabled.
    pub async fn put(&self, view: MarketView) {
        let mut store = self.inner.write().await;
        if store.ttl.is_zero() {
            return;
        }
        store.clear_expired();
        store.put(view);
    }

    pub async fn invalidate(&self, symbol: &Symbol, range: Range) {
        let mut store = self.inner.write().await;
        store.map.remove(&(symbol.clone(), range));
    }

    pub async fn clear(&self) {
        self.inner.write().await.map.clear();
    }

    /// Number of stored entries, expired ones included.
    pub async fn len(&self) -> usize {
        self.inner.read().await.map.len()
    }

    pub async fn is_disabled(&self) -> bool {
        self.inner.read().await.ttl.is_zero()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn view(raw: &str, range: Range) -> MarketView {
        MarketView::degraded(Symbol::parse(raw).expect("valid"), range)
    }

    #[tokio::test]
    async fn stores_and_returns_fresh_views() {
        let cache = ViewCache::new(Duration::from_secs(60));
        let symbol = Symbol::parse("AAPL").expect("valid");

        assert!(cache.get(&symbol, Range::OneDay).await.is_none());
        cache.put(view("AAPL", Range::OneDay)).await;

        assert!(cache.get(&symbol, Range::OneDay).await.is_some());
        assert!(cache.get(&symbol, Range::OneWeek).await.is_none());
    }

    #[tokio::test]
    async fn entries_expire_after_ttl() {
        let cache = ViewCache::new(Duration::from_millis(50));
        let symbol = Symbol::parse("AAPL").expect("valid");
        cache.put(view("AAPL", Range::OneMonth)).await;

        tokio::time::sleep(Duration::from_millis(80)).await;
        assert!(cache.get(&symbol, Range::OneMonth).await.is_none());
    }

    #[tokio::test]
    async fn disabled_cache_never_stores() {
        let cache = ViewCache::disabled();
        assert!(cache.is_disabled().await);

        cache.put(view("AAPL", Range::OneDay)).await;
        assert_eq!(cache.len().await, 0);
    }

    #[tokio::test]
    async fn invalidate_drops_single_key() {
        let cache = ViewCache::new(Duration::from_secs(60));
        let symbol = Symbol::parse("MSFT").expect("valid");
        cache.put(view("MSFT", Range::OneDay)).await;
        cache.put(view("MSFT", Range::OneWeek)).await;

        cache.invalidate(&symbol, Range::OneDay).await;
        assert!(cache.get(&symbol, Range::OneDay).await.is_none());
        assert!(cache.get(&symbol, Range::OneWeek).await.is_some());

        cache.clear().await;
        assert_eq!(cache.len().await, 0);
    }
}
