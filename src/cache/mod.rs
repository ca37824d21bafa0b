//! Session-scoped memo of price tables.
//!
//! Entries live as long as the cache value; there is no eviction or expiry.

use crate::models::{PriceTable, TickerMap};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

/// Identity of a fetch: lookback days plus the ticker pairs in sorted order.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub days: u32,
    pub tickers: Vec<(String, String)>,
}

impl CacheKey {
    pub fn new(days: u32, tickers: &TickerMap) -> Self {
        Self { days, tickers: tickers.sorted_entries() }
    }
}

#[derive(Debug, Default)]
pub struct PriceCache {
    entries: HashMap<CacheKey, Arc<PriceTable>>,
    hits: u64,
    misses: u64,
}

impl PriceCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&mut self, key: &CacheKey) -> Option<Arc<PriceTable>> {
        match self.entries.get(key) {
            Some(table) => {
                self.hits += 1;
                debug!("cache hit: {} days, {} tickers", key.days, key.tickers.len());
                Some(Arc::clone(table))
            }
            None => {
                self.misses += 1;
                None
            }
        }
    }

    pub fn insert(&mut self, key: CacheKey, table: Arc<PriceTable>) {
        self.entries.insert(key, table);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn hits(&self) -> u64 {
        self.hits
    }

    pub fn misses(&self) -> u64 {
        self.misses
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_is_order_independent() {
        let a = TickerMap::from_pairs([("A", "AAA.T"), ("B", "BBB.T")]).unwrap();
        let b = TickerMap::from_pairs([("B", "BBB.T"), ("A", "AAA.T")]).unwrap();
        assert_eq!(CacheKey::new(5, &a), CacheKey::new(5, &b));
        assert_ne!(CacheKey::new(5, &a), CacheKey::new(6, &a));
    }

    #[test]
    fn test_get_insert_counters() {
        let map = TickerMap::from_pairs([("A", "AAA.T")]).unwrap();
        let key = CacheKey::new(3, &map);
        let mut cache = PriceCache::new();

        assert!(cache.get(&key).is_none());
        cache.insert(key.clone(), Arc::new(PriceTable::default()));
        assert!(cache.get(&key).is_some());

        assert_eq!(cache.len(), 1);
        assert_eq!(cache.hits(), 1);
        assert_eq!(cache.misses(), 1);
    }
}
