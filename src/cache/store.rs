//! Order Cache Module
//!
//! In-memory mirror of durably stored orders, keyed by `order_uid`.

use std::collections::hash_map::Entry;
use std::collections::HashMap;

use tokio::sync::RwLock;

use crate::cache::{CacheStats, StatsRecorder, INITIAL_CAPACITY};
use crate::models::Order;

// == Order Cache ==
/// Concurrent map from order id to the last known-good order.
///
/// Lookups share the read lock and run in parallel; writes take the write
/// lock. Entries never expire and are never evicted: the cache only grows with
/// the set of distinct orders written or read, which is expected to stay small.
#[derive(Debug)]
pub struct OrderCache {
    /// Order storage
    entries: RwLock<HashMap<String, Order>>,
    /// Performance statistics
    stats: StatsRecorder,
}

impl OrderCache {
    // == Constructor ==
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::with_capacity(INITIAL_CAPACITY)),
            stats: StatsRecorder::new(),
        }
    }

    // == Get ==
    /// Returns a copy of the cached order, or `None` on a miss.
    pub async fn get(&self, order_uid: &str) -> Option<Order> {
        let entries = self.entries.read().await;
        match entries.get(order_uid) {
            Some(order) => {
                self.stats.record_hit();
                Some(order.clone())
            }
            None => {
                self.stats.record_miss();
                None
            }
        }
    }

    // == Set ==
    /// Inserts or overwrites the entry for `order_uid`.
    pub async fn set(&self, order_uid: impl Into<String>, order: Order) {
        let mut entries = self.entries.write().await;
        entries.insert(order_uid.into(), order);
        self.stats.record_set();
    }

    // == Fill ==
    /// Inserts `order` only if `order_uid` has no entry, and returns whichever
    /// order the cache holds afterwards.
    ///
    /// Read-path backfills go through here so that a value read from the store
    /// never replaces one the consumer cached after that read.
    pub async fn fill(&self, order_uid: impl Into<String>, order: Order) -> Order {
        let mut entries = self.entries.write().await;
        match entries.entry(order_uid.into()) {
            Entry::Occupied(current) => current.get().clone(),
            Entry::Vacant(slot) => {
                self.stats.record_set();
                slot.insert(order).clone()
            }
        }
    }

    // == Delete ==
    /// Removes an entry. Returns whether it was present.
    pub async fn delete(&self, order_uid: &str) -> bool {
        let mut entries = self.entries.write().await;
        entries.remove(order_uid).is_some()
    }

    // == Length ==
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    // == Is Empty ==
    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }

    // == Stats ==
    /// Returns current cache statistics.
    pub async fn stats(&self) -> CacheStats {
        let total_entries = self.len().await;
        self.stats.snapshot(total_entries)
    }
}

impl Default for OrderCache {
    fn default() -> Self {
        Self::new()
    }
}
