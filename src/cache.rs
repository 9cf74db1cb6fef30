//! Keyed result cache with FIFO/LRU eviction.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::trace;

/// Order in which cached entries are evicted once the cache is over capacity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EvictionStrategy {
    /// Evict in insertion order, ignoring later completions of the same key.
    Fifo,
    /// Evict the least recently completed key; every settlement of a keyed
    /// task moves its key to the back of the eviction queue.
    Lru,
}

/// Stores successful results by key, bounded by a capacity.
///
/// Eviction order is kept in a recency stack alongside the entry map: the key
/// at the head of the stack is the next to be evicted. The stack and the map
/// must hold the same key set after every trim pass; divergence is an
/// internal bug and panics.
pub(crate) struct ResultCache<T> {
    entries: HashMap<String, T>,
    recency: Vec<String>,
    strategy: EvictionStrategy,
    capacity: usize,
}

impl<T: Clone> ResultCache<T> {
    pub(crate) fn new(strategy: EvictionStrategy, capacity: usize) -> Self {
        Self {
            entries: HashMap::new(),
            recency: Vec::new(),
            strategy,
            capacity,
        }
    }

    /// Look up a cached value. Reads do not touch the recency stack; recency
    /// is driven by completion events, not consumption.
    pub(crate) fn get(&self, key: &str) -> Option<T> {
        self.entries.get(key).cloned()
    }

    /// Store a successful result, moving the key to the back of the eviction
    /// queue regardless of strategy.
    pub(crate) fn insert(&mut self, key: String, value: T) {
        self.entries.insert(key.clone(), value);
        if let Some(idx) = self.recency.iter().position(|k| *k == key) {
            self.recency.remove(idx);
        }
        self.recency.push(key);
    }

    /// Record the completion of a keyed task. Under LRU the key moves to the
    /// back of the eviction queue; under FIFO an existing position is kept.
    /// Keys without a cache entry (failed tasks) are ignored so the stack
    /// never outgrows the map.
    pub(crate) fn record_completion(&mut self, key: &str) {
        if !self.entries.contains_key(key) {
            return;
        }
        match self.recency.iter().position(|k| k == key) {
            None => self.recency.push(key.to_string()),
            Some(idx) if self.strategy == EvictionStrategy::Lru => {
                let key = self.recency.remove(idx);
                self.recency.push(key);
            }
            Some(_) => {}
        }
    }

    /// Evict from the head of the recency stack until the cache fits its
    /// capacity. Runs deferred, after a settlement batch.
    pub(crate) fn trim(&mut self) {
        if self.entries.len() <= self.capacity {
            return;
        }
        let excess = self.entries.len() - self.capacity;
        for key in self.recency.drain(..excess) {
            trace!(%key, "evicting cached result");
            self.entries.remove(&key);
        }
        assert_eq!(
            self.entries.len(),
            self.recency.len(),
            "result cache diverged from its recency stack"
        );
    }

    /// Drop every cached entry immediately.
    pub(crate) fn clear(&mut self) {
        self.entries.clear();
        self.recency.clear();
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    /// Cached keys in eviction order, oldest first.
    pub(crate) fn keys(&self) -> Vec<String> {
        self.recency.clone()
    }
}
