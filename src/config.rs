//! Configuration for the reconciler.

use serde::{Deserialize, Serialize};

use crate::cache::EvictionStrategy;
use crate::error::{ConfigError, ConfigResult};

/// Default concurrency limit.
const DEFAULT_MAX_CONCURRENT: usize = 2;

/// Default cache capacity when caching is enabled without an explicit size.
const DEFAULT_CACHE_CAPACITY: usize = 10;

/// Result caching policy: eviction strategy plus capacity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CachePolicy {
    /// Order in which entries are evicted once over capacity.
    pub strategy: EvictionStrategy,

    /// Maximum number of cached results to keep.
    pub capacity: usize,
}

impl CachePolicy {
    /// LRU caching with the given capacity.
    pub fn lru(capacity: usize) -> Self {
        Self {
            strategy: EvictionStrategy::Lru,
            capacity,
        }
    }

    /// FIFO caching with the given capacity.
    pub fn fifo(capacity: usize) -> Self {
        Self {
            strategy: EvictionStrategy::Fifo,
            capacity,
        }
    }
}

impl Default for CachePolicy {
    /// The "just turn it on" policy: LRU with capacity 10.
    fn default() -> Self {
        Self::lru(DEFAULT_CACHE_CAPACITY)
    }
}

/// Configuration for a [`Reconciler`](crate::Reconciler).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconcilerConfig {
    /// Maximum number of tasks simultaneously admitted (executing, merged
    /// onto a leader, or resolving from cache). The sole backpressure
    /// mechanism; waiting tasks queue without bound.
    pub max_concurrent: usize,

    /// Result caching policy; `None` disables caching entirely.
    pub cache: Option<CachePolicy>,
}

impl Default for ReconcilerConfig {
    fn default() -> Self {
        Self {
            max_concurrent: DEFAULT_MAX_CONCURRENT,
            cache: None,
        }
    }
}

impl ReconcilerConfig {
    /// Create a configuration with default values (limit 2, caching off).
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the concurrency limit.
    pub fn with_max_concurrent(mut self, max_concurrent: usize) -> ConfigResult<Self> {
        if max_concurrent == 0 {
            return Err(ConfigError::invalid_max_concurrent(max_concurrent));
        }
        self.max_concurrent = max_concurrent;
        Ok(self)
    }

    /// Enable result caching under the given policy.
    pub fn with_cache(mut self, policy: CachePolicy) -> Self {
        self.cache = Some(policy);
        self
    }

    /// Enable result caching with the default policy (LRU, capacity 10).
    pub fn with_default_cache(self) -> Self {
        self.with_cache(CachePolicy::default())
    }

    /// Validate the configuration.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.max_concurrent == 0 {
            return Err(ConfigError::invalid_max_concurrent(self.max_concurrent));
        }
        if let Some(policy) = &self.cache {
            if policy.capacity == 0 {
                return Err(ConfigError::invalid_cache_capacity(policy.capacity));
            }
        }
        Ok(())
    }
}
