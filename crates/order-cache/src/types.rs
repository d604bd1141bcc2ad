//! Cache types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::time::Instant;

/// How often the background task sweeps expired entries unless configured otherwise
pub const DEFAULT_CLEANUP_INTERVAL: Duration = Duration::from_secs(5 * 60);

/// Capacity and expiry settings for a [`crate::CacheStore`]
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Maximum number of live entries
    pub max_size: usize,
    /// Age after which an entry is no longer served
    pub ttl: Duration,
    /// Period of the background cleanup sweep
    pub cleanup_interval: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_size: 100,
            ttl: Duration::from_secs(60 * 60),
            cleanup_interval: DEFAULT_CLEANUP_INTERVAL,
        }
    }
}

/// A cached value with the time it was stored
#[derive(Debug, Clone)]
pub struct CacheEntry<V> {
    pub value: V,
    /// Monotonic insertion time, used for expiry and eviction order
    pub stamped_at: Instant,
    /// Wall-clock insertion time, for display
    pub cached_at: DateTime<Utc>,
    pub(crate) seq: u64,
}

impl<V> CacheEntry<V> {
    pub fn age(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.stamped_at)
    }

    /// An entry is live while its age is strictly below the TTL
    pub fn is_expired(&self, now: Instant, ttl: Duration) -> bool {
        self.age(now) >= ttl
    }
}

/// Statistics about the cache
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheStats {
    pub entries: usize,
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
    pub expirations: u64,
}
