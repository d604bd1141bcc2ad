//! In-memory record cache with TTL expiration and oldest-first eviction
//!
//! Records are keyed by a string identifier. Expired entries are dropped lazily
//! on read and eagerly by a background cleanup task; when the cache grows past
//! its capacity the entry with the oldest insertion time is evicted. Eviction is
//! by insertion time, not by access: a hit does not refresh an entry.

mod cache;
mod types;

pub use cache::CacheStore;
pub use types::{CacheConfig, CacheEntry, CacheStats, DEFAULT_CLEANUP_INTERVAL};
