//! TTL and capacity bounded in-memory cache

use crate::types::{CacheConfig, CacheEntry, CacheStats};
use chrono::Utc;
use std::collections::{BTreeMap, HashMap};
use std::ops::ControlFlow;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{watch, Mutex, RwLock};
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

/// First tick used when `now + period` is not representable
const FAR_FUTURE: Duration = Duration::from_secs(86400 * 365 * 30);

/// Entries plus an index ordered by insertion time.
///
/// Both live behind the same lock so they always agree on which keys exist.
struct Entries<V> {
    map: HashMap<String, CacheEntry<V>>,
    by_age: BTreeMap<(Instant, u64), String>,
    next_seq: u64,
}

impl<V> Entries<V> {
    fn new() -> Self {
        Self {
            map: HashMap::new(),
            by_age: BTreeMap::new(),
            next_seq: 0,
        }
    }

    fn insert(&mut self, key: String, value: V) {
        let seq = self.next_seq;
        self.next_seq += 1;
        let entry = CacheEntry {
            value,
            stamped_at: Instant::now(),
            cached_at: Utc::now(),
            seq,
        };
        self.by_age.insert((entry.stamped_at, seq), key.clone());
        if let Some(old) = self.map.insert(key, entry) {
            self.by_age.remove(&(old.stamped_at, old.seq));
        }
    }

    fn remove(&mut self, key: &str) -> Option<CacheEntry<V>> {
        let entry = self.map.remove(key)?;
        self.by_age.remove(&(entry.stamped_at, entry.seq));
        Some(entry)
    }

    fn oldest_key(&self) -> Option<String> {
        self.by_age.values().next().cloned()
    }
}

/// State shared between the store handle and its cleanup task
struct Shared<V> {
    entries: RwLock<Entries<V>>,
    max_size: usize,
    ttl: Duration,
    hits: AtomicU64,
    misses: AtomicU64,
    evictions: AtomicU64,
    expirations: AtomicU64,
}

impl<V> Shared<V> {
    async fn cleanup(&self, ttl: Duration) -> usize {
        let mut entries = self.entries.write().await;
        let now = Instant::now();
        let mut removed = 0;

        // by_age is ordered oldest first, so expired entries form a prefix
        while let Some(key) = entries.oldest_key() {
            let expired = entries
                .map
                .get(&key)
                .map(|e| e.is_expired(now, ttl))
                .unwrap_or(true);
            if !expired {
                break;
            }
            entries.remove(&key);
            removed += 1;
        }

        if removed > 0 {
            self.expirations.fetch_add(removed as u64, Ordering::Relaxed);
        }
        removed
    }
}

/// An in-memory cache with TTL expiration and oldest-first eviction.
///
/// Construction spawns a cleanup task that calls [`CacheStore::cleanup`] on a
/// fixed interval. [`CacheStore::stop`] ends that task; the store keeps serving
/// reads and writes afterwards, it only stops sweeping.
pub struct CacheStore<V> {
    shared: Arc<Shared<V>>,
    shutdown: watch::Sender<bool>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl<V> CacheStore<V>
where
    V: Clone + Send + Sync + 'static,
{
    /// Create a new cache and start its cleanup task.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn new(config: CacheConfig) -> Self {
        let shared = Arc::new(Shared {
            entries: RwLock::new(Entries::new()),
            max_size: config.max_size,
            ttl: config.ttl,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            evictions: AtomicU64::new(0),
            expirations: AtomicU64::new(0),
        });

        let (shutdown, shutdown_rx) = watch::channel(false);
        let worker = tokio::spawn(run_cleanup(
            shared.clone(),
            config.cleanup_interval,
            shutdown_rx,
        ));

        info!(
            max_size = config.max_size,
            ttl_secs = config.ttl.as_secs(),
            cleanup_interval_secs = config.cleanup_interval.as_secs(),
            "Cache initialized"
        );

        Self {
            shared,
            shutdown,
            worker: Mutex::new(Some(worker)),
        }
    }

    /// Get a value if present and unexpired.
    ///
    /// An expired entry is removed as a side effect and reported as a miss.
    pub async fn get(&self, key: &str) -> Option<V> {
        {
            let entries = self.shared.entries.read().await;
            match entries.map.get(key) {
                None => {
                    self.shared.misses.fetch_add(1, Ordering::Relaxed);
                    return None;
                }
                Some(entry) if !entry.is_expired(Instant::now(), self.shared.ttl) => {
                    self.shared.hits.fetch_add(1, Ordering::Relaxed);
                    return Some(entry.value.clone());
                }
                Some(_) => {}
            }
        }

        // Expired under the read lock; re-check under the write lock since a
        // concurrent set may have refreshed the entry in between.
        let mut entries = self.shared.entries.write().await;
        if let Some(entry) = entries.map.get(key) {
            if !entry.is_expired(Instant::now(), self.shared.ttl) {
                self.shared.hits.fetch_add(1, Ordering::Relaxed);
                return Some(entry.value.clone());
            }
            entries.remove(key);
            self.shared.expirations.fetch_add(1, Ordering::Relaxed);
            debug!(key, "Cache entry expired");
        }

        self.shared.misses.fetch_add(1, Ordering::Relaxed);
        None
    }

    /// Insert or replace the value for `key`, stamping the current time.
    ///
    /// If the cache is then over capacity, the entry with the oldest stamp is
    /// evicted before this call returns.
    pub async fn set(&self, key: impl Into<String>, value: V) {
        let key = key.into();
        let mut entries = self.shared.entries.write().await;
        entries.insert(key, value);

        while entries.map.len() > self.shared.max_size {
            let Some(oldest) = entries.oldest_key() else {
                break;
            };
            entries.remove(&oldest);
            self.shared.evictions.fetch_add(1, Ordering::Relaxed);
            debug!(key = %oldest, "Evicted oldest cache entry");
        }
    }

    /// Remove an entry; absent keys are ignored
    pub async fn delete(&self, key: &str) {
        let mut entries = self.shared.entries.write().await;
        entries.remove(key);
    }

    /// Exact number of entries currently held, expired or not
    pub async fn size(&self) -> usize {
        self.shared.entries.read().await.map.len()
    }

    /// Remove every entry whose age has reached `ttl`. Returns how many were removed.
    pub async fn cleanup(&self, ttl: Duration) -> usize {
        self.shared.cleanup(ttl).await
    }

    /// Visit entries oldest first until the visitor breaks.
    ///
    /// The read lock is held for the whole walk, so the visitor sees a
    /// consistent snapshot and must not call back into the cache.
    pub async fn range<F>(&self, mut visit: F)
    where
        F: FnMut(&str, &CacheEntry<V>) -> ControlFlow<()>,
    {
        let entries = self.shared.entries.read().await;
        for key in entries.by_age.values() {
            if let Some(entry) = entries.map.get(key) {
                if visit(key, entry).is_break() {
                    break;
                }
            }
        }
    }

    pub async fn stats(&self) -> CacheStats {
        let entries = self.shared.entries.read().await.map.len();
        CacheStats {
            entries,
            hits: self.shared.hits.load(Ordering::Relaxed),
            misses: self.shared.misses.load(Ordering::Relaxed),
            evictions: self.shared.evictions.load(Ordering::Relaxed),
            expirations: self.shared.expirations.load(Ordering::Relaxed),
        }
    }

    /// Stop the cleanup task and wait for it to exit. Safe to call more than once.
    pub async fn stop(&self) {
        self.shutdown.send_replace(true);

        let handle = self.worker.lock().await.take();
        if let Some(handle) = handle {
            if let Err(e) = handle.await {
                warn!(error = %e, "Cache cleanup task ended abnormally");
            }
            info!("Cache stopped");
        }
    }
}

async fn run_cleanup<V>(
    shared: Arc<Shared<V>>,
    period: Duration,
    mut shutdown: watch::Receiver<bool>,
) {
    // A period too large to add to the clock never fires
    let start = Instant::now()
        .checked_add(period)
        .unwrap_or_else(|| Instant::now() + FAR_FUTURE);
    let mut ticker = interval_at(start, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let removed = shared.cleanup(shared.ttl).await;
                if removed > 0 {
                    debug!(removed, "Cache cleanup removed expired entries");
                }
            }
            // Fires on stop() and also when the store is dropped
            _ = shutdown.changed() => break,
        }
    }

    debug!("Cache cleanup task exited");
}
