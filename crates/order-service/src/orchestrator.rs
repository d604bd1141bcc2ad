//! Order ingestion and lookup
//!
//! Ingestion runs each payload through decode, validation and a durable
//! write, and only then populates the cache, so anything served from the
//! cache is already committed. Lookups read through the cache and backfill it
//! from the durable store on a miss.

use crate::cache::OrderCache;
use crate::database::OrderStore;
use crate::error::{OrderError, Result};
use crate::types::{CachedOrder, IngestStats};
use crate::validation::validate;
use order_cache::CacheStats;
use order_db::Order;
use std::ops::ControlFlow;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

pub struct OrderService {
    store: Arc<dyn OrderStore>,
    cache: Arc<dyn OrderCache>,
    processed: AtomicU64,
    malformed: AtomicU64,
    invalid: AtomicU64,
    failed: AtomicU64,
}

impl OrderService {
    pub fn new(store: Arc<dyn OrderStore>, cache: Arc<dyn OrderCache>) -> Self {
        Self {
            store,
            cache,
            processed: AtomicU64::new(0),
            malformed: AtomicU64::new(0),
            invalid: AtomicU64::new(0),
            failed: AtomicU64::new(0),
        }
    }

    /// Ingest one raw payload from the stream.
    ///
    /// Rejected payloads leave no trace in either store. A failed durable
    /// write is rolled back and nothing is cached.
    pub async fn process_order(&self, payload: &[u8]) -> Result<()> {
        if payload.is_empty() {
            self.malformed.fetch_add(1, Ordering::Relaxed);
            warn!("Rejected empty payload");
            return Err(OrderError::Malformed("empty payload".to_string()));
        }

        let order: Order = match serde_json::from_slice(payload) {
            Ok(order) => order,
            Err(e) => {
                self.malformed.fetch_add(1, Ordering::Relaxed);
                warn!(error = %e, bytes = payload.len(), "Rejected malformed payload");
                return Err(e.into());
            }
        };

        if let Err(e) = validate(&order) {
            self.invalid.fetch_add(1, Ordering::Relaxed);
            warn!(order_uid = %order.order_uid, error = %e, "Rejected invalid order");
            return Err(e.into());
        }

        if let Err(e) = self.store.insert_order(&order).await {
            self.failed.fetch_add(1, Ordering::Relaxed);
            error!(order_uid = %order.order_uid, error = %e, "Failed to persist order");
            return Err(e);
        }

        info!(
            order_uid = %order.order_uid,
            track_number = %order.track_number,
            amount = order.payment.amount,
            currency = %order.payment.currency,
            items = order.items.len(),
            "Order processed"
        );
        self.cache.set(order).await;
        self.processed.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    /// Look up an order, reading through the cache.
    ///
    /// `Ok(None)` means the order exists in neither store.
    pub async fn get_order(&self, order_uid: &str) -> Result<Option<Order>> {
        if let Some(order) = self.cache.get(order_uid).await {
            debug!(order_uid, "Order served from cache");
            return Ok(Some(order));
        }

        match self.store.get_order(order_uid).await? {
            Some(order) => {
                debug!(order_uid, "Order loaded from database");
                self.cache.set(order.clone()).await;
                Ok(Some(order))
            }
            None => Ok(None),
        }
    }

    pub async fn cache_size(&self) -> usize {
        self.cache.size().await
    }

    pub async fn cache_stats(&self) -> CacheStats {
        self.cache.stats().await
    }

    pub fn ingest_stats(&self) -> IngestStats {
        IngestStats {
            processed: self.processed.load(Ordering::Relaxed),
            malformed: self.malformed.load(Ordering::Relaxed),
            invalid: self.invalid.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
        }
    }

    pub async fn check_durable_connection(&self) -> Result<()> {
        self.store.ping().await
    }

    /// Up to `limit` cached orders with their insertion times, oldest first
    pub async fn cached_orders(&self, limit: usize) -> Vec<CachedOrder> {
        let mut listed = Vec::new();
        if limit == 0 {
            return listed;
        }
        self.cache
            .range(&mut |key, entry| {
                listed.push(CachedOrder {
                    order_uid: key.to_string(),
                    cached_at: entry.cached_at,
                });
                if listed.len() >= limit {
                    ControlFlow::Break(())
                } else {
                    ControlFlow::Continue(())
                }
            })
            .await;
        listed
    }
}
