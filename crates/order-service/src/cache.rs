//! The cache capability the orchestrator depends on

use async_trait::async_trait;
use order_cache::{CacheEntry, CacheStats, CacheStore};
use order_db::Order;
use std::ops::ControlFlow;

/// Order cache keyed by `order_uid`
#[async_trait]
pub trait OrderCache: Send + Sync {
    async fn get(&self, order_uid: &str) -> Option<Order>;

    /// Store an order under its own `order_uid`
    async fn set(&self, order: Order);

    async fn delete(&self, order_uid: &str);

    async fn size(&self) -> usize;

    /// Visit cached orders oldest first until the visitor breaks
    async fn range(
        &self,
        visit: &mut (dyn for<'a> FnMut(&'a str, &'a CacheEntry<Order>) -> ControlFlow<()> + Send),
    );

    /// Hit, miss and eviction counters
    async fn stats(&self) -> CacheStats;
}

#[async_trait]
impl OrderCache for CacheStore<Order> {
    async fn get(&self, order_uid: &str) -> Option<Order> {
        CacheStore::get(self, order_uid).await
    }

    async fn set(&self, order: Order) {
        let key = order.order_uid.clone();
        CacheStore::set(self, key, order).await
    }

    async fn delete(&self, order_uid: &str) {
        CacheStore::delete(self, order_uid).await
    }

    async fn size(&self) -> usize {
        CacheStore::size(self).await
    }

    async fn range(
        &self,
        visit: &mut (dyn for<'a> FnMut(&'a str, &'a CacheEntry<Order>) -> ControlFlow<()> + Send),
    ) {
        CacheStore::range(self, |key, entry| visit(key, entry)).await
    }

    async fn stats(&self) -> CacheStats {
        CacheStore::stats(self).await
    }
}
