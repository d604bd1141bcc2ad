//! Startup cache warm-up from the durable store

use crate::cache::OrderCache;
use crate::database::OrderStore;
use crate::error::Result;
use tracing::{info, warn};

/// Load up to `limit` of the newest durable orders into the cache.
///
/// Orders are cached oldest first so that, if the cache is smaller than
/// `limit`, the newest ones are the ones kept. Orders that fail to load are
/// logged and skipped. Returns how many orders were cached; zero is not an error.
pub async fn restore(
    store: &dyn OrderStore,
    cache: &dyn OrderCache,
    limit: usize,
) -> Result<usize> {
    if limit == 0 {
        info!("Cache restore disabled (limit 0)");
        return Ok(0);
    }

    info!(limit, "Restoring cache from database...");
    let rows = store.recent_orders(limit).await?;

    let mut restored = 0;
    let mut skipped = 0;
    for row in rows.into_iter().rev() {
        match row {
            Ok(order) => {
                cache.set(order).await;
                restored += 1;
            }
            Err(e) => {
                warn!(error = %e, "Skipping order that failed to load");
                skipped += 1;
            }
        }
    }

    info!(restored, skipped, "Cache restore complete");
    Ok(restored)
}
