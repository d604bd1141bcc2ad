//! Durable order storage
//!
//! `OrderStore` is the capability the orchestrator and rehydrator use;
//! `PgOrderStore` implements it on Postgres via the shared `order-db` crate.

use crate::config::Config;
use crate::error::Result;
use async_trait::async_trait;
use order_db::{Order, OrderRow};
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::{FromRow, PgConnection};
use tracing::{debug, info, warn};

#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Persist an order and all of its sub-records atomically
    async fn insert_order(&self, order: &Order) -> Result<()>;

    /// Read a full order, or `None` if no such order exists
    async fn get_order(&self, order_uid: &str) -> Result<Option<Order>>;

    /// Read up to `limit` of the newest orders, newest first.
    ///
    /// The outer error means the query itself failed; an inner error means a
    /// single order could not be read and the rest are still usable.
    async fn recent_orders(&self, limit: usize) -> Result<Vec<Result<Order>>>;

    /// Liveness probe
    async fn ping(&self) -> Result<()>;
}

/// Postgres-backed order store
pub struct PgOrderStore {
    pool: PgPool,
}

impl PgOrderStore {
    /// Connect with the pool limits from the configuration
    pub async fn connect(config: &Config) -> Result<Self> {
        info!("Connecting to database...");
        let pool = PgPoolOptions::new()
            .max_connections(config.db_max_open_conns)
            .min_connections(config.db_max_idle_conns.min(config.db_max_open_conns))
            .max_lifetime(config.db_conn_max_lifetime)
            .idle_timeout(config.db_conn_max_idle_time)
            .connect(&config.database_url())
            .await?;
        info!("Database connection established");
        Ok(Self { pool })
    }

    /// Run database migrations
    pub async fn migrate(&self) -> Result<()> {
        order_db::migrate::migrate(&self.pool).await?;
        Ok(())
    }

    /// Close the pool, waiting for checked-out connections to be returned
    pub async fn close(&self) {
        self.pool.close().await;
        info!("Database pool closed");
    }

    async fn write_order(conn: &mut PgConnection, order: &Order) -> Result<()> {
        order_db::orders::insert(&mut *conn, order).await?;
        order_db::deliveries::insert(&mut *conn, &order.order_uid, &order.delivery).await?;
        order_db::payments::insert(&mut *conn, &order.order_uid, &order.payment).await?;
        order_db::items::insert_all(&mut *conn, &order.order_uid, &order.items).await?;
        Ok(())
    }

    async fn load_order(&self, row: OrderRow) -> Result<Order> {
        let items = order_db::items::for_order(&self.pool, &row.order_uid).await?;
        Ok(row.into_order(items))
    }
}

#[async_trait]
impl OrderStore for PgOrderStore {
    async fn insert_order(&self, order: &Order) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        match Self::write_order(&mut tx, order).await {
            Ok(()) => {
                tx.commit().await?;
                debug!(order_uid = %order.order_uid, items = order.items.len(), "Order committed");
                Ok(())
            }
            Err(e) => {
                if let Err(rollback_err) = tx.rollback().await {
                    warn!(
                        order_uid = %order.order_uid,
                        error = %rollback_err,
                        "Failed to roll back order transaction"
                    );
                } else {
                    warn!(order_uid = %order.order_uid, "Order transaction rolled back");
                }
                Err(e)
            }
        }
    }

    async fn get_order(&self, order_uid: &str) -> Result<Option<Order>> {
        match order_db::orders::get(&self.pool, order_uid).await? {
            Some(row) => Ok(Some(self.load_order(row).await?)),
            None => Ok(None),
        }
    }

    async fn recent_orders(&self, limit: usize) -> Result<Vec<Result<Order>>> {
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let rows = order_db::orders::recent(&self.pool, limit).await?;

        let mut orders = Vec::with_capacity(rows.len());
        for row in &rows {
            let order = match OrderRow::from_row(row) {
                Ok(row) => self.load_order(row).await,
                Err(e) => Err(e.into()),
            };
            orders.push(order);
        }
        Ok(orders)
    }

    async fn ping(&self) -> Result<()> {
        order_db::ping(&self.pool).await?;
        Ok(())
    }
}
