//! In-memory doubles for unit tests

use crate::database::OrderStore;
use crate::error::{OrderError, Result};
use async_trait::async_trait;
use order_db::{Delivery, Item, Order, Payment};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

/// Order store backed by a vector, in insertion order
#[derive(Default)]
pub struct MemoryStore {
    orders: Mutex<Vec<Order>>,
    /// Identifiers whose rows fail to decode in `recent_orders`
    broken: Mutex<Vec<String>>,
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
    pub reads: AtomicUsize,
}

impl MemoryStore {
    pub fn with_orders(orders: Vec<Order>) -> Self {
        Self {
            orders: Mutex::new(orders),
            ..Default::default()
        }
    }

    pub fn fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    pub fn break_row(&self, order_uid: &str) {
        self.broken.lock().unwrap().push(order_uid.to_string());
    }

    pub fn order_count(&self) -> usize {
        self.orders.lock().unwrap().len()
    }

    pub fn contains(&self, order_uid: &str) -> bool {
        self.orders
            .lock()
            .unwrap()
            .iter()
            .any(|o| o.order_uid == order_uid)
    }

    fn check_reads(&self) -> Result<()> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(OrderError::Database(sqlx::Error::PoolTimedOut));
        }
        Ok(())
    }
}

#[async_trait]
impl OrderStore for MemoryStore {
    async fn insert_order(&self, order: &Order) -> Result<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(OrderError::Database(sqlx::Error::PoolTimedOut));
        }
        let mut orders = self.orders.lock().unwrap();
        if orders.iter().any(|o| o.order_uid == order.order_uid) {
            return Err(OrderError::Database(sqlx::Error::RowNotFound));
        }
        orders.push(order.clone());
        Ok(())
    }

    async fn get_order(&self, order_uid: &str) -> Result<Option<Order>> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        self.check_reads()?;
        Ok(self
            .orders
            .lock()
            .unwrap()
            .iter()
            .find(|o| o.order_uid == order_uid)
            .cloned())
    }

    async fn recent_orders(&self, limit: usize) -> Result<Vec<Result<Order>>> {
        self.check_reads()?;
        let broken = self.broken.lock().unwrap().clone();
        let mut orders = self.orders.lock().unwrap().clone();
        orders.sort_by(|a, b| b.date_created.cmp(&a.date_created));
        Ok(orders
            .into_iter()
            .take(limit)
            .map(|o| {
                if broken.contains(&o.order_uid) {
                    Err(OrderError::Database(sqlx::Error::ColumnNotFound(
                        "delivery_name".to_string(),
                    )))
                } else {
                    Ok(o)
                }
            })
            .collect())
    }

    async fn ping(&self) -> Result<()> {
        self.check_reads()
    }
}

/// A valid order with one item priced 100 USD
pub fn sample_order(order_uid: &str) -> Order {
    Order {
        order_uid: order_uid.to_string(),
        track_number: "WBILMTESTTRACK".to_string(),
        entry: "WBIL".to_string(),
        delivery: Delivery {
            name: "Test Testov".to_string(),
            phone: "+9720000000".to_string(),
            zip: "2639809".to_string(),
            city: "Kiryat Mozkin".to_string(),
            address: "Ploshad Mira 15".to_string(),
            region: "Kraiot".to_string(),
            email: "test@gmail.com".to_string(),
        },
        payment: Payment {
            transaction: order_uid.to_string(),
            currency: "USD".to_string(),
            provider: "wbpay".to_string(),
            amount: 100,
            payment_dt: 1637907727,
            bank: "alpha".to_string(),
            goods_total: 100,
            ..Default::default()
        },
        items: vec![Item {
            chrt_id: 9934930,
            track_number: "WBILMTESTTRACK".to_string(),
            price: 100,
            rid: "ab4219087a764ae0btest".to_string(),
            name: "Mascaras".to_string(),
            size: "0".to_string(),
            total_price: 100,
            nm_id: 2389212,
            brand: "Vivienne Sabo".to_string(),
            status: 202,
            ..Default::default()
        }],
        locale: "en".to_string(),
        customer_id: "test".to_string(),
        delivery_service: "meest".to_string(),
        shardkey: "9".to_string(),
        sm_id: 99,
        oof_shard: "1".to_string(),
        ..Default::default()
    }
}
