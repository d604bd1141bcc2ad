use crate::types::{Order, OrderRow};
use sqlx::postgres::PgRow;

/// SELECT columns for `OrderRow`, joined across `orders o`, `delivery d`, `payment p`.
/// Does not include the SELECT keyword or FROM clause.
/// ```ignore
/// concat!("SELECT ", order_columns!(), " FROM orders o ...")
/// ```
#[macro_export]
macro_rules! order_columns {
    () => {
        r#"
    o.order_uid, o.track_number, o.entry, o.locale, o.internal_signature,
    o.customer_id, o.delivery_service, o.shardkey, o.sm_id, o.date_created, o.oof_shard,
    d.name AS delivery_name, d.phone AS delivery_phone, d.zip AS delivery_zip,
    d.city AS delivery_city, d.address AS delivery_address, d.region AS delivery_region,
    d.email AS delivery_email,
    p.transaction AS payment_transaction, p.request_id AS payment_request_id,
    p.currency AS payment_currency, p.provider AS payment_provider, p.amount AS payment_amount,
    p.payment_dt, p.bank AS payment_bank, p.delivery_cost AS payment_delivery_cost,
    p.goods_total AS payment_goods_total, p.custom_fee AS payment_custom_fee
"#
    };
}

/// Insert the top-level order row
pub async fn insert(executor: impl sqlx::PgExecutor<'_>, order: &Order) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO orders (
            order_uid, track_number, entry, locale, internal_signature,
            customer_id, delivery_service, shardkey, sm_id, date_created, oof_shard
        ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
        "#,
    )
    .bind(&order.order_uid)
    .bind(&order.track_number)
    .bind(&order.entry)
    .bind(&order.locale)
    .bind(&order.internal_signature)
    .bind(&order.customer_id)
    .bind(&order.delivery_service)
    .bind(&order.shardkey)
    .bind(order.sm_id)
    .bind(order.date_created)
    .bind(&order.oof_shard)
    .execute(executor)
    .await?;
    Ok(())
}

/// Get a single order (without items) by its identifier
pub async fn get(
    executor: impl sqlx::PgExecutor<'_>,
    order_uid: &str,
) -> Result<Option<OrderRow>, sqlx::Error> {
    sqlx::query_as::<_, OrderRow>(concat!(
        "SELECT ",
        order_columns!(),
        r#"
        FROM orders o
        LEFT JOIN delivery d ON o.order_uid = d.order_uid
        LEFT JOIN payment p ON o.order_uid = p.order_uid
        WHERE o.order_uid = $1
        "#
    ))
    .bind(order_uid)
    .fetch_optional(executor)
    .await
}

/// Get the most recently created orders, newest first.
///
/// Rows are returned undecoded so the caller can decode each one with
/// `OrderRow::from_row` and skip individual failures.
pub async fn recent(
    executor: impl sqlx::PgExecutor<'_>,
    limit: i64,
) -> Result<Vec<PgRow>, sqlx::Error> {
    sqlx::query(concat!(
        "SELECT ",
        order_columns!(),
        r#"
        FROM orders o
        LEFT JOIN delivery d ON o.order_uid = d.order_uid
        LEFT JOIN payment p ON o.order_uid = p.order_uid
        ORDER BY o.date_created DESC
        LIMIT $1
        "#
    ))
    .bind(limit)
    .fetch_all(executor)
    .await
}
