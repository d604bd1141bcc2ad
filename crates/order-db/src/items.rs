use crate::types::Item;
use sqlx::PgConnection;

/// Insert every item of an order, in order.
///
/// Takes a connection rather than an executor because it issues one statement
/// per item; pass `&mut *tx` to keep all of them inside a transaction.
pub async fn insert_all(
    conn: &mut PgConnection,
    order_uid: &str,
    items: &[Item],
) -> Result<(), sqlx::Error> {
    for item in items {
        sqlx::query(
            r#"
            INSERT INTO items (
                order_uid, chrt_id, track_number, price, rid, name,
                sale, size, total_price, nm_id, brand, status
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            "#,
        )
        .bind(order_uid)
        .bind(item.chrt_id)
        .bind(&item.track_number)
        .bind(item.price)
        .bind(&item.rid)
        .bind(&item.name)
        .bind(item.sale)
        .bind(&item.size)
        .bind(item.total_price)
        .bind(item.nm_id)
        .bind(&item.brand)
        .bind(item.status)
        .execute(&mut *conn)
        .await?;
    }
    Ok(())
}

/// Get the items of an order in insertion order
pub async fn for_order(
    executor: impl sqlx::PgExecutor<'_>,
    order_uid: &str,
) -> Result<Vec<Item>, sqlx::Error> {
    sqlx::query_as::<_, Item>(
        r#"
        SELECT chrt_id, track_number, price, rid, name,
               sale, size, total_price, nm_id, brand, status
        FROM items
        WHERE order_uid = $1
        ORDER BY id
        "#,
    )
    .bind(order_uid)
    .fetch_all(executor)
    .await
}
