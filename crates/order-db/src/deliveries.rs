use crate::types::Delivery;

/// Insert the delivery row for an order
pub async fn insert(
    executor: impl sqlx::PgExecutor<'_>,
    order_uid: &str,
    delivery: &Delivery,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO delivery (order_uid, name, phone, zip, city, address, region, email)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        "#,
    )
    .bind(order_uid)
    .bind(&delivery.name)
    .bind(&delivery.phone)
    .bind(&delivery.zip)
    .bind(&delivery.city)
    .bind(&delivery.address)
    .bind(&delivery.region)
    .bind(&delivery.email)
    .execute(executor)
    .await?;
    Ok(())
}
