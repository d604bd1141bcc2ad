pub mod deliveries;
pub mod items;
pub mod migrate;
pub mod orders;
pub mod payments;
pub mod types;

pub use sqlx::postgres::PgPool;
pub use types::*;

/// Liveness probe
pub async fn ping(executor: impl sqlx::PgExecutor<'_>) -> Result<(), sqlx::Error> {
    sqlx::query("SELECT 1").execute(executor).await?;
    Ok(())
}
