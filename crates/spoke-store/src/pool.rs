//! Database pool

use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use std::time::Duration;

use crate::error::StoreResult;

/// Shared PostgreSQL pool
pub type DbPool = PgPool;

/// Connect to PostgreSQL with service defaults
pub async fn connect(database_url: &str) -> StoreResult<DbPool> {
    let pool = PgPoolOptions::new()
        .max_connections(10)
        .acquire_timeout(Duration::from_secs(5))
        .connect(database_url)
        .await
        .inspect_err(|e| tracing::error!(error = %e, "Failed to connect to PostgreSQL"))?;
    tracing::info!("Connected to PostgreSQL");
    Ok(pool)
}
