//! PostgreSQL nonce ledger implementation

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::error::StoreResult;
use crate::repo::NonceLedger;

/// PostgreSQL nonce ledger
///
/// `used_nonces.nonce` carries a primary-key constraint; the conditional
/// insert is atomic at the database, which is what makes the ledger safe
/// to share across processes.
#[derive(Clone)]
pub struct PgNonceLedger {
    pool: PgPool,
}

impl PgNonceLedger {
    /// Create a new nonce ledger
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl NonceLedger for PgNonceLedger {
    async fn insert_if_absent(&self, nonce: &str, consumed_at: DateTime<Utc>) -> StoreResult<bool> {
        let result = sqlx::query(
            r#"
            INSERT INTO used_nonces (nonce, consumed_at)
            VALUES ($1, $2)
            ON CONFLICT (nonce) DO NOTHING
            "#,
        )
        .bind(nonce)
        .bind(consumed_at)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    async fn prune_older_than(&self, cutoff: DateTime<Utc>) -> StoreResult<u64> {
        let result = sqlx::query(
            r#"
            DELETE FROM used_nonces
            WHERE consumed_at < $1
            "#,
        )
        .bind(cutoff)
        .execute(&self.pool)
        .await?;

        let pruned = result.rows_affected();
        if pruned > 0 {
            tracing::debug!(pruned, "Pruned consumed nonces");
        }
        Ok(pruned)
    }
}
