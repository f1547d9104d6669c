//! PostgreSQL principal repository implementation

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::PgPool;
use spoke_types::Subscription;
use uuid::Uuid;

use crate::error::StoreResult;
use crate::models::PrincipalRow;
use crate::repo::{CreatePrincipal, PrincipalRepository};

/// PostgreSQL principal repository
///
/// The subscription snapshot is stored as JSONB and always written as a
/// whole; the resolver replaces, never merges.
#[derive(Clone)]
pub struct PgPrincipalRepository {
    pool: PgPool,
}

impl PgPrincipalRepository {
    /// Create a new principal repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct Row {
    id: Uuid,
    hub_user_id: String,
    username: String,
    email: Option<String>,
    subscriptions: Json<Vec<Subscription>>,
    last_login_at: DateTime<Utc>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<Row> for PrincipalRow {
    fn from(row: Row) -> Self {
        PrincipalRow {
            id: row.id,
            hub_user_id: row.hub_user_id,
            username: row.username,
            email: row.email,
            subscriptions: row.subscriptions.0,
            last_login_at: row.last_login_at,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[async_trait]
impl PrincipalRepository for PgPrincipalRepository {
    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<PrincipalRow>> {
        let row = sqlx::query_as::<_, Row>(
            r#"
            SELECT id, hub_user_id, username, email, subscriptions,
                   last_login_at, created_at, updated_at
            FROM principals
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(PrincipalRow::from))
    }

    async fn find_by_hub_user_id(&self, hub_user_id: &str) -> StoreResult<Option<PrincipalRow>> {
        let row = sqlx::query_as::<_, Row>(
            r#"
            SELECT id, hub_user_id, username, email, subscriptions,
                   last_login_at, created_at, updated_at
            FROM principals
            WHERE hub_user_id = $1
            "#,
        )
        .bind(hub_user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(PrincipalRow::from))
    }

    async fn create(&self, principal: CreatePrincipal) -> StoreResult<PrincipalRow> {
        let row = sqlx::query_as::<_, Row>(
            r#"
            INSERT INTO principals (id, hub_user_id, username, email,
                                    subscriptions, last_login_at)
            VALUES ($1, $2, $3, $4, $5, NOW())
            RETURNING id, hub_user_id, username, email, subscriptions,
                      last_login_at, created_at, updated_at
            "#,
        )
        .bind(principal.id)
        .bind(&principal.hub_user_id)
        .bind(&principal.username)
        .bind(&principal.email)
        .bind(Json(&principal.subscriptions))
        .fetch_one(&self.pool)
        .await?;

        Ok(row.into())
    }

    async fn record_login(
        &self,
        id: Uuid,
        username: &str,
        email: Option<&str>,
        subscriptions: &[Subscription],
        at: DateTime<Utc>,
    ) -> StoreResult<()> {
        sqlx::query(
            r#"
            UPDATE principals
            SET username = $2, email = $3, subscriptions = $4,
                last_login_at = $5, updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(username)
        .bind(email)
        .bind(Json(subscriptions))
        .bind(at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn replace_subscriptions(
        &self,
        id: Uuid,
        subscriptions: &[Subscription],
    ) -> StoreResult<()> {
        sqlx::query(
            r#"
            UPDATE principals
            SET subscriptions = $2, updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(Json(subscriptions))
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
