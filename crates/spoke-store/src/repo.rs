//! Repository traits
//!
//! Async store interfaces injected into the verifier and the entitlement
//! resolver. Implementations must be safe under request-parallel access.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use spoke_types::Subscription;
use uuid::Uuid;

use crate::error::StoreResult;
use crate::models::PrincipalRow;

/// Durable set of consumed token nonces
#[async_trait]
pub trait NonceLedger: Send + Sync {
    /// Record a nonce if it has never been seen
    ///
    /// Returns `true` when this call consumed the nonce, `false` when the
    /// nonce was already present. The check and the write are one atomic
    /// operation; two concurrent calls with the same nonce see exactly one
    /// `true` between them.
    async fn insert_if_absent(&self, nonce: &str, consumed_at: DateTime<Utc>) -> StoreResult<bool>;

    /// Drop nonces consumed before `cutoff`, returning how many were removed
    ///
    /// Pruning bounds ledger growth; it never runs on the request path.
    async fn prune_older_than(&self, cutoff: DateTime<Utc>) -> StoreResult<u64>;
}

/// Principal store
#[async_trait]
pub trait PrincipalRepository: Send + Sync {
    /// Find a principal by local ID
    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<PrincipalRow>>;

    /// Find a principal by its bound Hub user ID
    async fn find_by_hub_user_id(&self, hub_user_id: &str) -> StoreResult<Option<PrincipalRow>>;

    /// Create a new principal
    async fn create(&self, principal: CreatePrincipal) -> StoreResult<PrincipalRow>;

    /// Record a successful login: refresh identity fields and the
    /// subscription snapshot
    async fn record_login(
        &self,
        id: Uuid,
        username: &str,
        email: Option<&str>,
        subscriptions: &[Subscription],
        at: DateTime<Utc>,
    ) -> StoreResult<()>;

    /// Replace the stored subscription snapshot wholesale
    async fn replace_subscriptions(
        &self,
        id: Uuid,
        subscriptions: &[Subscription],
    ) -> StoreResult<()>;
}

/// Create principal input
#[derive(Debug, Clone)]
pub struct CreatePrincipal {
    pub id: Uuid,
    pub hub_user_id: String,
    pub username: String,
    pub email: Option<String>,
    pub subscriptions: Vec<Subscription>,
}
