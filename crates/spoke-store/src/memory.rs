//! In-memory store implementations
//!
//! DashMap-backed stores suitable for a single-process deployment and for
//! tests. The nonce `entry()` insert is the atomic check-and-record the
//! ledger contract requires.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use spoke_types::Subscription;
use std::sync::Arc;
use uuid::Uuid;

use crate::error::StoreResult;
use crate::models::PrincipalRow;
use crate::repo::{CreatePrincipal, NonceLedger, PrincipalRepository};

/// In-memory nonce ledger
#[derive(Default, Clone)]
pub struct MemoryNonceLedger {
    consumed: Arc<DashMap<String, DateTime<Utc>>>,
}

impl MemoryNonceLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live nonce records
    pub fn len(&self) -> usize {
        self.consumed.len()
    }

    /// Whether the ledger holds no records
    pub fn is_empty(&self) -> bool {
        self.consumed.is_empty()
    }
}

#[async_trait]
impl NonceLedger for MemoryNonceLedger {
    async fn insert_if_absent(&self, nonce: &str, consumed_at: DateTime<Utc>) -> StoreResult<bool> {
        match self.consumed.entry(nonce.to_string()) {
            Entry::Occupied(_) => Ok(false),
            Entry::Vacant(slot) => {
                slot.insert(consumed_at);
                Ok(true)
            }
        }
    }

    async fn prune_older_than(&self, cutoff: DateTime<Utc>) -> StoreResult<u64> {
        let before = self.consumed.len();
        self.consumed.retain(|_, consumed_at| *consumed_at >= cutoff);
        Ok((before - self.consumed.len()) as u64)
    }
}

/// In-memory principal repository
#[derive(Default, Clone)]
pub struct MemoryPrincipalRepository {
    principals: Arc<DashMap<Uuid, PrincipalRow>>,
    by_hub_user_id: Arc<DashMap<String, Uuid>>,
}

impl MemoryPrincipalRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a principal row directly (test setup)
    pub fn insert_principal(&self, row: PrincipalRow) {
        self.by_hub_user_id.insert(row.hub_user_id.clone(), row.id);
        self.principals.insert(row.id, row);
    }
}

#[async_trait]
impl PrincipalRepository for MemoryPrincipalRepository {
    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<PrincipalRow>> {
        Ok(self.principals.get(&id).map(|r| r.value().clone()))
    }

    async fn find_by_hub_user_id(&self, hub_user_id: &str) -> StoreResult<Option<PrincipalRow>> {
        Ok(self
            .by_hub_user_id
            .get(hub_user_id)
            .and_then(|id| self.principals.get(id.value()).map(|r| r.value().clone())))
    }

    async fn create(&self, principal: CreatePrincipal) -> StoreResult<PrincipalRow> {
        let now = Utc::now();
        let row = PrincipalRow {
            id: principal.id,
            hub_user_id: principal.hub_user_id,
            username: principal.username,
            email: principal.email,
            subscriptions: principal.subscriptions,
            last_login_at: now,
            created_at: now,
            updated_at: now,
        };
        self.insert_principal(row.clone());
        Ok(row)
    }

    async fn record_login(
        &self,
        id: Uuid,
        username: &str,
        email: Option<&str>,
        subscriptions: &[Subscription],
        at: DateTime<Utc>,
    ) -> StoreResult<()> {
        if let Some(mut row) = self.principals.get_mut(&id) {
            row.username = username.to_string();
            row.email = email.map(String::from);
            row.subscriptions = subscriptions.to_vec();
            row.last_login_at = at;
            row.updated_at = Utc::now();
        }
        Ok(())
    }

    async fn replace_subscriptions(
        &self,
        id: Uuid,
        subscriptions: &[Subscription],
    ) -> StoreResult<()> {
        if let Some(mut row) = self.principals.get_mut(&id) {
            row.subscriptions = subscriptions.to_vec();
            row.updated_at = Utc::now();
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use spoke_types::SubscriptionStatus;

    #[tokio::test]
    async fn test_nonce_insert_if_absent() {
        let ledger = MemoryNonceLedger::new();
        let now = Utc::now();

        assert!(ledger.insert_if_absent("n-1", now).await.unwrap());
        assert!(!ledger.insert_if_absent("n-1", now).await.unwrap());
        assert!(ledger.insert_if_absent("n-2", now).await.unwrap());
        assert_eq!(ledger.len(), 2);
    }

    #[tokio::test]
    async fn test_nonce_insert_concurrent_single_winner() {
        let ledger = Arc::new(MemoryNonceLedger::new());
        let mut handles = Vec::new();
        for _ in 0..16 {
            let ledger = Arc::clone(&ledger);
            handles.push(tokio::spawn(async move {
                ledger.insert_if_absent("race", Utc::now()).await.unwrap()
            }));
        }

        let mut winners = 0;
        for handle in handles {
            if handle.await.unwrap() {
                winners += 1;
            }
        }
        assert_eq!(winners, 1);
    }

    #[tokio::test]
    async fn test_nonce_prune() {
        let ledger = MemoryNonceLedger::new();
        let now = Utc::now();
        let old = now - chrono::Duration::minutes(20);

        ledger.insert_if_absent("old", old).await.unwrap();
        ledger.insert_if_absent("fresh", now).await.unwrap();

        let removed = ledger
            .prune_older_than(now - chrono::Duration::minutes(10))
            .await
            .unwrap();
        assert_eq!(removed, 1);
        assert_eq!(ledger.len(), 1);

        // Pruning does not release the nonce for reuse semantics we rely on
        // elsewhere; it merely bounds growth after the token lifetime.
        assert!(ledger.insert_if_absent("old", now).await.unwrap());
    }

    #[tokio::test]
    async fn test_principal_create_and_lookup() {
        let repo = MemoryPrincipalRepository::new();
        let row = repo
            .create(CreatePrincipal {
                id: Uuid::new_v4(),
                hub_user_id: "hub-1".to_string(),
                username: "alice".to_string(),
                email: Some("alice@example.com".to_string()),
                subscriptions: vec![],
            })
            .await
            .unwrap();

        let by_id = repo.find_by_id(row.id).await.unwrap().unwrap();
        assert_eq!(by_id.username, "alice");

        let by_hub = repo.find_by_hub_user_id("hub-1").await.unwrap().unwrap();
        assert_eq!(by_hub.id, row.id);
    }

    #[tokio::test]
    async fn test_replace_subscriptions_is_wholesale() {
        let repo = MemoryPrincipalRepository::new();
        let row = repo
            .create(CreatePrincipal {
                id: Uuid::new_v4(),
                hub_user_id: "hub-1".to_string(),
                username: "alice".to_string(),
                email: None,
                subscriptions: vec![Subscription {
                    product_id: "pro".to_string(),
                    status: SubscriptionStatus::Expired,
                    valid_until: None,
                }],
            })
            .await
            .unwrap();

        let fresh = vec![Subscription {
            product_id: "team".to_string(),
            status: SubscriptionStatus::Active,
            valid_until: None,
        }];
        repo.replace_subscriptions(row.id, &fresh).await.unwrap();

        let stored = repo.find_by_id(row.id).await.unwrap().unwrap();
        assert_eq!(stored.subscriptions, fresh);
    }
}
