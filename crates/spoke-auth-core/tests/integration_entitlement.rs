//! Integration tests for entitlement resolution
//!
//! Local-first evaluation, TTL-cached Hub refreshes with call-count
//! assertions, wholesale snapshot replacement, webhook-driven purge, and
//! degradation when the Hub is down.

mod common;

use std::sync::Arc;

use chrono::{Duration, Utc};
use common::{HubMockServer, TEST_PUBLIC_KEY_PEM};
use spoke_auth_core::{SsoConfig, SsoService};
use spoke_hub_client::HubClient;
use spoke_store::{CreatePrincipal, MemoryNonceLedger, MemoryPrincipalRepository, PrincipalRepository};
use spoke_types::{PrincipalId, Subscription, SubscriptionStatus};
use uuid::Uuid;

const WEBHOOK_SECRET: &str = "whsec_entitlement_tests";

struct Setup {
    service: SsoService<MemoryPrincipalRepository, MemoryNonceLedger, HubClient>,
    principals: Arc<MemoryPrincipalRepository>,
}

fn setup(hub: &HubMockServer) -> Setup {
    let principals = Arc::new(MemoryPrincipalRepository::new());
    let service = SsoService::new(
        SsoConfig::new(TEST_PUBLIC_KEY_PEM),
        Arc::clone(&principals),
        Arc::new(MemoryNonceLedger::new()),
        Arc::new(hub.client()),
    )
    .with_webhook_secret(WEBHOOK_SECRET);
    Setup {
        service,
        principals,
    }
}

async fn seed_principal(
    principals: &MemoryPrincipalRepository,
    hub_user_id: &str,
    subscriptions: Vec<Subscription>,
) -> PrincipalId {
    let row = principals
        .create(CreatePrincipal {
            id: Uuid::new_v4(),
            hub_user_id: hub_user_id.to_string(),
            username: "alice".to_string(),
            email: None,
            subscriptions,
        })
        .await
        .unwrap();
    row.principal_id()
}

fn active(product: &str, valid_until: Option<chrono::DateTime<Utc>>) -> Subscription {
    Subscription {
        product_id: product.to_string(),
        status: SubscriptionStatus::Active,
        valid_until,
    }
}

fn required(products: &[&str]) -> Vec<String> {
    products.iter().map(|p| p.to_string()).collect()
}

#[tokio::test]
async fn test_empty_requirement_is_always_granted() {
    let hub = HubMockServer::start().await;
    let s = setup(&hub);

    // Even for a principal that does not exist
    let unknown = PrincipalId::new();
    assert!(s.service.has_entitlement(&unknown, &[]).await);

    let known = seed_principal(&s.principals, "hub-1", vec![]).await;
    assert!(s.service.has_entitlement(&known, &[]).await);
}

#[tokio::test]
async fn test_unknown_principal_is_denied() {
    let hub = HubMockServer::start().await;
    let s = setup(&hub);

    let unknown = PrincipalId::new();
    assert!(!s.service.has_entitlement(&unknown, &required(&["pro"])).await);
}

#[tokio::test]
async fn test_local_active_subscription_grants_without_remote_call() {
    let hub = HubMockServer::start().await;
    let s = setup(&hub);
    let guard = hub
        .expect_subscription_calls(serde_json::json!([]), 0)
        .await;

    let future = Some(Utc::now() + Duration::days(30));
    let p = seed_principal(&s.principals, "hub-1", vec![active("pro", future)]).await;

    assert!(s.service.has_entitlement(&p, &required(&["pro"])).await);
    drop(guard); // asserts zero Hub calls
}

#[tokio::test]
async fn test_expired_local_subscription_triggers_refresh_and_replace() {
    let hub = HubMockServer::start().await;
    let s = setup(&hub);

    let fresh_until = Utc::now() + Duration::days(30);
    let _guard = hub
        .expect_subscription_calls(
            serde_json::json!([
                { "product_id": "pro", "status": "active", "valid_until": fresh_until }
            ]),
            1,
        )
        .await;

    let stale = Some(Utc::now() - Duration::days(1));
    let p = seed_principal(&s.principals, "hub-1", vec![active("pro", stale)]).await;

    assert!(s.service.has_entitlement(&p, &required(&["pro"])).await);

    // The stored snapshot was replaced wholesale with the Hub's answer
    let stored = s.principals.find_by_id(p.0).await.unwrap().unwrap();
    assert_eq!(stored.subscriptions.len(), 1);
    assert_eq!(stored.subscriptions[0].product_id, "pro");
    assert!(stored.subscriptions[0].valid_until.unwrap() > Utc::now());
}

#[tokio::test]
async fn test_repeat_checks_inside_ttl_hit_cache_not_hub() {
    let hub = HubMockServer::start().await;
    let s = setup(&hub);
    let _guard = hub
        .expect_subscription_calls(serde_json::json!([]), 1)
        .await;

    let p = seed_principal(&s.principals, "hub-1", vec![]).await;

    // First miss goes remote and caches the denial; repeats stay local
    for _ in 0..3 {
        assert!(!s.service.has_entitlement(&p, &required(&["pro"])).await);
    }

    // Same set in a different order canonicalizes to the same cache key
    assert!(
        !s.service
            .has_entitlement(&p, &required(&["pro", "pro"]))
            .await
    );
}

#[tokio::test]
async fn test_distinct_product_sets_do_not_share_cache_entries() {
    let hub = HubMockServer::start().await;
    let s = setup(&hub);
    // Coupled cache keying: two different requested sets, two Hub calls
    let _guard = hub
        .expect_subscription_calls(serde_json::json!([]), 2)
        .await;

    let p = seed_principal(&s.principals, "hub-1", vec![]).await;
    assert!(!s.service.has_entitlement(&p, &required(&["pro"])).await);
    assert!(
        !s.service
            .has_entitlement(&p, &required(&["pro", "team"]))
            .await
    );
}

#[tokio::test]
async fn test_hub_outage_falls_back_to_local_answer() {
    let hub = HubMockServer::start().await;
    hub.mock_subscriptions_unavailable().await;
    let s = setup(&hub);

    let stale = Some(Utc::now() - Duration::days(1));
    let p = seed_principal(&s.principals, "hub-1", vec![active("pro", stale)]).await;

    // Local answer is "no", the Hub is down: the check degrades, it does
    // not error
    assert!(!s.service.has_entitlement(&p, &required(&["pro"])).await);

    // And a locally-satisfiable requirement never needs the Hub at all
    let q = seed_principal(&s.principals, "hub-2", vec![active("team", None)]).await;
    assert!(s.service.has_entitlement(&q, &required(&["team"])).await);
}

#[tokio::test]
async fn test_webhook_purges_cache_and_stores_snapshot() {
    let hub = HubMockServer::start().await;
    let s = setup(&hub);

    let p = seed_principal(&s.principals, "hub-1", vec![]).await;

    {
        let _guard = hub
            .expect_subscription_calls(serde_json::json!([]), 1)
            .await;
        assert!(!s.service.has_entitlement(&p, &required(&["pro"])).await);
        // Cached now; a repeat stays local
        assert!(!s.service.has_entitlement(&p, &required(&["pro"])).await);
    }

    // Hub signals a subscription change carrying the fresh snapshot
    let body = serde_json::json!({
        "id": "evt_1",
        "type": "subscription.changed",
        "data": {
            "hub_user_id": "hub-1",
            "subscriptions": [
                { "product_id": "pro", "status": "active" }
            ]
        }
    })
    .to_string()
    .into_bytes();
    let signature = spoke_auth_core::HubWebhookVerifier::new(WEBHOOK_SECRET)
        .sign(&body, Utc::now().timestamp());
    s.service.handle_webhook(&body, &signature).await.unwrap();
    s.service.resolver().run_pending_tasks().await;

    // The snapshot landed, so the check is now granted locally
    let stored = s.principals.find_by_id(p.0).await.unwrap().unwrap();
    assert_eq!(stored.subscriptions.len(), 1);
    assert!(s.service.has_entitlement(&p, &required(&["pro"])).await);
}

#[tokio::test]
async fn test_webhook_with_bad_signature_is_rejected() {
    let hub = HubMockServer::start().await;
    let s = setup(&hub);

    let body = br#"{"id":"evt_1","type":"subscription.changed","data":{"hub_user_id":"hub-1"}}"#;
    let forged = spoke_auth_core::HubWebhookVerifier::new("wrong-secret")
        .sign(body, Utc::now().timestamp());
    assert!(s.service.handle_webhook(body, &forged).await.is_err());
}

#[tokio::test]
async fn test_purge_forces_next_check_back_to_hub() {
    let hub = HubMockServer::start().await;
    let s = setup(&hub);
    let _guard = hub
        .expect_subscription_calls(serde_json::json!([]), 2)
        .await;

    let p = seed_principal(&s.principals, "hub-1", vec![]).await;

    assert!(!s.service.has_entitlement(&p, &required(&["pro"])).await);
    s.service.purge_entitlement_cache("hub-1");
    s.service.resolver().run_pending_tasks().await;
    assert!(!s.service.has_entitlement(&p, &required(&["pro"])).await);
}
