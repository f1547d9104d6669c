//! Entitlement resolution with local-first refresh

use chrono::Utc;
use moka::future::Cache;
use std::sync::Arc;

use spoke_hub_client::HubApi;
use spoke_store::PrincipalRepository;
use spoke_types::{satisfies, PrincipalId, Subscription};

use crate::SsoConfig;

/// Cache key: one entry per (Hub user, exact requested product set)
///
/// Two callers asking for overlapping-but-different product sets do not
/// share an entry and may each trigger a refresh. Known inefficiency,
/// kept for contract compatibility.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct EntitlementKey {
    hub_user_id: String,
    products: Vec<String>,
}

/// Cached outcome of a Hub refresh
#[derive(Debug, Clone)]
struct EntitlementDecision {
    has_access: bool,
    #[allow(dead_code)] // snapshot retained for future delta logging
    subscriptions: Vec<Subscription>,
}

/// Entitlement resolver
///
/// Decides whether a principal's subscriptions satisfy a required product
/// set: local snapshot first, then a TTL-cached Hub refresh, degrading to
/// the local answer whenever the Hub is unreachable. The boolean contract
/// is infallible; dependency faults never surface to the caller.
#[derive(Clone)]
pub struct EntitlementResolver<P, H> {
    repo: Arc<P>,
    hub: Arc<H>,
    cache: Cache<EntitlementKey, EntitlementDecision>,
}

/// Sort and dedupe a required product set into its canonical cache form
fn canonical_products(required: &[String]) -> Vec<String> {
    let mut products: Vec<String> = required.to_vec();
    products.sort();
    products.dedup();
    products
}

impl<P: PrincipalRepository, H: HubApi> EntitlementResolver<P, H> {
    /// Create a new resolver with the configured cache TTL
    pub fn new(config: &SsoConfig, repo: Arc<P>, hub: Arc<H>) -> Self {
        Self {
            repo,
            hub,
            cache: Cache::builder()
                .time_to_live(config.entitlement_cache_ttl)
                .max_capacity(10_000)
                .support_invalidation_closures()
                .build(),
        }
    }

    /// Check whether a principal holds any of the required products
    ///
    /// Evaluation order: empty requirement, local snapshot, decision
    /// cache, Hub refresh, local fallback.
    pub async fn has_entitlement(&self, principal_id: &PrincipalId, required: &[String]) -> bool {
        // No entitlement required
        if required.is_empty() {
            return true;
        }

        let principal = match self.repo.find_by_id(principal_id.0).await {
            Ok(Some(row)) => row,
            Ok(None) => return false,
            Err(e) => {
                tracing::warn!("Principal lookup failed during entitlement check: {}", e);
                return false;
            }
        };

        let now = Utc::now();
        let local = satisfies(&principal.subscriptions, required, now);
        if local {
            return true;
        }

        let key = EntitlementKey {
            hub_user_id: principal.hub_user_id.clone(),
            products: canonical_products(required),
        };

        if let Some(decision) = self.cache.get(&key).await {
            return decision.has_access;
        }

        match self
            .hub
            .refresh_subscriptions(&principal.hub_user_id, &key.products)
            .await
        {
            Ok(refresh) => {
                // Replace, never merge, the stored snapshot
                if let Err(e) = self
                    .repo
                    .replace_subscriptions(principal.id, &refresh.subscriptions)
                    .await
                {
                    tracing::warn!("Failed to store refreshed subscriptions: {}", e);
                }

                let has_access = satisfies(&refresh.subscriptions, required, now);
                self.cache
                    .insert(
                        key,
                        EntitlementDecision {
                            has_access,
                            subscriptions: refresh.subscriptions,
                        },
                    )
                    .await;
                has_access
            }
            Err(e) => {
                tracing::warn!(
                    hub_user_id = %principal.hub_user_id,
                    "Subscription refresh failed, falling back to local data: {}", e
                );
                local
            }
        }
    }

    /// Purge every cached decision for a Hub user, whatever product set
    /// it was keyed under
    pub fn purge_cache(&self, hub_user_id: &str) {
        let hub_user_id = hub_user_id.to_string();
        if let Err(e) = self
            .cache
            .invalidate_entries_if(move |key, _| key.hub_user_id == hub_user_id)
        {
            tracing::error!("Entitlement cache purge failed: {}", e);
        }
    }

    /// Sync pending cache maintenance (test hook)
    #[doc(hidden)]
    pub async fn run_pending_tasks(&self) {
        self.cache.run_pending_tasks().await;
    }
}

impl<P, H> std::fmt::Debug for EntitlementResolver<P, H> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EntitlementResolver").finish()
    }
}
