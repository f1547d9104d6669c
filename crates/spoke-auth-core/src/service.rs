//! SSO service - ties together verification, binding, and entitlements

use chrono::{Duration as ChronoDuration, Utc};
use std::sync::Arc;

use spoke_hub_client::HubApi;
use spoke_store::{NonceLedger, PrincipalRepository, PrincipalRow};
use spoke_types::{PrincipalId, SsoValidation};

use crate::{
    binder::SessionBinder,
    entitlement::EntitlementResolver,
    token::SsoVerifier,
    webhook::{HubEvent, HubWebhookVerifier},
    AuthError, SsoConfig,
};

/// SSO service
///
/// Unified interface for:
/// - SSO token validation (signature, replay, Hub re-confirmation)
/// - Login: validation plus principal create-or-update
/// - Entitlement checks and cache invalidation
/// - Hub webhook handling and nonce-ledger upkeep
pub struct SsoService<P, L, H> {
    config: SsoConfig,
    verifier: SsoVerifier<L, H>,
    resolver: EntitlementResolver<P, H>,
    binder: SessionBinder<P>,
    principal_repo: Arc<P>,
    ledger: Arc<L>,
    webhook: Option<HubWebhookVerifier>,
}

impl<P, L, H> SsoService<P, L, H>
where
    P: PrincipalRepository,
    L: NonceLedger,
    H: HubApi,
{
    /// Create a new SSO service
    pub fn new(config: SsoConfig, principal_repo: Arc<P>, ledger: Arc<L>, hub: Arc<H>) -> Self {
        Self {
            verifier: SsoVerifier::new(config.clone(), Arc::clone(&ledger), Arc::clone(&hub)),
            resolver: EntitlementResolver::new(&config, Arc::clone(&principal_repo), hub),
            binder: SessionBinder::new(Arc::clone(&principal_repo)),
            principal_repo,
            ledger,
            webhook: None,
            config,
        }
    }

    /// Enable webhook handling with the shared Hub secret
    #[must_use]
    pub fn with_webhook_secret(mut self, secret: impl Into<String>) -> Self {
        self.webhook = Some(HubWebhookVerifier::new(secret));
        self
    }

    // =========================================================================
    // Token Validation & Login
    // =========================================================================

    /// Validate an SSO token without touching the principal store
    pub async fn validate_token(&self, token: &str) -> SsoValidation {
        self.verifier.validate(token).await
    }

    /// Validate an SSO token and bind the identity to a local principal
    pub async fn login(&self, token: &str) -> Result<PrincipalRow, AuthError> {
        match self.verifier.validate(token).await {
            SsoValidation::Valid {
                identity,
                subscriptions,
            } => self.binder.bind(&identity, &subscriptions).await,
            SsoValidation::Invalid { reason } => Err(AuthError::SsoRejected(reason)),
        }
    }

    // =========================================================================
    // Entitlements
    // =========================================================================

    /// Check whether a principal holds any of the required products
    pub async fn has_entitlement(&self, principal_id: &PrincipalId, required: &[String]) -> bool {
        self.resolver.has_entitlement(principal_id, required).await
    }

    /// Purge all cached entitlement decisions for a Hub user
    pub fn purge_entitlement_cache(&self, hub_user_id: &str) {
        self.resolver.purge_cache(hub_user_id);
    }

    // =========================================================================
    // Webhooks & Upkeep
    // =========================================================================

    /// Handle a Hub webhook delivery
    ///
    /// Verifies the signature, purges stale entitlement decisions, and
    /// stores a fresh subscription snapshot when the event carried one.
    pub async fn handle_webhook(&self, payload: &[u8], signature: &str) -> Result<(), AuthError> {
        let verifier = self
            .webhook
            .as_ref()
            .ok_or_else(|| AuthError::Configuration("webhook secret not configured".to_string()))?;

        match verifier.parse(payload, signature)? {
            HubEvent::SubscriptionChanged {
                hub_user_id,
                subscriptions,
            } => {
                tracing::info!(%hub_user_id, "Hub subscription change, purging entitlement cache");
                self.resolver.purge_cache(&hub_user_id);

                if let Some(snapshot) = subscriptions {
                    if let Some(principal) =
                        self.principal_repo.find_by_hub_user_id(&hub_user_id).await?
                    {
                        self.principal_repo
                            .replace_subscriptions(principal.id, &snapshot)
                            .await?;
                    }
                }
                Ok(())
            }
            HubEvent::Unknown(_) => Ok(()),
        }
    }

    /// Drop nonce records older than the retention window
    ///
    /// Safe to run on a fixed interval independent of request traffic.
    pub async fn prune_nonces(&self) -> Result<u64, AuthError> {
        let retention = ChronoDuration::from_std(self.config.nonce_retention)
            .map_err(|e| AuthError::Configuration(format!("nonce retention: {e}")))?;
        let cutoff = Utc::now() - retention;
        Ok(self.ledger.prune_older_than(cutoff).await?)
    }

    /// The active configuration
    pub fn config(&self) -> &SsoConfig {
        &self.config
    }

    /// Resolver handle (test hook for cache maintenance)
    #[doc(hidden)]
    pub fn resolver(&self) -> &EntitlementResolver<P, H> {
        &self.resolver
    }
}

impl<P, L, H> std::fmt::Debug for SsoService<P, L, H> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SsoService")
            .field("expected_app_id", &self.config.expected_app_id)
            .finish_non_exhaustive()
    }
}
