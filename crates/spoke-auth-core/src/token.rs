//! SSO token verification with replay protection

use chrono::Utc;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use std::sync::Arc;
use subtle::ConstantTimeEq;

use spoke_hub_client::HubApi;
use spoke_store::NonceLedger;
use spoke_types::{RejectReason, SsoClaims, SsoIdentity, SsoValidation, Subscription};

use crate::SsoConfig;

/// SSO token verifier
///
/// Security properties:
/// - The signature algorithm is pinned to RS256; the token header cannot
///   substitute it
/// - The audience (`app_id`) is compared in constant time
/// - Nonce check-and-record is one atomic ledger operation, so two
///   concurrent validations of the same nonce admit at most one
/// - A missing verification key fails closed, never open
pub struct SsoVerifier<L, H> {
    config: SsoConfig,
    decoding_key: Option<DecodingKey>,
    ledger: Arc<L>,
    hub: Arc<H>,
}

impl<L: NonceLedger, H: HubApi> SsoVerifier<L, H> {
    /// Create a new verifier
    ///
    /// A malformed PEM is treated the same as an absent key: every
    /// validation reports `ConfigurationError` until the key is fixed.
    pub fn new(config: SsoConfig, ledger: Arc<L>, hub: Arc<H>) -> Self {
        let decoding_key = config.verification_key_pem.as_deref().and_then(|pem| {
            match DecodingKey::from_rsa_pem(pem.as_bytes()) {
                Ok(key) => Some(key),
                Err(e) => {
                    tracing::error!("Hub verification key PEM is invalid: {}", e);
                    None
                }
            }
        });

        Self {
            config,
            decoding_key,
            ledger,
            hub,
        }
    }

    /// Validate an SSO token end to end
    ///
    /// Local verification (signature, expiry, audience, nonce) decides
    /// authentication; the follow-up Hub revalidation is best-effort and
    /// only overrides the result when the Hub positively rejects the
    /// token. A Hub that is merely unreachable degrades to token data.
    pub async fn validate(&self, token: &str) -> SsoValidation {
        if token.trim().is_empty() {
            return SsoValidation::invalid(RejectReason::NoToken);
        }

        let Some(decoding_key) = self.decoding_key.as_ref() else {
            tracing::error!("Hub verification key not configured");
            return SsoValidation::invalid(RejectReason::ConfigurationError);
        };

        // Pinned algorithm; aud/iss are checked manually below. No clock
        // leeway: a past `exp` is expired, full stop.
        let mut validation = Validation::new(Algorithm::RS256);
        validation.validate_aud = false;
        validation.leeway = 0;

        let claims = match decode::<SsoClaims>(token, decoding_key, &validation) {
            Ok(data) => data.claims,
            Err(e) => {
                tracing::debug!("SSO token decode failed: {}", e);
                let reason = match e.kind() {
                    jsonwebtoken::errors::ErrorKind::ExpiredSignature => RejectReason::TokenExpired,
                    jsonwebtoken::errors::ErrorKind::InvalidSignature => {
                        RejectReason::InvalidSignature
                    }
                    _ => RejectReason::ValidationError,
                };
                return SsoValidation::invalid(reason);
            }
        };

        // Reject tokens minted for a sibling application
        if let Some(expected) = self.config.expected_app_id.as_deref() {
            let matches = claims.app_id.as_deref().is_some_and(|app_id| {
                app_id.as_bytes().ct_eq(expected.as_bytes()).into()
            });
            if !matches {
                tracing::warn!(
                    expected,
                    got = claims.app_id.as_deref().unwrap_or("<none>"),
                    "SSO token app_id mismatch"
                );
                return SsoValidation::invalid(RejectReason::WrongApp);
            }
        }

        // Replay protection: the nonce is consumed atomically and is final
        // from this point on, whatever happens to the rest of the request
        if let Some(nonce) = claims.nonce.as_deref() {
            match self.ledger.insert_if_absent(nonce, Utc::now()).await {
                Ok(true) => {}
                Ok(false) => {
                    tracing::warn!(nonce, "SSO token nonce already consumed");
                    return SsoValidation::invalid(RejectReason::NonceReused);
                }
                Err(e) => {
                    // Without the ledger we cannot rule out replay
                    tracing::error!("Nonce ledger unavailable: {}", e);
                    return SsoValidation::invalid(RejectReason::ValidationError);
                }
            }
        }

        self.confirm_with_hub(token, claims).await
    }

    /// Best-effort Hub re-confirmation after local verification
    async fn confirm_with_hub(&self, token: &str, claims: SsoClaims) -> SsoValidation {
        match self.hub.revalidate(token).await {
            Ok(verdict) if !verdict.valid => {
                // The Hub can revoke tokens it issued; remote authority
                // overrides local signature validity
                tracing::warn!(
                    reason = verdict.error.as_deref().unwrap_or("unspecified"),
                    "Hub rejected a locally-verified SSO token"
                );
                SsoValidation::invalid(RejectReason::HubRejected)
            }
            Ok(verdict) => {
                let identity = SsoIdentity {
                    hub_user_id: verdict.user_id.unwrap_or(claims.user_id),
                    username: verdict.username.unwrap_or(claims.username),
                    email: verdict.email.or(claims.email),
                };
                let subscriptions: Vec<Subscription> =
                    verdict.subscriptions.unwrap_or(claims.subscriptions);
                SsoValidation::Valid {
                    identity,
                    subscriptions,
                }
            }
            Err(e) => {
                // A verified signature plus unexpired timestamp is enough
                // for short-lived access without remote confirmation
                tracing::warn!("Hub revalidation unavailable, using token data: {}", e);
                SsoValidation::Valid {
                    identity: SsoIdentity {
                        hub_user_id: claims.user_id,
                        username: claims.username,
                        email: claims.email,
                    },
                    subscriptions: claims.subscriptions,
                }
            }
        }
    }
}

impl<L, H> std::fmt::Debug for SsoVerifier<L, H> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SsoVerifier")
            .field("expected_app_id", &self.config.expected_app_id)
            .field("key_configured", &self.decoding_key.is_some())
            .finish_non_exhaustive()
    }
}
