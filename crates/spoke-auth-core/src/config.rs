//! Configuration types for the SSO core

use std::time::Duration;

/// SSO core configuration
///
/// The verification key is optional on purpose: a missing key makes every
/// validation fail closed with `ConfigurationError` instead of panicking
/// at startup, so operators can tell a deployment fault from an attack.
#[derive(Debug, Clone)]
pub struct SsoConfig {
    /// Hub RS256 public verification key, PEM-encoded
    pub verification_key_pem: Option<String>,
    /// Audience this spoke expects in `app_id`; unchecked when unset
    pub expected_app_id: Option<String>,
    /// TTL of the entitlement decision cache
    pub entitlement_cache_ttl: Duration,
    /// How long consumed nonces are retained before pruning
    pub nonce_retention: Duration,
}

impl SsoConfig {
    /// Create a new SSO config with reference-policy defaults
    pub fn new(verification_key_pem: impl Into<String>) -> Self {
        Self {
            verification_key_pem: Some(verification_key_pem.into()),
            expected_app_id: None,
            entitlement_cache_ttl: Duration::from_secs(5 * 60),
            nonce_retention: Duration::from_secs(10 * 60),
        }
    }

    /// Config without a verification key; every validation fails closed
    pub fn unconfigured() -> Self {
        Self {
            verification_key_pem: None,
            expected_app_id: None,
            entitlement_cache_ttl: Duration::from_secs(5 * 60),
            nonce_retention: Duration::from_secs(10 * 60),
        }
    }

    /// Set the expected application audience
    #[must_use]
    pub fn with_expected_app_id(mut self, app_id: impl Into<String>) -> Self {
        self.expected_app_id = Some(app_id.into());
        self
    }

    /// Set the entitlement cache TTL
    #[must_use]
    pub fn with_entitlement_cache_ttl(mut self, ttl: Duration) -> Self {
        self.entitlement_cache_ttl = ttl;
        self
    }

    /// Set the nonce retention window
    #[must_use]
    pub fn with_nonce_retention(mut self, retention: Duration) -> Self {
        self.nonce_retention = retention;
        self
    }
}
