//! Configuration for the Spoke API service.

use std::time::Duration;

use spoke_auth_core::SsoConfig;
use spoke_hub_client::HubConfig;

/// Spoke API configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP server port
    pub http_port: u16,

    /// Database URL
    pub database_url: String,

    /// Hub client configuration
    pub hub: HubConfig,

    /// SSO core configuration
    pub sso: SsoConfig,

    /// Shared secret for Hub webhook signatures, if configured
    pub webhook_secret: Option<String>,

    /// How often expired nonce records are pruned
    pub nonce_prune_interval: Duration,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        let database_url =
            std::env::var("DATABASE_URL").map_err(|_| ConfigError::Missing("DATABASE_URL"))?;

        let http_port = std::env::var("HTTP_PORT")
            .unwrap_or_else(|_| "8080".to_string())
            .parse()
            .map_err(|_| ConfigError::Invalid("HTTP_PORT"))?;

        // Hub connection
        let hub_base_url =
            std::env::var("HUB_BASE_URL").map_err(|_| ConfigError::Missing("HUB_BASE_URL"))?;
        let hub_service_token = std::env::var("HUB_SERVICE_TOKEN")
            .map_err(|_| ConfigError::Missing("HUB_SERVICE_TOKEN"))?;

        let hub_timeout_secs: u64 = std::env::var("HUB_TIMEOUT_SECS")
            .unwrap_or_else(|_| "5".to_string())
            .parse()
            .map_err(|_| ConfigError::Invalid("HUB_TIMEOUT_SECS"))?;

        let hub = HubConfig::new(hub_base_url, hub_service_token)
            .with_request_timeout(Duration::from_secs(hub_timeout_secs));

        // SSO verification. A missing key is tolerated at startup: every
        // validation then fails closed with a configuration_error reason.
        let sso = match std::env::var("HUB_PUBLIC_KEY_PEM") {
            Ok(pem) if !pem.trim().is_empty() => SsoConfig::new(pem),
            _ => {
                tracing::error!("HUB_PUBLIC_KEY_PEM not set, SSO validation will reject all tokens");
                SsoConfig::unconfigured()
            }
        };
        let sso = match std::env::var("APP_ID") {
            Ok(app_id) if !app_id.is_empty() => sso.with_expected_app_id(app_id),
            _ => sso,
        };

        let cache_ttl_secs: u64 = std::env::var("ENTITLEMENT_CACHE_TTL_SECS")
            .unwrap_or_else(|_| "300".to_string())
            .parse()
            .map_err(|_| ConfigError::Invalid("ENTITLEMENT_CACHE_TTL_SECS"))?;
        let sso = sso.with_entitlement_cache_ttl(Duration::from_secs(cache_ttl_secs));

        let webhook_secret = std::env::var("HUB_WEBHOOK_SECRET")
            .ok()
            .filter(|s| !s.is_empty());

        let nonce_prune_interval_secs: u64 = std::env::var("NONCE_PRUNE_INTERVAL_SECS")
            .unwrap_or_else(|_| "60".to_string())
            .parse()
            .map_err(|_| ConfigError::Invalid("NONCE_PRUNE_INTERVAL_SECS"))?;

        Ok(Self {
            http_port,
            database_url,
            hub,
            sso,
            webhook_secret,
            nonce_prune_interval: Duration::from_secs(nonce_prune_interval_secs),
        })
    }
}

/// Configuration error
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for environment variable: {0}")]
    Invalid(&'static str),
}
