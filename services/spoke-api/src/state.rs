//! Application state

use std::ops::Deref;
use std::sync::Arc;

use spoke_auth_core::SsoService;
use spoke_hub_client::HubClient;
use spoke_relay::MessageRelay;
use spoke_store::pg::{PgNonceLedger, PgPrincipalRepository};
use spoke_store::DbPool;

use crate::config::Config;

/// Type alias for the SSO service with concrete store types
pub type SsoServiceImpl = SsoService<PgPrincipalRepository, PgNonceLedger, HubClient>;

/// Shared database pool wrapper for health checks
#[derive(Clone)]
pub struct SharedPool(Arc<DbPool>);

impl Deref for SharedPool {
    type Target = DbPool;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// SSO, entitlement, and webhook logic
    pub sso: Arc<SsoServiceImpl>,
    /// Principal store (chat author lookups)
    pub principals: Arc<PgPrincipalRepository>,
    /// In-process chat relay
    pub relay: Arc<MessageRelay>,
    /// Database connection pool (shared reference for health checks)
    pub pool: SharedPool,
    /// Application configuration
    pub config: Arc<Config>,
}

impl AppState {
    /// Create new application state
    pub fn new(
        sso: SsoServiceImpl,
        principals: Arc<PgPrincipalRepository>,
        relay: MessageRelay,
        pool: DbPool,
        config: Config,
    ) -> Self {
        Self {
            sso: Arc::new(sso),
            principals,
            relay: Arc::new(relay),
            pool: SharedPool(Arc::new(pool)),
            config: Arc::new(config),
        }
    }
}
