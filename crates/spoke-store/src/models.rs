//! Store row models

use chrono::{DateTime, Utc};
use spoke_types::{PrincipalId, Subscription};
use uuid::Uuid;

/// Local principal bound 1:1 to a Hub user
#[derive(Debug, Clone)]
pub struct PrincipalRow {
    /// Local identifier
    pub id: Uuid,
    /// Hub subject this principal is bound to
    pub hub_user_id: String,
    /// Username as of the last login
    pub username: String,
    /// Email as of the last login
    pub email: Option<String>,
    /// Last-known subscription snapshot
    pub subscriptions: Vec<Subscription>,
    /// Last successful SSO validation
    pub last_login_at: DateTime<Utc>,
    /// When the principal was created
    pub created_at: DateTime<Utc>,
    /// When the principal was last updated
    pub updated_at: DateTime<Utc>,
}

impl PrincipalRow {
    /// Typed principal ID
    pub fn principal_id(&self) -> PrincipalId {
        PrincipalId(self.id)
    }
}
