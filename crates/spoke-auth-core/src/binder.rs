//! Session binding: validated identity to local principal

use chrono::Utc;
use std::sync::Arc;
use uuid::Uuid;

use spoke_store::{CreatePrincipal, PrincipalRepository, PrincipalRow};
use spoke_types::{SsoIdentity, Subscription};

use crate::AuthError;

/// Binds a validated Hub identity to a local principal record
///
/// First successful validation creates the principal; every later one
/// refreshes username, email, the subscription snapshot, and the
/// last-login timestamp.
pub struct SessionBinder<P> {
    repo: Arc<P>,
}

impl<P: PrincipalRepository> SessionBinder<P> {
    /// Create a new binder
    pub fn new(repo: Arc<P>) -> Self {
        Self { repo }
    }

    /// Create-or-update the principal bound to this identity
    pub async fn bind(
        &self,
        identity: &SsoIdentity,
        subscriptions: &[Subscription],
    ) -> Result<PrincipalRow, AuthError> {
        let now = Utc::now();

        if let Some(existing) = self.repo.find_by_hub_user_id(&identity.hub_user_id).await? {
            self.repo
                .record_login(
                    existing.id,
                    &identity.username,
                    identity.email.as_deref(),
                    subscriptions,
                    now,
                )
                .await?;
            return self
                .repo
                .find_by_id(existing.id)
                .await?
                .ok_or(AuthError::PrincipalNotFound);
        }

        tracing::info!(hub_user_id = %identity.hub_user_id, "Creating principal on first SSO login");
        let created = self
            .repo
            .create(CreatePrincipal {
                id: Uuid::new_v4(),
                hub_user_id: identity.hub_user_id.clone(),
                username: identity.username.clone(),
                email: identity.email.clone(),
                subscriptions: subscriptions.to_vec(),
            })
            .await?;
        Ok(created)
    }
}

impl<P> std::fmt::Debug for SessionBinder<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionBinder").finish()
    }
}
