//! Hub webhook verification and parsing
//!
//! The Hub pushes subscription-change events so the spoke can purge its
//! entitlement cache ahead of the TTL. Events are authenticated with an
//! HMAC-SHA256 signature header of the form `t=<unix>,v1=<hex>` over
//! `"{t}.{body}"`.

use std::time::Duration;

use chrono::Utc;
use hmac::{Hmac, Mac};
use serde::Deserialize;
use sha2::Sha256;
use subtle::ConstantTimeEq;

use spoke_types::Subscription;

use crate::AuthError;

/// Parsed Hub event
#[derive(Debug, Clone)]
pub enum HubEvent {
    /// A user's subscriptions changed; cached decisions for them are stale
    SubscriptionChanged {
        hub_user_id: String,
        /// Fresh snapshot, when the Hub included one
        subscriptions: Option<Vec<Subscription>>,
    },
    /// Event type this build does not handle
    Unknown(String),
}

#[derive(Deserialize)]
struct RawEvent {
    #[serde(rename = "type")]
    event_type: String,
    data: RawEventData,
}

#[derive(Deserialize)]
struct RawEventData {
    #[serde(default)]
    hub_user_id: Option<String>,
    #[serde(default)]
    subscriptions: Option<Vec<Subscription>>,
}

/// Verifies and parses Hub webhook deliveries
///
/// A delivery is accepted only when its signed timestamp is within the
/// tolerance window, so a captured delivery cannot be replayed later.
pub struct HubWebhookVerifier {
    secret: String,
    tolerance: Duration,
}

impl HubWebhookVerifier {
    /// Create a verifier for the shared webhook secret
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
            tolerance: Duration::from_secs(5 * 60),
        }
    }

    /// Set how far a delivery's signed timestamp may drift from now
    #[must_use]
    pub fn with_tolerance(mut self, tolerance: Duration) -> Self {
        self.tolerance = tolerance;
        self
    }

    /// Verify the signature header and parse the event
    pub fn parse(&self, payload: &[u8], signature: &str) -> Result<HubEvent, AuthError> {
        self.verify_signature(payload, signature)?;

        let raw: RawEvent = serde_json::from_slice(payload)
            .map_err(|e| AuthError::Webhook(format!("malformed event: {e}")))?;

        match raw.event_type.as_str() {
            "subscription.changed" => {
                let hub_user_id = raw
                    .data
                    .hub_user_id
                    .ok_or_else(|| AuthError::Webhook("missing hub_user_id".to_string()))?;
                Ok(HubEvent::SubscriptionChanged {
                    hub_user_id,
                    subscriptions: raw.data.subscriptions,
                })
            }
            other => {
                tracing::debug!(event_type = other, "Ignoring unhandled Hub event");
                Ok(HubEvent::Unknown(other.to_string()))
            }
        }
    }

    /// Compute the signature header for a payload (used by tests and by
    /// the Hub's own delivery code)
    pub fn sign(&self, payload: &[u8], timestamp: i64) -> String {
        let digest = self.digest(payload, timestamp);
        format!("t={timestamp},v1={}", hex::encode(digest))
    }

    fn digest(&self, payload: &[u8], timestamp: i64) -> Vec<u8> {
        // Secret length is unconstrained for HMAC, new_from_slice cannot fail
        let mut mac = Hmac::<Sha256>::new_from_slice(self.secret.as_bytes())
            .expect("HMAC accepts any key length");
        mac.update(timestamp.to_string().as_bytes());
        mac.update(b".");
        mac.update(payload);
        mac.finalize().into_bytes().to_vec()
    }

    fn verify_signature(&self, payload: &[u8], signature: &str) -> Result<(), AuthError> {
        let mut timestamp: Option<&str> = None;
        let mut sig_v1: Option<&str> = None;

        for part in signature.split(',') {
            if let Some((key, value)) = part.split_once('=') {
                match key {
                    "t" => timestamp = Some(value),
                    "v1" => sig_v1 = Some(value),
                    _ => {}
                }
            }
        }

        let timestamp: i64 = timestamp
            .ok_or_else(|| AuthError::Webhook("missing timestamp".to_string()))?
            .parse()
            .map_err(|_| AuthError::Webhook("bad timestamp".to_string()))?;

        let sig_v1 = sig_v1.ok_or_else(|| AuthError::Webhook("missing signature".to_string()))?;
        let provided =
            hex::decode(sig_v1).map_err(|_| AuthError::Webhook("bad signature hex".to_string()))?;

        let expected = self.digest(payload, timestamp);
        let matches: bool = expected.ct_eq(&provided).into();
        if !matches {
            tracing::warn!("Hub webhook signature mismatch");
            return Err(AuthError::Webhook("signature mismatch".to_string()));
        }

        // Freshness: a correctly-signed delivery outside the window is a
        // replay of a captured request
        let now = Utc::now().timestamp();
        if (now - timestamp).unsigned_abs() > self.tolerance.as_secs() {
            tracing::warn!(timestamp, now, "Hub webhook timestamp outside tolerance");
            return Err(AuthError::Webhook("timestamp too old".to_string()));
        }
        Ok(())
    }
}

impl std::fmt::Debug for HubWebhookVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HubWebhookVerifier").finish_non_exhaustive()
    }
}
