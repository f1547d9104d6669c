//! Subscription types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Subscription status as reported by the Hub
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionStatus {
    /// Subscription is active
    Active,
    /// Payment is past due
    PastDue,
    /// Subscription was canceled
    Canceled,
    /// Subscription has lapsed
    Expired,
    /// In trial period
    Trialing,
    /// Status string the Hub added after this build shipped
    #[serde(other)]
    Unknown,
}

/// A single product subscription owned by a Hub user
///
/// Snapshots of these are replaced wholesale on refresh, never merged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Subscription {
    /// Hub product identifier
    pub product_id: String,
    /// Current status
    pub status: SubscriptionStatus,
    /// End of the paid period, if the Hub bounded it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub valid_until: Option<DateTime<Utc>>,
}

impl Subscription {
    /// Whether this subscription grants the given product at `now`
    pub fn covers(&self, product_id: &str, now: DateTime<Utc>) -> bool {
        if self.product_id != product_id {
            return false;
        }
        if self.status != SubscriptionStatus::Active {
            return false;
        }
        match self.valid_until {
            Some(until) => until >= now,
            None => true,
        }
    }
}

/// Check a subscription snapshot against a required product set
///
/// Access is granted when any required product is covered by an active,
/// unexpired subscription. An empty requirement always grants access.
pub fn satisfies(subscriptions: &[Subscription], required: &[String], now: DateTime<Utc>) -> bool {
    if required.is_empty() {
        return true;
    }
    required
        .iter()
        .any(|product| subscriptions.iter().any(|sub| sub.covers(product, now)))
}
