//! SSO assertion types and validation outcomes

use serde::{Deserialize, Serialize};

use crate::Subscription;

/// Claims carried by a Hub-signed SSO assertion
///
/// Verified, never mutated. The subscription list is the Hub's view at
/// issue time and may be superseded by a live revalidation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SsoClaims {
    /// Hub user identifier (subject)
    pub user_id: String,
    /// Username at the Hub
    pub username: String,
    /// Email at the Hub
    pub email: Option<String>,
    /// Application the token was minted for
    pub app_id: Option<String>,
    /// One-time-use replay nonce
    pub nonce: Option<String>,
    /// Issued-at timestamp
    pub iat: i64,
    /// Expiration timestamp
    pub exp: i64,
    /// Subscriptions at issue time
    #[serde(default)]
    pub subscriptions: Vec<Subscription>,
}

/// Identity asserted by a validated token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SsoIdentity {
    /// Hub user identifier
    pub hub_user_id: String,
    /// Username at the Hub
    pub username: String,
    /// Email at the Hub
    pub email: Option<String>,
}

/// Why a token was rejected
///
/// Closed enumeration; callers never see a raw decode error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectReason {
    /// Empty or absent token
    NoToken,
    /// Verification key is not configured; fail closed
    ConfigurationError,
    /// Token was minted for a sibling application
    WrongApp,
    /// Nonce already consumed
    NonceReused,
    /// Token expired
    TokenExpired,
    /// Signature does not verify against the configured key
    InvalidSignature,
    /// Any other structural decode failure
    ValidationError,
    /// Hub revoked or rejected the token on revalidation
    HubRejected,
}

impl RejectReason {
    /// Stable wire identifier for this reason
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NoToken => "no_token",
            Self::ConfigurationError => "configuration_error",
            Self::WrongApp => "wrong_app",
            Self::NonceReused => "nonce_reused",
            Self::TokenExpired => "token_expired",
            Self::InvalidSignature => "invalid_signature",
            Self::ValidationError => "validation_error",
            Self::HubRejected => "hub_rejected",
        }
    }
}

impl std::fmt::Display for RejectReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of validating an SSO assertion
#[derive(Debug, Clone, PartialEq)]
pub enum SsoValidation {
    /// Token verified; identity and freshest known subscriptions
    Valid {
        identity: SsoIdentity,
        subscriptions: Vec<Subscription>,
    },
    /// Token rejected
    Invalid { reason: RejectReason },
}

impl SsoValidation {
    /// Shorthand for the rejected variant
    pub fn invalid(reason: RejectReason) -> Self {
        Self::Invalid { reason }
    }

    /// Whether the token verified
    pub fn is_valid(&self) -> bool {
        matches!(self, Self::Valid { .. })
    }

    /// Rejection reason, if rejected
    pub fn reason(&self) -> Option<RejectReason> {
        match self {
            Self::Invalid { reason } => Some(*reason),
            Self::Valid { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reject_reason_wire_names() {
        assert_eq!(RejectReason::NoToken.as_str(), "no_token");
        assert_eq!(RejectReason::NonceReused.as_str(), "nonce_reused");
        assert_eq!(RejectReason::HubRejected.as_str(), "hub_rejected");
        assert_eq!(
            serde_json::to_string(&RejectReason::WrongApp).unwrap(),
            "\"wrong_app\""
        );
    }

    #[test]
    fn test_claims_default_subscriptions() {
        let json = r#"{
            "user_id": "hub-1",
            "username": "alice",
            "email": "alice@example.com",
            "app_id": "spoke",
            "nonce": "n-1",
            "iat": 1,
            "exp": 2
        }"#;
        let claims: SsoClaims = serde_json::from_str(json).unwrap();
        assert!(claims.subscriptions.is_empty());
    }
}
