//! Auth errors

use spoke_types::RejectReason;
use thiserror::Error;

/// Authentication and entitlement errors
#[derive(Error, Debug)]
pub enum AuthError {
    /// SSO token rejected with a precise reason
    #[error("sso rejected: {0}")]
    SsoRejected(RejectReason),

    /// Principal not found
    #[error("principal not found")]
    PrincipalNotFound,

    /// Webhook payload or signature rejected
    #[error("webhook error: {0}")]
    Webhook(String),

    /// Store error
    #[error("store error: {0}")]
    Store(String),

    /// Configuration error
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Internal error
    #[error("internal error: {0}")]
    Internal(String),
}

impl AuthError {
    /// Get HTTP status code for this error
    pub fn status_code(&self) -> u16 {
        match self {
            Self::SsoRejected(_) => 401,
            Self::PrincipalNotFound => 404,
            Self::Webhook(_) => 400,
            Self::Store(_) | Self::Configuration(_) | Self::Internal(_) => 500,
        }
    }

    /// Get error code for API responses
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::SsoRejected(reason) => reason.as_str(),
            Self::PrincipalNotFound => "principal_not_found",
            Self::Webhook(_) => "webhook_rejected",
            Self::Store(_) => "store_error",
            Self::Configuration(_) => "configuration_error",
            Self::Internal(_) => "internal_error",
        }
    }
}

impl From<spoke_store::StoreError> for AuthError {
    fn from(err: spoke_store::StoreError) -> Self {
        tracing::error!("Store error: {}", err);
        Self::Store(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(AuthError::SsoRejected(RejectReason::NonceReused).status_code(), 401);
        assert_eq!(AuthError::PrincipalNotFound.status_code(), 404);
        assert_eq!(AuthError::Store("down".to_string()).status_code(), 500);
    }

    #[test]
    fn test_sso_rejection_carries_reason_code() {
        let err = AuthError::SsoRejected(RejectReason::WrongApp);
        assert_eq!(err.error_code(), "wrong_app");
    }
}
