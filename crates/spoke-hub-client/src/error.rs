//! Hub client errors

use thiserror::Error;

use crate::retry::RetryableError;

/// Hub client errors
#[derive(Error, Debug)]
pub enum HubClientError {
    /// Transport-level failure (DNS, TLS, connect, timeout)
    #[error("hub transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// Hub answered with a non-success status
    #[error("hub returned status {0}")]
    Status(u16),

    /// Hub answered with a body we could not decode
    #[error("hub response decode error: {0}")]
    Decode(String),
}

impl HubClientError {
    /// Whether retrying this call might succeed
    ///
    /// Transport faults and 5xx/429 responses are transient; everything
    /// else reflects the request itself and repeats identically.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Transport(_) => true,
            Self::Status(code) => *code >= 500 || *code == 429,
            Self::Decode(_) => false,
        }
    }
}

impl RetryableError for HubClientError {
    fn is_retryable(&self) -> bool {
        HubClientError::is_retryable(self)
    }
}
