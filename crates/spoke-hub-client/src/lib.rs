//! Spoke Hub Client - HTTPS client for the central Hub
//!
//! The Hub is the external identity and entitlement authority. This crate
//! treats it as a fallible RPC dependency: every call carries its own
//! timeout, transient failures are retryable, and callers decide how to
//! degrade when the Hub is unreachable.

pub mod client;
pub mod config;
pub mod error;
pub mod retry;

pub use client::{HubApi, HubClient, HubSubscriptionRefresh, HubTokenValidation};
pub use config::HubConfig;
pub use error::HubClientError;
pub use retry::{with_retry, RetryConfig, RetryableError};
