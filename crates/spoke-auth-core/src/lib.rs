//! Spoke Auth Core - SSO and entitlement business logic
//!
//! Core authentication functionality for a Hub-federated spoke
//! application: SSO assertion verification with replay protection,
//! subscription-entitlement resolution with a short-lived cache, session
//! binding, and webhook-driven cache invalidation.

pub mod binder;
pub mod config;
pub mod entitlement;
pub mod error;
pub mod service;
pub mod token;
pub mod webhook;

pub use binder::SessionBinder;
pub use config::SsoConfig;
pub use entitlement::EntitlementResolver;
pub use error::AuthError;
pub use service::SsoService;
pub use token::SsoVerifier;
pub use webhook::{HubEvent, HubWebhookVerifier};
