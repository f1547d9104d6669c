//! HTTP handlers

mod auth;
mod chat;
mod entitlement;
mod health;
mod webhook;

pub use auth::sso_login;
pub use chat::{list_messages, post_message};
pub use entitlement::check_entitlement;
pub use health::{health, ready};
pub use webhook::hub_webhook;
