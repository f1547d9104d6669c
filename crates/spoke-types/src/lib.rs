//! Spoke Types - Shared domain types
//!
//! This crate contains domain types used across Spoke services:
//! - Principal identity
//! - Hub subscriptions and entitlement outcomes
//! - SSO assertions and validation results
//! - Chat messages

pub mod chat;
pub mod principal;
pub mod sso;
pub mod subscription;

pub use chat::*;
pub use principal::*;
pub use sso::*;
pub use subscription::*;
