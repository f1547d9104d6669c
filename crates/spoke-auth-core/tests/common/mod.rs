//! Common test utilities for spoke-auth-core integration tests

pub mod hub_mock;

#[allow(unused_imports)]
pub use hub_mock::{HubMockServer, TestKeyPair, TestSsoClaims, TEST_APP_ID, TEST_PUBLIC_KEY_PEM};
