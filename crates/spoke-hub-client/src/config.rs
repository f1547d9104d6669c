//! Hub client configuration

use std::time::Duration;

/// Hub API client configuration
#[derive(Debug, Clone)]
pub struct HubConfig {
    /// Base URL of the Hub API (e.g. https://hub.example.com)
    pub base_url: String,
    /// Service credential sent as a bearer token on every call
    pub service_token: String,
    /// Total per-request timeout
    pub request_timeout: Duration,
    /// TCP connect timeout
    pub connect_timeout: Duration,
}

impl HubConfig {
    /// Create a new Hub config with default timeouts
    pub fn new(base_url: impl Into<String>, service_token: impl Into<String>) -> Self {
        let mut base_url = base_url.into();
        while base_url.ends_with('/') {
            base_url.pop();
        }
        Self {
            base_url,
            service_token: service_token.into(),
            request_timeout: Duration::from_secs(5),
            connect_timeout: Duration::from_secs(3),
        }
    }

    /// Set the total per-request timeout
    #[must_use]
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Set the TCP connect timeout
    #[must_use]
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Token revalidation endpoint
    pub fn validate_url(&self) -> String {
        format!("{}/api/sso/validate", self.base_url)
    }

    /// Subscription refresh endpoint
    pub fn subscriptions_url(&self) -> String {
        format!("{}/api/subscriptions/check", self.base_url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_urls_strip_trailing_slash() {
        let config = HubConfig::new("https://hub.example.com/", "secret");
        assert_eq!(config.validate_url(), "https://hub.example.com/api/sso/validate");
        assert_eq!(
            config.subscriptions_url(),
            "https://hub.example.com/api/subscriptions/check"
        );
    }
}
