//! Hub API client

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use spoke_types::Subscription;

use crate::config::HubConfig;
use crate::error::HubClientError;
use crate::retry::{with_retry, RetryConfig};

/// Hub-side verdict on a token revalidation
#[derive(Debug, Clone, Deserialize)]
pub struct HubTokenValidation {
    /// Whether the Hub still honors the token
    pub valid: bool,
    /// Hub-supplied reason when invalid
    #[serde(default)]
    pub error: Option<String>,
    /// Fresh identity fields; each falls back to token data when absent
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    /// Fresh subscription snapshot
    #[serde(default)]
    pub subscriptions: Option<Vec<Subscription>>,
}

/// Hub answer to a subscription refresh
#[derive(Debug, Clone, Deserialize)]
pub struct HubSubscriptionRefresh {
    /// Authoritative subscription snapshot for the user
    #[serde(default)]
    pub subscriptions: Vec<Subscription>,
}

/// Remote Hub dependency as the core sees it
///
/// Both calls are independently failable and bounded by the client's
/// timeouts; callers own the degradation policy.
#[async_trait]
pub trait HubApi: Send + Sync {
    /// Ask the Hub whether a locally-verified token is still honored
    async fn revalidate(&self, token: &str) -> Result<HubTokenValidation, HubClientError>;

    /// Fetch the authoritative subscription snapshot for a Hub user
    async fn refresh_subscriptions(
        &self,
        hub_user_id: &str,
        required_product_ids: &[String],
    ) -> Result<HubSubscriptionRefresh, HubClientError>;
}

#[derive(Serialize)]
struct ValidateRequest<'a> {
    token: &'a str,
}

#[derive(Serialize)]
struct SubscriptionCheckRequest<'a> {
    user_id: &'a str,
    product_ids: &'a [String],
}

/// HTTPS Hub client
#[derive(Clone)]
pub struct HubClient {
    config: HubConfig,
    http_client: reqwest::Client,
    retry: RetryConfig,
}

impl HubClient {
    /// Create a new Hub client with a connection-pooled HTTP client
    pub fn new(config: HubConfig) -> Self {
        let http_client = reqwest::Client::builder()
            .connect_timeout(config.connect_timeout)
            .timeout(config.request_timeout)
            .pool_idle_timeout(Duration::from_secs(90))
            .tcp_keepalive(Duration::from_secs(60))
            .tcp_nodelay(true)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            config,
            http_client,
            retry: RetryConfig::default(),
        }
    }

    /// Create a client with a custom HTTP client
    ///
    /// Use this for custom proxy or TLS settings, or to share one client
    /// across services.
    pub fn with_client(config: HubConfig, http_client: reqwest::Client) -> Self {
        Self {
            config,
            http_client,
            retry: RetryConfig::default(),
        }
    }

    /// Override the retry policy for transient Hub failures
    #[must_use]
    pub fn with_retry_config(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    async fn post_json<Req: Serialize, Resp: serde::de::DeserializeOwned>(
        &self,
        url: &str,
        body: &Req,
    ) -> Result<Resp, HubClientError> {
        let response = self
            .http_client
            .post(url)
            .bearer_auth(&self.config.service_token)
            .json(body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            tracing::debug!(url, status = status.as_u16(), "Hub call failed");
            return Err(HubClientError::Status(status.as_u16()));
        }

        response
            .json::<Resp>()
            .await
            .map_err(|e| HubClientError::Decode(e.to_string()))
    }
}

#[async_trait]
impl HubApi for HubClient {
    async fn revalidate(&self, token: &str) -> Result<HubTokenValidation, HubClientError> {
        // Both Hub calls are idempotent, so transient failures retry
        let url = self.config.validate_url();
        let request = ValidateRequest { token };
        with_retry(self.retry.clone(), || self.post_json(&url, &request)).await
    }

    async fn refresh_subscriptions(
        &self,
        hub_user_id: &str,
        required_product_ids: &[String],
    ) -> Result<HubSubscriptionRefresh, HubClientError> {
        let url = self.config.subscriptions_url();
        let request = SubscriptionCheckRequest {
            user_id: hub_user_id,
            product_ids: required_product_ids,
        };
        with_retry(self.retry.clone(), || self.post_json(&url, &request)).await
    }
}

impl std::fmt::Debug for HubClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HubClient")
            .field("base_url", &self.config.base_url)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_json_string, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_client(base_url: &str) -> HubClient {
        HubClient::new(
            HubConfig::new(base_url, "service-secret")
                .with_request_timeout(Duration::from_millis(500)),
        )
    }

    #[tokio::test]
    async fn test_revalidate_decodes_verdict() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/sso/validate"))
            .and(body_json_string(r#"{"token":"tok-1"}"#))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "valid": true,
                "user_id": "hub-1",
                "username": "alice",
                "subscriptions": [
                    { "product_id": "pro", "status": "active" }
                ]
            })))
            .mount(&server)
            .await;

        let verdict = test_client(&server.uri()).revalidate("tok-1").await.unwrap();
        assert!(verdict.valid);
        assert_eq!(verdict.user_id.as_deref(), Some("hub-1"));
        assert_eq!(verdict.subscriptions.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_refresh_subscriptions_defaults_empty() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/subscriptions/check"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({})))
            .mount(&server)
            .await;

        let refresh = test_client(&server.uri())
            .refresh_subscriptions("hub-1", &["pro".to_string()])
            .await
            .unwrap();
        assert!(refresh.subscriptions.is_empty());
    }

    #[tokio::test]
    async fn test_server_error_maps_to_status() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/sso/validate"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let err = test_client(&server.uri()).revalidate("tok-1").await.unwrap_err();
        assert!(err.is_retryable());
        match err {
            HubClientError::Status(503) => {}
            other => panic!("Expected Status(503), got: {other:?}"),
        }
    }
}
