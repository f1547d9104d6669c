//! Spoke API
//!
//! HTTP service for a Hub-federated spoke application: SSO token
//! exchange, entitlement checks, chat relay, and Hub webhooks.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use tracing_subscriber::EnvFilter;

use spoke_auth_core::SsoService;
use spoke_hub_client::HubClient;
use spoke_relay::MessageRelay;
use spoke_store::pg::{PgNonceLedger, PgPrincipalRepository};

mod config;
mod error;
mod handlers;
mod state;

use config::Config;
use state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    tracing::info!("Starting Spoke API");

    let config = Config::from_env()?;

    let pool = spoke_store::pool::connect(&config.database_url).await?;
    let principals = Arc::new(PgPrincipalRepository::new(pool.clone()));
    let ledger = Arc::new(PgNonceLedger::new(pool.clone()));
    let hub = Arc::new(HubClient::new(config.hub.clone()));

    let mut sso = SsoService::new(
        config.sso.clone(),
        Arc::clone(&principals),
        ledger,
        hub,
    );
    if let Some(secret) = &config.webhook_secret {
        sso = sso.with_webhook_secret(secret.clone());
    } else {
        tracing::warn!("HUB_WEBHOOK_SECRET not set, webhook deliveries will be rejected");
    }

    let http_port = config.http_port;
    let prune_interval = config.nonce_prune_interval;
    let state = AppState::new(sso, principals, MessageRelay::new(), pool, config);

    // Nonce upkeep runs off the request path
    let upkeep = Arc::clone(&state.sso);
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(prune_interval);
        ticker.tick().await; // first tick completes immediately
        loop {
            ticker.tick().await;
            match upkeep.prune_nonces().await {
                Ok(pruned) if pruned > 0 => {
                    tracing::debug!(pruned, "Pruned expired nonce records");
                }
                Ok(_) => {}
                Err(e) => tracing::error!(error = %e, "Nonce pruning failed"),
            }
        }
    });

    let app = Router::new()
        .route("/api/v1/auth/sso", post(handlers::sso_login))
        .route("/api/v1/entitlements/check", get(handlers::check_entitlement))
        .route(
            "/api/v1/chat/messages",
            post(handlers::post_message).get(handlers::list_messages),
        )
        .route("/api/v1/hub/webhook", post(handlers::hub_webhook))
        .route("/health", get(handlers::health))
        .route("/ready", get(handlers::ready))
        .with_state(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], http_port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
