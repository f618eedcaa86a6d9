//! modeldesk HTTP server binary.
//!
//! # Environment Variables
//!
//! - `PORT` — HTTP port (default: 8080)
//! - `MODELDESK_API_BASE` — chat-completion API base URL
//! - `MODELDESK_CATALOG_BASE` — model catalog base URL
//! - `MODELDESK_KEYS_URL` — signing-key metadata endpoint
//! - `RUST_LOG` — tracing filter (default: "info")

use std::sync::Arc;

use anyhow::Context;

use modeldesk::auth::KeyServiceVerifier;
use modeldesk::capabilities::CapabilityRegistry;
use modeldesk::catalog::CatalogClient;
use modeldesk::config::ServiceConfig;
use modeldesk::llm::PlatformClient;
use modeldesk::server::{app_router, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,modeldesk=debug".into()),
        )
        .init();

    let config = ServiceConfig::from_env();
    let http = reqwest::Client::new();

    let state = AppState {
        backend: Arc::new(PlatformClient::new(http.clone(), config.api_base.clone())),
        catalog: Arc::new(CatalogClient::new(http.clone(), config.catalog_base.clone())),
        verifier: Arc::new(KeyServiceVerifier::new(http, config.keys_url.clone())),
        registry: Arc::new(CapabilityRegistry::standard()),
    };

    let port = std::env::var("PORT").unwrap_or_else(|_| "8080".to_string());
    let bind_addr = format!("0.0.0.0:{}", port);

    let app = app_router(state);

    tracing::info!("modeldesk server starting on {}", bind_addr);
    tracing::info!("  GET  /health — liveness probe");
    tracing::info!("  POST /agent  — routed chat turn");
    tracing::info!("  chat api: {}", config.api_base);
    tracing::info!("  catalog:  {}", config.catalog_base);

    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;

    axum::serve(listener, app).await.context("server failed")?;
    Ok(())
}
