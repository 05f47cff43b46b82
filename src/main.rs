mod config;
mod errors;
mod models;
mod routes;
mod service;

use tracing::{info, warn};

use crate::config::ProxyConfig;
use crate::routes::build_router;
use crate::service::proxy_service::ProxyService;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present (development convenience)
    dotenvy::dotenv().ok();

    // Initialise tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "chat_relay=debug,tower_http=debug".into()),
        )
        .init();

    // ── Configuration ─────────────────────────────────────────────────────────
    let config = ProxyConfig::from_env();
    let missing = config.missing();
    if missing.is_empty() {
        info!("Webhook relay configured (origin: {})", config.allowed_origin);
    } else {
        // Still serve GET/OPTIONS so the health check can report what is absent.
        warn!("Webhook relay not fully configured, POST will fail. Missing: {missing:?}");
    }
    let port = config.port;

    // ── Router ────────────────────────────────────────────────────────────────
    let proxy = ProxyService::new(config)?;
    let app = build_router(proxy);

    // ── Listen ────────────────────────────────────────────────────────────────
    let addr = format!("0.0.0.0:{port}");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Listening on http://{addr}/");

    axum::serve(listener, app).await?;
    Ok(())
}
