//! treasury-server
//!
//! Axum-based JSON API over the treasury valuation engine: live per-asset
//! and combined BTC/ETH views, what-if price scenarios and a manual cache
//! refresh.

mod config;
mod handlers;
mod routes;
mod state;

use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use treasury_core::{MarketFeed, MockFeed};
use treasury_runtime::CoinGeckoClient;

use crate::config::{FeedKind, ServerConfig};
use crate::routes::app_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment (before tracing, so RUST_LOG may come from .env)
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info,tower_http=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = ServerConfig::from_env();

    // Initialize market data feed
    let upstream: Arc<dyn MarketFeed> = match config.feed {
        FeedKind::CoinGecko => {
            let client = CoinGeckoClient::from_env()?;
            tracing::info!("✓ Using CoinGecko market data");
            Arc::new(client)
        }
        FeedKind::Mock => {
            tracing::warn!("⚠ TREASURY_FEED=mock - serving static demo data");
            Arc::new(MockFeed::new())
        }
    };

    tracing::info!(
        ttl_secs = config.cache_ttl.as_secs(),
        top_holders = config.top_holders,
        histogram_buckets = config.histogram_buckets,
        "valuation settings"
    );

    let addr = config.bind_addr.clone();
    let app = app_router(AppState::new(upstream, config));

    // Start server
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("══════════════════════════════════════════════════");
    tracing::info!("🚀 treasury-server running on http://{}", addr);
    tracing::info!("══════════════════════════════════════════════════");
    tracing::info!("");
    tracing::info!("Endpoints:");
    tracing::info!("  GET  /health                 - Health check");
    tracing::info!("  GET  /api/treasury/{{asset}}   - BTC or ETH holders (?currency=EUR)");
    tracing::info!("  GET  /api/combined           - Merged BTC + ETH view");
    tracing::info!("  POST /api/what-if            - Hypothetical price scenario");
    tracing::info!("  POST /api/refresh            - Drop cached market data");
    tracing::info!("");

    axum::serve(listener, app).await?;

    Ok(())
}
