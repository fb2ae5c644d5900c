//! Application State

use std::sync::Arc;

use treasury_core::{CachedFeed, MarketFeed};

use crate::config::ServerConfig;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Cached holdings + price feed (CoinGecko or mock)
    pub feed: Arc<CachedFeed>,

    pub config: Arc<ServerConfig>,
}

impl AppState {
    pub fn new(upstream: Arc<dyn MarketFeed>, config: ServerConfig) -> Self {
        Self {
            feed: Arc::new(CachedFeed::with_ttl(upstream, config.cache_ttl)),
            config: Arc::new(config),
        }
    }
}
