//! Server Configuration

use std::time::Duration;

use treasury_core::provider::DEFAULT_TTL;

/// Which upstream feeds the valuations
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FeedKind {
    CoinGecko,
    /// Static demo data, no network
    Mock,
}

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub bind_addr: String,
    pub feed: FeedKind,
    pub cache_ttl: Duration,

    /// Rows returned in `summary.top_holders`
    pub top_holders: usize,

    /// Buckets in `summary.pnl_histogram`
    pub histogram_buckets: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:3000".into(),
            feed: FeedKind::CoinGecko,
            cache_ttl: DEFAULT_TTL,
            top_holders: 10,
            histogram_buckets: 10,
        }
    }
}

impl ServerConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let feed = match std::env::var("TREASURY_FEED").as_deref() {
            Ok("mock") => FeedKind::Mock,
            _ => FeedKind::CoinGecko,
        };

        Self {
            bind_addr: std::env::var("BIND_ADDR").unwrap_or(defaults.bind_addr),
            feed,
            cache_ttl: env_parse("CACHE_TTL_SECS")
                .map(Duration::from_secs)
                .unwrap_or(defaults.cache_ttl),
            top_holders: env_parse("TOP_HOLDERS").unwrap_or(defaults.top_holders),
            histogram_buckets: env_parse("HISTOGRAM_BUCKETS").unwrap_or(defaults.histogram_buckets),
        }
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.trim().parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ServerConfig::default();
        assert_eq!(config.cache_ttl, Duration::from_secs(3600));
        assert_eq!(config.top_holders, 10);
        assert_eq!(config.feed, FeedKind::CoinGecko);
    }
}
