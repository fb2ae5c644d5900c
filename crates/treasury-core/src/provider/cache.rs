//! Cached Market Feed
//!
//! Wraps any [`MarketFeed`] with a time-to-live per holdings asset and per
//! price currency. `invalidate` is the manual refresh trigger. Failed
//! fetches are never cached.

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tokio::time::Instant;

use super::{HoldingsProvider, MarketFeed, PriceProvider};
use crate::error::Result;
use crate::model::{AssetKind, Currency, HoldingsSnapshot, PriceContext, Provenance};

/// One hour, matching the upstream refresh cadence
pub const DEFAULT_TTL: Duration = Duration::from_secs(3600);

struct Entry<T> {
    stored_at: Instant,
    value: T,
}

struct TtlMap<K, V> {
    entries: RwLock<HashMap<K, Entry<V>>>,
}

impl<K: Eq + Hash, V: Clone> TtlMap<K, V> {
    fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
        }
    }

    async fn get_fresh(&self, key: &K, ttl: Duration) -> Option<V> {
        let entries = self.entries.read().await;
        entries
            .get(key)
            .filter(|e| e.stored_at.elapsed() < ttl)
            .map(|e| e.value.clone())
    }

    async fn put(&self, key: K, value: V) {
        self.entries.write().await.insert(
            key,
            Entry {
                stored_at: Instant::now(),
                value,
            },
        );
    }

    async fn clear(&self) {
        self.entries.write().await.clear();
    }
}

/// TTL cache in front of a market feed
pub struct CachedFeed {
    inner: Arc<dyn MarketFeed>,
    ttl: Duration,
    holdings: TtlMap<AssetKind, HoldingsSnapshot>,
    prices: TtlMap<Currency, PriceContext>,
}

impl CachedFeed {
    pub fn new(inner: Arc<dyn MarketFeed>) -> Self {
        Self::with_ttl(inner, DEFAULT_TTL)
    }

    pub fn with_ttl(inner: Arc<dyn MarketFeed>, ttl: Duration) -> Self {
        Self {
            inner,
            ttl,
            holdings: TtlMap::new(),
            prices: TtlMap::new(),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Drop every cached snapshot; the next fetch goes upstream
    pub async fn invalidate(&self) {
        self.holdings.clear().await;
        self.prices.clear().await;
        tracing::info!(provider = self.inner.name(), "market data cache invalidated");
    }
}

#[async_trait]
impl HoldingsProvider for CachedFeed {
    async fn fetch_holdings(&self, asset: AssetKind) -> Result<HoldingsSnapshot> {
        if let Some(snapshot) = self.holdings.get_fresh(&asset, self.ttl).await {
            tracing::debug!(%asset, "holdings cache hit");
            return Ok(snapshot);
        }

        tracing::debug!(%asset, provider = self.inner.name(), "holdings cache miss");
        let snapshot = self.inner.fetch_holdings(asset).await?;
        self.holdings.put(asset, snapshot.clone()).await;
        Ok(snapshot)
    }

    fn name(&self) -> &str {
        self.inner.name()
    }
}

#[async_trait]
impl PriceProvider for CachedFeed {
    async fn fetch_prices(&self, currency: Currency) -> Result<PriceContext> {
        if let Some(ctx) = self.prices.get_fresh(&currency, self.ttl).await {
            tracing::debug!(%currency, "price cache hit");
            return Ok(ctx);
        }

        tracing::debug!(%currency, "price cache miss");
        let ctx = self.inner.fetch_prices(currency).await?;
        if ctx.provenance == Provenance::Live {
            self.prices.put(currency, ctx.clone()).await;
        }
        Ok(ctx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::MockFeed;

    fn cached(ttl: Duration) -> (Arc<MockFeed>, CachedFeed) {
        let mock = Arc::new(MockFeed::new());
        let feed = CachedFeed::with_ttl(mock.clone(), ttl);
        (mock, feed)
    }

    #[tokio::test(start_paused = true)]
    async fn test_hit_within_ttl() {
        let (mock, feed) = cached(Duration::from_secs(60));

        feed.fetch_holdings(AssetKind::Btc).await.unwrap();
        feed.fetch_holdings(AssetKind::Btc).await.unwrap();
        feed.fetch_prices(Currency::Eur).await.unwrap();
        feed.fetch_prices(Currency::Eur).await.unwrap();

        assert_eq!(mock.calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_expires_after_ttl() {
        let (mock, feed) = cached(Duration::from_secs(60));

        feed.fetch_holdings(AssetKind::Eth).await.unwrap();
        tokio::time::advance(Duration::from_secs(61)).await;
        feed.fetch_holdings(AssetKind::Eth).await.unwrap();

        assert_eq!(mock.calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_keys_are_independent() {
        let (mock, feed) = cached(DEFAULT_TTL);

        feed.fetch_holdings(AssetKind::Btc).await.unwrap();
        feed.fetch_holdings(AssetKind::Eth).await.unwrap();
        feed.fetch_prices(Currency::Usd).await.unwrap();
        feed.fetch_prices(Currency::Jpy).await.unwrap();

        assert_eq!(mock.calls(), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn test_invalidate_forces_refetch() {
        let (mock, feed) = cached(DEFAULT_TTL);

        feed.fetch_prices(Currency::Gbp).await.unwrap();
        feed.invalidate().await;
        feed.fetch_prices(Currency::Gbp).await.unwrap();

        assert_eq!(mock.calls(), 2);
    }

    #[tokio::test]
    async fn test_errors_not_cached() {
        let mock = Arc::new(MockFeed::offline());
        let feed = CachedFeed::new(mock.clone());

        assert!(feed.fetch_holdings(AssetKind::Btc).await.is_err());
        assert!(feed.fetch_holdings(AssetKind::Btc).await.is_err());
        assert_eq!(mock.calls(), 2);
    }
}
