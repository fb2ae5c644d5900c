//! Market Data Providers
//!
//! Abstractions for the collaborators that feed the valuation engine:
//! holdings per asset and live prices per display currency.

mod cache;
mod mock;

pub use cache::{CachedFeed, DEFAULT_TTL};
pub use mock::MockFeed;

use async_trait::async_trait;

use crate::error::Result;
use crate::model::{AssetKind, Currency, HoldingsSnapshot, PriceContext};

/// Source of company treasury holdings (Strategy pattern)
///
/// Implement this for each data vendor: CoinGecko, a static file, etc.
#[async_trait]
pub trait HoldingsProvider: Send + Sync {
    /// Current holdings for one asset, or `ProviderUnavailable`
    async fn fetch_holdings(&self, asset: AssetKind) -> Result<HoldingsSnapshot>;

    /// Provider name
    fn name(&self) -> &str;
}

/// Source of live prices and reference -> display currency rates
#[async_trait]
pub trait PriceProvider: Send + Sync {
    /// Live price context for every supported asset in `currency`
    async fn fetch_prices(&self, currency: Currency) -> Result<PriceContext>;
}

/// A provider that supplies both holdings and prices
pub trait MarketFeed: HoldingsProvider + PriceProvider {}

impl<T: HoldingsProvider + PriceProvider> MarketFeed for T {}
