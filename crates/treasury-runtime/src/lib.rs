//! # treasury-runtime
//!
//! Live market data providers for treasury-core.
//!
//! ## Providers
//!
//! - **CoinGecko** (default): public-company treasuries and spot prices,
//!   with USD-based FX rates from open.er-api.com
//!
//! ## Usage
//!
//! ```rust,ignore
//! use treasury_runtime::CoinGeckoClient;
//! use treasury_core::{CachedFeed, Currency, HoldingsProvider, PriceProvider};
//!
//! let feed = CachedFeed::new(Arc::new(CoinGeckoClient::from_env()?));
//! let holdings = feed.fetch_holdings(AssetKind::Btc).await?;
//! let prices = feed.fetch_prices(Currency::Eur).await?;
//! ```

pub mod error;

#[cfg(feature = "coingecko")]
pub mod coingecko;

pub use error::FeedError;

#[cfg(feature = "coingecko")]
pub use coingecko::{CoinGeckoClient, CoinGeckoConfig};

// Re-export core types for convenience
pub use treasury_core::{
    AssetKind, CachedFeed, Currency, HoldingsProvider, MarketFeed, PriceProvider, Result,
    TreasuryError,
};
