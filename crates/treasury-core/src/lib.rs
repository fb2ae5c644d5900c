//! # treasury-core
//!
//! Valuation engine for the Bitcoin and Ethereum treasuries of public
//! companies.
//!
//! ## Data flow
//!
//! ```text
//! ┌──────────────────┐   ┌──────────────────┐
//! │ HoldingsProvider │   │  PriceProvider   │   (CoinGecko, mock, ...)
//! └────────┬─────────┘   └────────┬─────────┘
//!          │   CachedFeed (TTL)   │
//!          ▼                      ▼
//!   HoldingsSnapshot         PriceContext ◄── what-if overrides
//!          │                      │
//!          └────────► valuate ◄───┘
//!                        │
//!          ┌─────────────┼──────────────┐
//!          ▼             ▼              ▼
//!      aggregate   combined_view   SnapshotStats
//! ```
//!
//! ## Example: 10 BTC bought for $300,000
//!
//! ```text
//! live  BTC @ $40,000 → value $400,000   PnL +$100,000   +33.33%
//! what-if BTC @ $25,000 → value $250,000   PnL  -$50,000   -16.67%
//! ```
//!
//! Every engine function is pure and synchronous; only the providers and
//! the cache are async.

pub mod error;
pub mod model;
pub mod provider;
pub mod stats;
pub mod valuation;

pub use error::{Result, TreasuryError};
pub use model::{
    AssetKind, Currency, HoldingsRecord, HoldingsSnapshot, PnlPercent, PriceContext,
    PriceOverrides, Provenance, ValuationResult, UNKNOWN_SYMBOL,
};
pub use provider::{CachedFeed, HoldingsProvider, MarketFeed, MockFeed, PriceProvider};
pub use stats::{CombinedStats, SnapshotStats};
pub use valuation::{aggregate, combined_view, valuate, what_if, Aggregate, HistogramBucket};
