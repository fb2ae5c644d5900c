//! Mock Market Feed
//!
//! For testing and demo purposes. Returns realistic static holdings and prices.

use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use super::{HoldingsProvider, PriceProvider};
use crate::error::{Result, TreasuryError};
use crate::model::{AssetKind, Currency, HoldingsRecord, HoldingsSnapshot, PriceContext};

/// Mock feed with static holdings, prices and FX rates
pub struct MockFeed {
    /// Simulate an outage (for testing error paths)
    offline: bool,

    /// Upstream calls served, so tests can observe caching
    calls: AtomicUsize,
}

impl Default for MockFeed {
    fn default() -> Self {
        Self::new()
    }
}

impl MockFeed {
    pub fn new() -> Self {
        Self {
            offline: false,
            calls: AtomicUsize::new(0),
        }
    }

    /// Feed whose every call fails with `ProviderUnavailable`
    pub fn offline() -> Self {
        Self {
            offline: true,
            calls: AtomicUsize::new(0),
        }
    }

    /// Number of fetches served so far
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn record_call(&self) -> Result<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.offline {
            return Err(TreasuryError::unavailable("mock feed is offline"));
        }
        Ok(())
    }

    /// USD -> currency
    fn usd_rate(currency: Currency) -> Decimal {
        match currency {
            Currency::Usd => Decimal::ONE,
            Currency::Eur => dec!(0.92),
            Currency::Gbp => dec!(0.79),
            Currency::Jpy => dec!(151.2),
            Currency::Cad => dec!(1.37),
            Currency::Aud => dec!(1.52),
        }
    }
}

// (name, symbol, country, holdings, entry value usd, % of supply)
type Company = (&'static str, &'static str, &'static str, Decimal, Decimal, Decimal);

const BTC_COMPANIES: &[Company] = &[
    ("Strategy", "MSTR.US", "US", dec!(580955), dec!(40790000000), dec!(2.766)),
    ("MARA Holdings", "MARA.US", "US", dec!(49951), dec!(4300000000), dec!(0.238)),
    ("Twenty One Capital", "XXI.US", "US", dec!(43514), dec!(3900000000), dec!(0.207)),
    ("Metaplanet", "3350.T", "JP", dec!(13350), dec!(1330000000), dec!(0.064)),
    ("Coinbase Global", "COIN.US", "US", dec!(9267), dec!(0), dec!(0.044)),
];

const ETH_COMPANIES: &[Company] = &[
    ("BitMine Immersion", "BMNR.US", "US", dec!(833137), dec!(3090000000), dec!(0.690)),
    ("SharpLink Gaming", "SBET.US", "US", dec!(521939), dec!(1940000000), dec!(0.432)),
    ("The Ether Machine", "ETHM.US", "US", dec!(345362), dec!(1340000000), dec!(0.286)),
    ("Coinbase Global", "COIN.US", "US", dec!(137334), dec!(0), dec!(0.114)),
];

#[async_trait]
impl HoldingsProvider for MockFeed {
    async fn fetch_holdings(&self, asset: AssetKind) -> Result<HoldingsSnapshot> {
        self.record_call()?;

        let companies = match asset {
            AssetKind::Btc => BTC_COMPANIES,
            AssetKind::Eth => ETH_COMPANIES,
        };
        let records = companies
            .iter()
            .map(|(name, symbol, country, qty, cost, share)| {
                HoldingsRecord::new(*name, *symbol, *country, asset, *qty, *cost)
                    .map(|r| r.with_supply_share(*share))
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(HoldingsSnapshot::new(asset, records))
    }

    fn name(&self) -> &str {
        "MockFeed"
    }
}

#[async_trait]
impl PriceProvider for MockFeed {
    async fn fetch_prices(&self, currency: Currency) -> Result<PriceContext> {
        self.record_call()?;

        Ok(PriceContext::live(currency, Self::usd_rate(currency))
            .with_price(AssetKind::Btc, dec!(117500))
            .with_price(AssetKind::Eth, dec!(4450)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::valuation::valuate;

    #[tokio::test]
    async fn test_mock_feed_values_cleanly() {
        let feed = MockFeed::new();

        let holdings = feed.fetch_holdings(AssetKind::Btc).await.unwrap();
        let prices = feed.fetch_prices(Currency::Eur).await.unwrap();
        let results = valuate(&holdings.records, &prices).unwrap();

        assert_eq!(results.len(), holdings.len());
        assert_eq!(feed.calls(), 2);
    }

    #[tokio::test]
    async fn test_offline_feed() {
        let feed = MockFeed::offline();
        let err = feed.fetch_prices(Currency::Usd).await.unwrap_err();
        assert!(err.is_retryable());
    }
}
