//! Domain Models
//!
//! Holdings records, price scenarios and the derived valuation results.
//! Uses `rust_decimal` for all monetary values - never use f64 for money!

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize, Serializer};

use crate::error::{Result, TreasuryError};

/// A treasury asset tracked by the feed
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AssetKind {
    Btc,
    Eth,
}

impl AssetKind {
    pub const ALL: [AssetKind; 2] = [AssetKind::Btc, AssetKind::Eth];

    /// Ticker symbol (e.g., "BTC")
    pub fn symbol(&self) -> &'static str {
        match self {
            AssetKind::Btc => "BTC",
            AssetKind::Eth => "ETH",
        }
    }

    /// CoinGecko coin id
    pub fn coin_id(&self) -> &'static str {
        match self {
            AssetKind::Btc => "bitcoin",
            AssetKind::Eth => "ethereum",
        }
    }

    /// Hard-capped supply, if the asset has one
    pub fn max_supply(&self) -> Option<Decimal> {
        match self {
            AssetKind::Btc => Some(dec!(21_000_000)),
            AssetKind::Eth => None,
        }
    }
}

impl fmt::Display for AssetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

impl FromStr for AssetKind {
    type Err = TreasuryError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "btc" | "bitcoin" => Ok(AssetKind::Btc),
            "eth" | "ethereum" => Ok(AssetKind::Eth),
            other => Err(TreasuryError::invalid(format!("unsupported asset '{}'", other))),
        }
    }
}

/// Display currency. USD is the reference currency every price and cost
/// basis is denominated in.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    #[default]
    Usd,
    Eur,
    Gbp,
    Jpy,
    Cad,
    Aud,
}

impl Currency {
    pub const ALL: [Currency; 6] = [
        Currency::Usd,
        Currency::Eur,
        Currency::Gbp,
        Currency::Jpy,
        Currency::Cad,
        Currency::Aud,
    ];

    pub const REFERENCE: Currency = Currency::Usd;

    pub fn code(&self) -> &'static str {
        match self {
            Currency::Usd => "USD",
            Currency::Eur => "EUR",
            Currency::Gbp => "GBP",
            Currency::Jpy => "JPY",
            Currency::Cad => "CAD",
            Currency::Aud => "AUD",
        }
    }

    pub fn is_reference(&self) -> bool {
        *self == Self::REFERENCE
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Currency {
    type Err = TreasuryError;

    fn from_str(s: &str) -> Result<Self> {
        let code = s.trim().to_uppercase();
        Self::ALL
            .into_iter()
            .find(|c| c.code() == code)
            .ok_or_else(|| TreasuryError::invalid(format!("unsupported currency '{}'", s.trim())))
    }
}

/// One company's position in one asset
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct HoldingsRecord {
    /// Company name
    pub name: String,

    /// Listed ticker symbol, used as the join key across assets
    pub symbol: String,

    pub country: String,

    pub asset: AssetKind,

    /// Units held
    pub quantity: Decimal,

    /// Total amount paid, in the reference currency
    pub acquisition_cost: Decimal,

    /// Share of the asset's total supply in percent, when the source reports it
    #[serde(default)]
    pub supply_share: Option<Decimal>,
}

impl HoldingsRecord {
    pub fn new(
        name: impl Into<String>,
        symbol: impl Into<String>,
        country: impl Into<String>,
        asset: AssetKind,
        quantity: Decimal,
        acquisition_cost: Decimal,
    ) -> Result<Self> {
        let record = Self {
            name: name.into(),
            symbol: symbol.into(),
            country: country.into(),
            asset,
            quantity,
            acquisition_cost,
            supply_share: None,
        };
        record.validate()?;
        Ok(record)
    }

    pub fn with_supply_share(mut self, percent: Decimal) -> Self {
        self.supply_share = Some(percent);
        self
    }

    /// Quantity and cost basis must be non-negative
    pub fn validate(&self) -> Result<()> {
        if self.quantity < Decimal::ZERO {
            return Err(TreasuryError::invalid(format!(
                "{}: negative {} quantity {}",
                self.symbol, self.asset, self.quantity
            )));
        }
        if self.acquisition_cost < Decimal::ZERO {
            return Err(TreasuryError::invalid(format!(
                "{}: negative acquisition cost {}",
                self.symbol, self.acquisition_cost
            )));
        }
        Ok(())
    }
}

/// Ticker recorded for companies the source lists without one
pub const UNKNOWN_SYMBOL: &str = "N/A";

/// Normalized ticker used to match a company across asset collections
pub fn join_key(symbol: &str) -> String {
    symbol.trim().to_uppercase()
}

/// All records for one asset as of one refresh. Replaced wholesale on the
/// next refresh, never edited in place.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct HoldingsSnapshot {
    pub asset: AssetKind,
    pub records: Vec<HoldingsRecord>,
    pub fetched_at: DateTime<Utc>,
}

impl HoldingsSnapshot {
    pub fn new(asset: AssetKind, records: Vec<HoldingsRecord>) -> Self {
        Self {
            asset,
            records,
            fetched_at: Utc::now(),
        }
    }

    pub fn total_quantity(&self) -> Result<Decimal> {
        checked_sum(self.records.iter().map(|r| r.quantity), "total holdings")
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Sum that reports overflow as `InvalidInput` instead of panicking
pub(crate) fn checked_sum<I>(values: I, what: &str) -> Result<Decimal>
where
    I: IntoIterator<Item = Decimal>,
{
    values
        .into_iter()
        .try_fold(Decimal::ZERO, |acc, v| acc.checked_add(v))
        .ok_or_else(|| TreasuryError::invalid(format!("{} exceeds decimal range", what)))
}

/// Where a price context came from. Audit/display only.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provenance {
    #[default]
    Live,
    Hypothetical,
}

/// Hypothetical per-unit prices (reference currency) keyed by asset
pub type PriceOverrides = BTreeMap<AssetKind, Decimal>;

/// A valuation scenario: per-unit prices plus the conversion into the
/// display currency.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PriceContext {
    /// Price per unit in the reference currency
    pub prices: BTreeMap<AssetKind, Decimal>,

    /// Reference -> display currency multiplier
    pub exchange_rate: Decimal,

    pub currency: Currency,

    pub provenance: Provenance,
}

impl PriceContext {
    pub fn live(currency: Currency, exchange_rate: Decimal) -> Self {
        Self {
            prices: BTreeMap::new(),
            exchange_rate,
            currency,
            provenance: Provenance::Live,
        }
    }

    pub fn with_price(mut self, asset: AssetKind, price: Decimal) -> Self {
        self.prices.insert(asset, price);
        self
    }

    pub fn price(&self, asset: AssetKind) -> Option<Decimal> {
        self.prices.get(&asset).copied()
    }

    /// Every price and the exchange rate must be strictly positive
    pub fn validate(&self) -> Result<()> {
        if self.exchange_rate <= Decimal::ZERO {
            return Err(TreasuryError::invalid(format!(
                "exchange rate to {} must be positive, got {}",
                self.currency, self.exchange_rate
            )));
        }
        for (asset, price) in &self.prices {
            if *price <= Decimal::ZERO {
                return Err(TreasuryError::invalid(format!(
                    "{} price must be positive, got {}",
                    asset, price
                )));
            }
        }
        Ok(())
    }

    /// New context with the given prices replaced. The exchange rate and
    /// any asset not overridden keep their values; `self` is untouched.
    pub fn with_overrides(&self, overrides: &PriceOverrides) -> Self {
        let mut next = self.clone();
        if overrides.is_empty() {
            return next;
        }
        for (asset, price) in overrides {
            next.prices.insert(*asset, *price);
        }
        next.provenance = Provenance::Hypothetical;
        next
    }
}

/// Unrealized PnL relative to cost, in percent. `NotApplicable` when there
/// is no cost basis to compare against.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PnlPercent {
    Value(Decimal),
    NotApplicable,
}

impl PnlPercent {
    pub fn from_pnl(pnl: Decimal, cost: Decimal) -> Self {
        if cost.is_zero() {
            return PnlPercent::NotApplicable;
        }
        match pnl.checked_div(cost).and_then(|r| r.checked_mul(dec!(100))) {
            Some(percent) => PnlPercent::Value(percent),
            None => PnlPercent::NotApplicable,
        }
    }

    pub fn value(&self) -> Option<Decimal> {
        match self {
            PnlPercent::Value(v) => Some(*v),
            PnlPercent::NotApplicable => None,
        }
    }
}

impl fmt::Display for PnlPercent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PnlPercent::Value(v) => write!(f, "{:.2}%", v),
            PnlPercent::NotApplicable => f.write_str("N/A"),
        }
    }
}

impl Serialize for PnlPercent {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            PnlPercent::Value(v) => Serialize::serialize(v, serializer),
            PnlPercent::NotApplicable => serializer.serialize_str("N/A"),
        }
    }
}

/// Derived metrics for one company, in the display currency. Recomputed on
/// demand, never cached.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ValuationResult {
    pub name: String,
    pub symbol: String,
    pub country: String,

    /// Units held per asset
    pub holdings: BTreeMap<AssetKind, Decimal>,

    /// Acquisition cost converted to the display currency
    pub cost_basis: Decimal,

    /// Quantity * price * exchange rate
    pub current_value: Decimal,

    pub unrealized_pnl: Decimal,

    pub pnl_percent: PnlPercent,

    /// Set on a combined result whose per-asset sources disagree on name or country
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub metadata_mismatch: bool,
}

impl ValuationResult {
    /// Units held of one asset (zero if none)
    pub fn quantity(&self, asset: AssetKind) -> Decimal {
        self.holdings.get(&asset).copied().unwrap_or(Decimal::ZERO)
    }

    pub fn holds(&self, asset: AssetKind) -> bool {
        self.quantity(asset) > Decimal::ZERO
    }

    pub fn join_key(&self) -> String {
        join_key(&self.symbol)
    }
}
