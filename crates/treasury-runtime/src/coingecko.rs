//! CoinGecko Market Feed
//!
//! Implementation of `HoldingsProvider` and `PriceProvider` backed by the
//! CoinGecko public treasury and simple price endpoints, with USD-based FX
//! rates from open.er-api.com.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue};
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use serde::Deserialize;

use treasury_core::{
    AssetKind, Currency, HoldingsProvider, HoldingsRecord, HoldingsSnapshot, PriceContext,
    PriceProvider, Result, UNKNOWN_SYMBOL,
};

use crate::error::FeedError;

/// CoinGecko provider configuration
#[derive(Clone, Debug)]
pub struct CoinGeckoConfig {
    /// CoinGecko REST base URL
    pub base_url: String,

    /// USD-based FX rate API base URL
    pub fx_base_url: String,

    /// Optional API key, sent as `x-cg-api-key`
    pub api_key: Option<String>,

    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for CoinGeckoConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.coingecko.com/api/v3".into(),
            fx_base_url: "https://open.er-api.com".into(),
            api_key: None,
            timeout_secs: 10,
        }
    }
}

impl CoinGeckoConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let base_url = std::env::var("COINGECKO_BASE_URL").unwrap_or(defaults.base_url);
        let fx_base_url = std::env::var("FX_BASE_URL").unwrap_or(defaults.fx_base_url);
        let api_key = std::env::var("COINGECKO_API_KEY")
            .ok()
            .filter(|k| !k.trim().is_empty());
        let timeout_secs = std::env::var("HTTP_TIMEOUT_SECS")
            .ok()
            .and_then(|t| t.parse().ok())
            .unwrap_or(defaults.timeout_secs);

        Self {
            base_url,
            fx_base_url,
            api_key,
            timeout_secs,
        }
    }

    fn treasury_url(&self, asset: AssetKind) -> String {
        format!(
            "{}/companies/public_treasury/{}",
            self.base_url.trim_end_matches('/'),
            asset.coin_id()
        )
    }

    fn price_url(&self) -> String {
        let ids: Vec<&str> = AssetKind::ALL.iter().map(|a| a.coin_id()).collect();
        format!(
            "{}/simple/price?ids={}&vs_currencies=usd",
            self.base_url.trim_end_matches('/'),
            ids.join(",")
        )
    }

    fn fx_url(&self) -> String {
        format!("{}/v6/latest/USD", self.fx_base_url.trim_end_matches('/'))
    }
}

/// CoinGecko market feed
pub struct CoinGeckoClient {
    http: reqwest::Client,
    config: CoinGeckoConfig,
}

impl CoinGeckoClient {
    /// Create from configuration
    pub fn from_config(config: CoinGeckoConfig) -> std::result::Result<Self, FeedError> {
        let mut headers = HeaderMap::new();
        if let Some(key) = &config.api_key {
            let value = HeaderValue::from_str(key)
                .map_err(|e| FeedError::Config(format!("invalid API key header: {}", e)))?;
            headers.insert("x-cg-api-key", value);
        }

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self { http, config })
    }

    /// Create from environment variables
    pub fn from_env() -> std::result::Result<Self, FeedError> {
        Self::from_config(CoinGeckoConfig::from_env())
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> std::result::Result<T, FeedError> {
        let response = self.http.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            tracing::warn!(%status, url, "market data request failed");
            return Err(FeedError::Status {
                status,
                url: url.to_string(),
            });
        }
        Ok(response.json().await?)
    }

    async fn usd_rate(&self, currency: Currency) -> std::result::Result<Decimal, FeedError> {
        if currency.is_reference() {
            return Ok(Decimal::ONE);
        }
        let payload: FxResponse = self.get_json(&self.config.fx_url()).await?;
        payload.rate_for(currency)
    }
}

#[async_trait]
impl HoldingsProvider for CoinGeckoClient {
    async fn fetch_holdings(&self, asset: AssetKind) -> Result<HoldingsSnapshot> {
        let url = self.config.treasury_url(asset);
        let payload: TreasuryResponse = self.get_json(&url).await?;
        let snapshot = payload.into_snapshot(asset);
        tracing::info!(%asset, companies = snapshot.len(), "fetched treasury holdings");
        Ok(snapshot)
    }

    fn name(&self) -> &str {
        "CoinGecko"
    }
}

#[async_trait]
impl PriceProvider for CoinGeckoClient {
    async fn fetch_prices(&self, currency: Currency) -> Result<PriceContext> {
        let prices: SimplePriceResponse = self.get_json(&self.config.price_url()).await?;
        let rate = self.usd_rate(currency).await?;

        let mut ctx = PriceContext::live(currency, rate);
        for asset in AssetKind::ALL {
            ctx = ctx.with_price(asset, usd_price(&prices, asset)?);
        }
        tracing::info!(%currency, %rate, "fetched live prices");
        Ok(ctx)
    }
}

// ============================================================================
// Wire Types
// ============================================================================

#[derive(Debug, Deserialize)]
struct TreasuryResponse {
    #[serde(default)]
    companies: Vec<CompanyDto>,
}

#[derive(Debug, Deserialize)]
struct CompanyDto {
    name: Option<String>,
    symbol: Option<String>,
    country: Option<String>,
    total_holdings: Option<Decimal>,
    total_entry_value_usd: Option<Decimal>,
    percentage_of_total_supply: Option<Decimal>,
}

impl TreasuryResponse {
    /// Missing text defaults like the upstream table ("Unknown", "N/A");
    /// missing numbers default to zero. Rows with negative figures are
    /// dropped rather than failing the whole refresh.
    fn into_snapshot(self, asset: AssetKind) -> HoldingsSnapshot {
        let records = self
            .companies
            .into_iter()
            .filter_map(|c| {
                let record = HoldingsRecord::new(
                    c.name.unwrap_or_else(|| "Unknown".into()),
                    c.symbol.unwrap_or_else(|| UNKNOWN_SYMBOL.into()),
                    c.country.unwrap_or_else(|| "Unknown".into()),
                    asset,
                    c.total_holdings.unwrap_or_default(),
                    c.total_entry_value_usd.unwrap_or_default(),
                );
                match record {
                    Ok(r) => Some(match c.percentage_of_total_supply {
                        Some(share) => r.with_supply_share(share),
                        None => r,
                    }),
                    Err(e) => {
                        tracing::warn!(%asset, error = %e, "dropping treasury record");
                        None
                    }
                }
            })
            .collect();

        HoldingsSnapshot::new(asset, records)
    }
}

/// `{"bitcoin": {"usd": 117500.0}, ...}`
type SimplePriceResponse = HashMap<String, HashMap<String, Decimal>>;

fn usd_price(prices: &SimplePriceResponse, asset: AssetKind) -> std::result::Result<Decimal, FeedError> {
    prices
        .get(asset.coin_id())
        .and_then(|quotes| quotes.get("usd"))
        .copied()
        .ok_or_else(|| FeedError::Payload(format!("no USD price for {}", asset.coin_id())))
}

#[derive(Debug, Deserialize)]
struct FxResponse {
    result: String,
    #[serde(default)]
    rates: HashMap<String, Decimal>,
}

impl FxResponse {
    fn rate_for(&self, currency: Currency) -> std::result::Result<Decimal, FeedError> {
        if self.result != "success" {
            return Err(FeedError::Payload(format!("FX API returned '{}'", self.result)));
        }
        match self.rates.get(currency.code()) {
            Some(rate) if *rate > Decimal::ZERO => Ok(*rate),
            Some(rate) => Err(FeedError::Payload(format!(
                "non-positive USD/{} rate {}",
                currency, rate
            ))),
            None => Err(FeedError::Payload(format!("no USD/{} rate", currency))),
        }
    }
}
