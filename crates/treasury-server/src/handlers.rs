//! HTTP Handlers

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use treasury_core::{
    aggregate, combined_view, what_if, Aggregate, AssetKind, CombinedStats, Currency,
    HoldingsProvider, PriceOverrides, PriceProvider, Provenance, SnapshotStats, TreasuryError,
    ValuationResult,
};

use crate::state::AppState;

// ============================================================================
// Request / Response Types
// ============================================================================

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub provider: String,
    pub cache_ttl_secs: u64,
}

#[derive(Debug, Default, Deserialize)]
pub struct CurrencyQuery {
    #[serde(default)]
    pub currency: Option<String>,
}

/// Which holdings a view covers
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scope {
    Btc,
    Eth,
    Both,
}

impl From<AssetKind> for Scope {
    fn from(asset: AssetKind) -> Self {
        match asset {
            AssetKind::Btc => Scope::Btc,
            AssetKind::Eth => Scope::Eth,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct WhatIfRequest {
    /// `btc`, `eth` or `both`
    pub asset: Scope,
    #[serde(default)]
    pub currency: Option<String>,
    /// Hypothetical USD price per asset, e.g. `{"BTC": "25000"}`
    #[serde(default)]
    pub overrides: PriceOverrides,
}

#[derive(Debug, Serialize)]
pub struct ValuationView {
    pub scope: Scope,
    pub currency: Currency,
    pub provenance: Provenance,
    pub exchange_rate: String,
    pub results: Vec<ValuationResult>,
    pub summary: Aggregate,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub asset_stats: Option<SnapshotStats>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub combined_stats: Option<CombinedStats>,
    pub fetched_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct RefreshResponse {
    pub refreshed: bool,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

/// Engine and provider errors rendered as JSON
pub struct ApiError(TreasuryError);

impl From<TreasuryError> for ApiError {
    fn from(err: TreasuryError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = match &self.0 {
            TreasuryError::InvalidInput(_) => (StatusCode::BAD_REQUEST, "INVALID_INPUT"),
            TreasuryError::ProviderUnavailable(_) => {
                (StatusCode::SERVICE_UNAVAILABLE, "PROVIDER_UNAVAILABLE")
            }
            TreasuryError::Serialization(_) => (StatusCode::BAD_GATEWAY, "BAD_UPSTREAM_DATA"),
        };

        if status.is_server_error() {
            tracing::warn!(error = %self.0, "request failed");
        }

        let body = Json(ErrorResponse {
            error: match &self.0 {
                TreasuryError::InvalidInput(_) => self.0.to_string(),
                _ => self.0.user_message(),
            },
            code: code.into(),
        });
        (status, body).into_response()
    }
}

// ============================================================================
// Handlers
// ============================================================================

/// Health check endpoint
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
        provider: state.feed.name().to_string(),
        cache_ttl_secs: state.feed.ttl().as_secs(),
    })
}

/// Live valuation of one asset's treasury holders
pub async fn asset_view(
    State(state): State<AppState>,
    Path(asset): Path<String>,
    Query(query): Query<CurrencyQuery>,
) -> Result<Json<ValuationView>, ApiError> {
    let asset: AssetKind = asset.parse()?;
    let currency = parse_currency(query.currency.as_deref())?;
    let view = build_view(&state, asset.into(), currency, &PriceOverrides::new()).await?;
    Ok(Json(view))
}

/// Live valuation with BTC and ETH holdings merged per company
pub async fn combined(
    State(state): State<AppState>,
    Query(query): Query<CurrencyQuery>,
) -> Result<Json<ValuationView>, ApiError> {
    let currency = parse_currency(query.currency.as_deref())?;
    let view = build_view(&state, Scope::Both, currency, &PriceOverrides::new()).await?;
    Ok(Json(view))
}

/// Recompute a view under hypothetical prices. Nothing is cached.
pub async fn what_if_view(
    State(state): State<AppState>,
    Json(payload): Json<WhatIfRequest>,
) -> Result<Json<ValuationView>, ApiError> {
    let currency = parse_currency(payload.currency.as_deref())?;
    let view = build_view(&state, payload.asset, currency, &payload.overrides).await?;
    Ok(Json(view))
}

/// Manual refresh: drop cached holdings and prices
pub async fn refresh(State(state): State<AppState>) -> Json<RefreshResponse> {
    state.feed.invalidate().await;
    Json(RefreshResponse { refreshed: true })
}

fn parse_currency(raw: Option<&str>) -> Result<Currency, TreasuryError> {
    raw.map_or(Ok(Currency::REFERENCE), str::parse)
}

async fn build_view(
    state: &AppState,
    scope: Scope,
    currency: Currency,
    overrides: &PriceOverrides,
) -> Result<ValuationView, TreasuryError> {
    let prices = state.feed.fetch_prices(currency).await?;
    let provenance = prices.with_overrides(overrides).provenance;
    let config = &state.config;

    let (results, asset_stats, combined_stats, fetched_at) = match scope {
        Scope::Btc | Scope::Eth => {
            let asset = if scope == Scope::Btc { AssetKind::Btc } else { AssetKind::Eth };
            let snapshot = state.feed.fetch_holdings(asset).await?;
            let mut results = what_if(&snapshot.records, &prices, overrides)?;
            // Largest treasuries first, as in the holdings table
            results.sort_by(|a, b| b.quantity(asset).cmp(&a.quantity(asset)));
            let stats = SnapshotStats::from_snapshot(&snapshot)?;
            (results, Some(stats), None, snapshot.fetched_at)
        }
        Scope::Both => {
            let (btc, eth) = tokio::try_join!(
                state.feed.fetch_holdings(AssetKind::Btc),
                state.feed.fetch_holdings(AssetKind::Eth),
            )?;
            let btc_results = what_if(&btc.records, &prices, overrides)?;
            let eth_results = what_if(&eth.records, &prices, overrides)?;
            let merged = combined_view(&btc_results, &eth_results)?;

            let per_asset: Vec<ValuationResult> =
                btc_results.into_iter().chain(eth_results).collect();
            let stats = CombinedStats::compute(&per_asset, &merged)?;
            (merged, None, Some(stats), btc.fetched_at.min(eth.fetched_at))
        }
    };

    let summary = aggregate(&results, config.top_holders, config.histogram_buckets)?;

    Ok(ValuationView {
        scope,
        currency,
        provenance,
        exchange_rate: prices.exchange_rate.to_string(),
        results,
        summary,
        asset_stats,
        combined_stats,
        fetched_at,
    })
}
