//! Snapshot Statistics
//!
//! Headline figures shown above the holdings tables: supply dominance,
//! per-company averages and how combined value splits between assets.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Serialize;

use crate::error::Result;
use crate::model::{checked_sum, AssetKind, HoldingsSnapshot, ValuationResult};

/// Figures for a single asset's holdings snapshot
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SnapshotStats {
    pub asset: AssetKind,
    pub company_count: usize,
    pub total_quantity: Decimal,
    pub average_quantity: Decimal,

    /// Percent of the asset's supply held by the listed companies
    pub supply_dominance: Decimal,

    /// Dominance clamped to [0, 100] for the companies-vs-others split
    pub companies_share: Decimal,
    pub others_share: Decimal,

    pub fetched_at: DateTime<Utc>,
}

impl SnapshotStats {
    pub fn from_snapshot(snapshot: &HoldingsSnapshot) -> Result<Self> {
        let company_count = snapshot.len();
        let total_quantity = snapshot.total_quantity()?;
        let average_quantity = if company_count == 0 {
            Decimal::ZERO
        } else {
            total_quantity / Decimal::from(company_count)
        };

        let supply_dominance = supply_dominance(snapshot)?;
        let companies_share = supply_dominance.clamp(Decimal::ZERO, dec!(100));

        Ok(Self {
            asset: snapshot.asset,
            company_count,
            total_quantity,
            average_quantity,
            supply_dominance,
            companies_share,
            others_share: dec!(100) - companies_share,
            fetched_at: snapshot.fetched_at,
        })
    }
}

/// Sum of the reported per-company supply shares. When no company reports
/// one, fall back to total holdings over the asset's capped supply.
pub fn supply_dominance(snapshot: &HoldingsSnapshot) -> Result<Decimal> {
    let reported: Vec<Decimal> = snapshot
        .records
        .iter()
        .filter_map(|r| r.supply_share)
        .collect();

    if !reported.is_empty() {
        return checked_sum(reported, "reported supply share");
    }

    match snapshot.asset.max_supply() {
        Some(cap) if !snapshot.is_empty() => Ok(snapshot.total_quantity()? / cap * dec!(100)),
        _ => Ok(Decimal::ZERO),
    }
}

/// Figures for the cross-asset view
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct CombinedStats {
    pub company_count: usize,

    /// Companies holding a non-zero amount of each asset
    pub holders: BTreeMap<AssetKind, usize>,

    pub total_quantity: BTreeMap<AssetKind, Decimal>,

    /// Current value held in each asset, display currency
    pub value_distribution: BTreeMap<AssetKind, Decimal>,
}

impl CombinedStats {
    /// `combined` is the merged view; `per_asset` the single-asset results
    /// it was built from.
    pub fn compute(per_asset: &[ValuationResult], combined: &[ValuationResult]) -> Result<Self> {
        let mut holders = BTreeMap::new();
        let mut total_quantity = BTreeMap::new();
        let mut value_distribution = BTreeMap::new();
        for asset in AssetKind::ALL {
            holders.insert(asset, combined.iter().filter(|r| r.holds(asset)).count());
            total_quantity.insert(
                asset,
                checked_sum(combined.iter().map(|r| r.quantity(asset)), "combined holdings")?,
            );

            // Single-asset rows only
            let held_value = per_asset
                .iter()
                .filter(|r| r.holdings.len() == 1 && r.holdings.contains_key(&asset))
                .map(|r| r.current_value);
            value_distribution.insert(asset, checked_sum(held_value, "value per asset")?);
        }

        Ok(Self {
            company_count: combined.len(),
            holders,
            total_quantity,
            value_distribution,
        })
    }
}
