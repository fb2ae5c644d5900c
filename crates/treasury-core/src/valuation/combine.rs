//! Cross-asset view: one row per company across the BTC and ETH collections

use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};

use crate::error::Result;
use crate::model::{checked_sum, PnlPercent, ValuationResult, UNKNOWN_SYMBOL};

use super::aggregate::by_value_desc;

/// Merge per-asset results into one result per company.
///
/// Companies are matched on ticker (trimmed, case-insensitive), and only
/// across the two collections: a ticker that appears exactly once on each
/// side is joined. Everything else passes through unchanged, including
/// companies found in only one collection, repeated tickers within one
/// collection and companies listed without a ticker.
///
/// A joined company gets summed value, cost, PnL and holdings, with PnL
/// percent recomputed from the sums. If the two rows disagree on name or
/// country, the row that holds the lowest-ordered asset (BTC before ETH)
/// supplies the metadata and `metadata_mismatch` is set. Sums that exceed
/// the decimal range fail with `InvalidInput`.
///
/// Output is sorted by current value descending, so argument order does not
/// affect the result.
pub fn combined_view(
    first: &[ValuationResult],
    second: &[ValuationResult],
) -> Result<Vec<ValuationResult>> {
    let left = group_by_key(first);
    let right = group_by_key(second);
    let keys: BTreeSet<&String> = left.keys().chain(right.keys()).collect();

    let mut combined = Vec::with_capacity(first.len() + second.len());
    for key in keys {
        let l = left.get(key).map(Vec::as_slice).unwrap_or_default();
        let r = right.get(key).map(Vec::as_slice).unwrap_or_default();
        match (l, r) {
            ([a], [b]) if is_joinable(key) => combined.push(merge(a, b)?),
            _ => {
                if l.len() > 1 || r.len() > 1 {
                    tracing::debug!(key = %key, "ticker repeated within a collection, rows kept apart");
                }
                combined.extend(l.iter().chain(r).map(|row| (*row).clone()));
            }
        }
    }

    combined.sort_by(|a, b| {
        by_value_desc(a, b)
            .then_with(|| a.holdings.cmp(&b.holdings))
            .then_with(|| a.country.cmp(&b.country))
    });
    Ok(combined)
}

fn group_by_key(results: &[ValuationResult]) -> BTreeMap<String, Vec<&ValuationResult>> {
    let mut groups: BTreeMap<String, Vec<&ValuationResult>> = BTreeMap::new();
    for r in results {
        groups.entry(r.join_key()).or_default().push(r);
    }
    groups
}

/// Placeholder tickers identify no company and never join
fn is_joinable(key: &str) -> bool {
    !key.is_empty() && key != UNKNOWN_SYMBOL
}

fn lead_order(a: &ValuationResult, b: &ValuationResult) -> Ordering {
    a.holdings
        .keys()
        .next()
        .cmp(&b.holdings.keys().next())
        .then_with(|| a.name.cmp(&b.name))
}

fn merge(a: &ValuationResult, b: &ValuationResult) -> Result<ValuationResult> {
    let (lead, other) = if lead_order(a, b).is_le() { (a, b) } else { (b, a) };

    let mut holdings = lead.holdings.clone();
    for (asset, qty) in &other.holdings {
        let slot = holdings.entry(*asset).or_default();
        *slot = checked_sum([*slot, *qty], "combined holdings")?;
    }

    let cost_basis = checked_sum([lead.cost_basis, other.cost_basis], "combined cost basis")?;
    let current_value = checked_sum([lead.current_value, other.current_value], "combined value")?;
    let unrealized_pnl = checked_sum([lead.unrealized_pnl, other.unrealized_pnl], "combined PnL")?;

    let metadata_mismatch = lead.metadata_mismatch
        || other.metadata_mismatch
        || lead.name.trim() != other.name.trim()
        || lead.country.trim() != other.country.trim();

    if metadata_mismatch {
        tracing::warn!(
            symbol = %lead.symbol,
            "company metadata differs between asset feeds"
        );
    }

    Ok(ValuationResult {
        name: lead.name.clone(),
        symbol: lead.symbol.clone(),
        country: lead.country.clone(),
        holdings,
        cost_basis,
        current_value,
        unrealized_pnl,
        pnl_percent: PnlPercent::from_pnl(unrealized_pnl, cost_basis),
        metadata_mismatch,
    })
}
