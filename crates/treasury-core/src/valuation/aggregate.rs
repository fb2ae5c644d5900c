//! Portfolio-wide totals, top holders and the PnL distribution

use std::cmp::Ordering;

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::Serialize;

use crate::error::Result;
use crate::model::{checked_sum, PnlPercent, ValuationResult};

/// Totals and rankings over a set of valuation results
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Aggregate {
    pub company_count: usize,
    pub total_value: Decimal,
    pub total_cost: Decimal,
    pub total_pnl: Decimal,
    pub total_pnl_percent: PnlPercent,

    /// Largest holders by current value
    pub top_holders: Vec<ValuationResult>,

    /// Equal-width buckets over the observed PnL range
    pub pnl_histogram: Vec<HistogramBucket>,
}

/// One bucket of the PnL histogram. Bounds are in the display currency;
/// every bucket is half-open except the last, which includes `upper`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HistogramBucket {
    pub lower: Decimal,
    pub upper: Decimal,
    pub count: usize,
}

/// Sum the results and rank the `top_n` largest holders into `buckets`
/// histogram buckets. An empty input yields zero totals and no buckets.
/// Totals beyond the decimal range fail with `InvalidInput`.
pub fn aggregate(results: &[ValuationResult], top_n: usize, buckets: usize) -> Result<Aggregate> {
    let total_value = checked_sum(results.iter().map(|r| r.current_value), "total value")?;
    let total_cost = checked_sum(results.iter().map(|r| r.cost_basis), "total cost")?;
    let total_pnl = checked_sum(results.iter().map(|r| r.unrealized_pnl), "total PnL")?;

    Ok(Aggregate {
        company_count: results.len(),
        total_value,
        total_cost,
        total_pnl,
        total_pnl_percent: PnlPercent::from_pnl(total_pnl, total_cost),
        top_holders: top_holders(results, top_n),
        pnl_histogram: pnl_histogram(results, buckets),
    })
}

/// The `n` results with the largest current value. Ties are broken by
/// company name, then ticker, ascending.
pub fn top_holders(results: &[ValuationResult], n: usize) -> Vec<ValuationResult> {
    let mut ranked: Vec<&ValuationResult> = results.iter().collect();
    ranked.sort_by(|a, b| by_value_desc(a, b));
    ranked.into_iter().take(n).cloned().collect()
}

/// Deterministic ordering shared by rankings and the combined view
pub(crate) fn by_value_desc(a: &ValuationResult, b: &ValuationResult) -> Ordering {
    b.current_value
        .cmp(&a.current_value)
        .then_with(|| a.name.cmp(&b.name))
        .then_with(|| a.symbol.cmp(&b.symbol))
}

/// Partition unrealized PnL into `k` equal-width buckets spanning the
/// observed [min, max]. A range that cannot be split into non-zero widths
/// (identical PnLs, a span below decimal precision, or one too wide to
/// represent) yields a single bucket.
pub fn pnl_histogram(results: &[ValuationResult], k: usize) -> Vec<HistogramBucket> {
    if k == 0 {
        return Vec::new();
    }

    let mut pnls = results.iter().map(|r| r.unrealized_pnl);
    let Some(first) = pnls.next() else {
        return Vec::new();
    };
    let (min, max) = pnls.fold((first, first), |(lo, hi), v| (lo.min(v), hi.max(v)));

    let Some(width) = max
        .checked_sub(min)
        .and_then(|range| range.checked_div(Decimal::from(k)))
        .filter(|w| !w.is_zero())
    else {
        return vec![HistogramBucket {
            lower: min,
            upper: max,
            count: results.len(),
        }];
    };

    let edge = |i: usize| {
        width
            .checked_mul(Decimal::from(i))
            .and_then(|offset| min.checked_add(offset))
            .map_or(max, |e| e.min(max))
    };
    let mut out: Vec<HistogramBucket> = (0..k)
        .map(|i| HistogramBucket {
            lower: edge(i),
            upper: if i + 1 == k { max } else { edge(i + 1) },
            count: 0,
        })
        .collect();

    for r in results {
        let index = r
            .unrealized_pnl
            .checked_sub(min)
            .and_then(|offset| offset.checked_div(width))
            .and_then(|q| q.floor().to_usize())
            .unwrap_or(0)
            .min(k - 1);
        out[index].count += 1;
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TreasuryError;
    use crate::model::AssetKind;
    use rust_decimal_macros::dec;
    use std::collections::BTreeMap;

    fn result(name: &str, value: Decimal, cost: Decimal) -> ValuationResult {
        let pnl = value - cost;
        ValuationResult {
            name: name.into(),
            symbol: name.to_uppercase(),
            country: "US".into(),
            holdings: BTreeMap::from([(AssetKind::Btc, dec!(1))]),
            cost_basis: cost,
            current_value: value,
            unrealized_pnl: pnl,
            pnl_percent: PnlPercent::from_pnl(pnl, cost),
            metadata_mismatch: false,
        }
    }

    #[test]
    fn test_totals() {
        let results = vec![
            result("Alpha", dec!(400000), dec!(300000)),
            result("Beta", dec!(250000), dec!(300000)),
        ];
        let agg = aggregate(&results, 10, 4).unwrap();

        assert_eq!(agg.total_value, dec!(650000));
        assert_eq!(agg.total_cost, dec!(600000));
        assert_eq!(agg.total_pnl, dec!(50000));
        assert_eq!(agg.company_count, 2);
        assert_eq!(agg.top_holders.len(), 2);
    }

    #[test]
    fn test_empty_aggregate() {
        let agg = aggregate(&[], 5, 5).unwrap();
        assert_eq!(agg.total_value, Decimal::ZERO);
        assert_eq!(agg.total_pnl, Decimal::ZERO);
        assert_eq!(agg.total_pnl_percent, PnlPercent::NotApplicable);
        assert!(agg.top_holders.is_empty());
        assert!(agg.pnl_histogram.is_empty());
    }

    #[test]
    fn test_top_holder_is_largest() {
        let results = vec![
            result("Beta", dec!(250000), dec!(1)),
            result("Alpha", dec!(400000), dec!(1)),
        ];
        let top = top_holders(&results, 1);
        assert_eq!(top.len(), 1);
        assert_eq!(top[0].current_value, dec!(400000));
    }

    #[test]
    fn test_top_holders_ties_by_name() {
        let results = vec![
            result("Zeta", dec!(100), dec!(1)),
            result("Alpha", dec!(100), dec!(1)),
            result("Mid", dec!(100), dec!(1)),
        ];
        let names: Vec<_> = top_holders(&results, 3).into_iter().map(|r| r.name).collect();
        assert_eq!(names, vec!["Alpha", "Mid", "Zeta"]);
    }

    #[test]
    fn test_top_holders_n_exceeds_len() {
        let results = vec![result("Alpha", dec!(1), dec!(1))];
        assert_eq!(top_holders(&results, 10).len(), 1);
    }

    #[test]
    fn test_histogram_buckets() {
        // PnL: -100, 0, 50, 100, 300 -> range 400, width 100
        let results = vec![
            result("A", dec!(0), dec!(100)),
            result("B", dec!(100), dec!(100)),
            result("C", dec!(150), dec!(100)),
            result("D", dec!(200), dec!(100)),
            result("E", dec!(400), dec!(100)),
        ];
        let hist = pnl_histogram(&results, 4);

        assert_eq!(hist.len(), 4);
        assert_eq!(hist[0].lower, dec!(-100));
        assert_eq!(hist[3].upper, dec!(300));
        let counts: Vec<_> = hist.iter().map(|b| b.count).collect();
        assert_eq!(counts, vec![1, 2, 1, 1]);
        assert_eq!(counts.iter().sum::<usize>(), results.len());
    }

    #[test]
    fn test_histogram_degenerate_range() {
        let results = vec![
            result("A", dec!(200), dec!(100)),
            result("B", dec!(300), dec!(200)),
        ];
        let hist = pnl_histogram(&results, 8);

        assert_eq!(hist.len(), 1);
        assert_eq!(hist[0].count, 2);
        assert_eq!(hist[0].lower, dec!(100));
    }

    #[test]
    fn test_histogram_zero_buckets() {
        let results = vec![result("A", dec!(200), dec!(100))];
        assert!(pnl_histogram(&results, 0).is_empty());
    }

    #[test]
    fn test_histogram_range_below_precision() {
        let results = vec![
            result("A", dec!(0), dec!(0)),
            result("B", dec!(0.0000000000000000000000000001), dec!(0)),
        ];
        let hist = pnl_histogram(&results, 4);

        assert_eq!(hist.len(), 1);
        assert_eq!(hist[0].count, 2);
        assert_eq!(hist[0].upper, dec!(0.0000000000000000000000000001));
    }

    #[test]
    fn test_histogram_range_beyond_decimal() {
        let results = vec![
            result("Low", dec!(0), Decimal::MAX),
            result("High", Decimal::MAX, dec!(0)),
        ];
        let hist = pnl_histogram(&results, 5);

        assert_eq!(hist.len(), 1);
        assert_eq!(hist[0].lower, Decimal::MIN);
        assert_eq!(hist[0].upper, Decimal::MAX);
    }

    #[test]
    fn test_near_max_totals_are_invalid() {
        let results = vec![
            result("Alpha", Decimal::MAX, dec!(1)),
            result("Beta", Decimal::MAX, dec!(1)),
        ];
        let err = aggregate(&results, 2, 2).unwrap_err();
        assert!(matches!(err, TreasuryError::InvalidInput(_)));
    }
}
