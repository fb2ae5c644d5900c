//! Per-record valuation and what-if recomputation

use std::collections::BTreeMap;

use rust_decimal::Decimal;

use crate::error::{Result, TreasuryError};
use crate::model::{HoldingsRecord, PnlPercent, PriceContext, PriceOverrides, ValuationResult};

/// Value every record under `ctx`.
///
/// Fails with `InvalidInput` if any price or the exchange rate is not
/// positive, if a record's asset is missing from the context, or if a record
/// carries negative holdings. A zero cost basis is not an error: the result
/// reports its PnL percentage as N/A. Either every record is valued or none.
pub fn valuate(records: &[HoldingsRecord], ctx: &PriceContext) -> Result<Vec<ValuationResult>> {
    ctx.validate()?;

    records
        .iter()
        .map(|record| valuate_one(record, ctx))
        .collect()
}

/// Re-run [`valuate`] with some asset prices replaced.
///
/// The exchange rate and every price not named in `overrides` come from
/// `base`, which is left unchanged. An empty override set reproduces
/// `valuate(records, base)` exactly.
pub fn what_if(
    records: &[HoldingsRecord],
    base: &PriceContext,
    overrides: &PriceOverrides,
) -> Result<Vec<ValuationResult>> {
    let scenario = base.with_overrides(overrides);
    tracing::debug!(
        overrides = overrides.len(),
        currency = %scenario.currency,
        "what-if valuation"
    );
    valuate(records, &scenario)
}

fn valuate_one(record: &HoldingsRecord, ctx: &PriceContext) -> Result<ValuationResult> {
    record.validate()?;

    let price = ctx.price(record.asset).ok_or_else(|| {
        TreasuryError::invalid(format!("no {} price in context", record.asset))
    })?;

    let current_value = checked_product(&[record.quantity, price, ctx.exchange_rate])?;
    let cost_basis = checked_product(&[record.acquisition_cost, ctx.exchange_rate])?;
    let unrealized_pnl = current_value - cost_basis;

    Ok(ValuationResult {
        name: record.name.clone(),
        symbol: record.symbol.clone(),
        country: record.country.clone(),
        holdings: BTreeMap::from([(record.asset, record.quantity)]),
        cost_basis,
        current_value,
        unrealized_pnl,
        pnl_percent: PnlPercent::from_pnl(unrealized_pnl, cost_basis),
        metadata_mismatch: false,
    })
}

fn checked_product(factors: &[Decimal]) -> Result<Decimal> {
    factors
        .iter()
        .try_fold(Decimal::ONE, |acc, f| acc.checked_mul(*f))
        .ok_or_else(|| TreasuryError::invalid("value exceeds decimal range"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{AssetKind, Currency, Provenance};
    use rust_decimal_macros::dec;

    fn strategy_co() -> HoldingsRecord {
        HoldingsRecord::new("Strategy", "MSTR", "US", AssetKind::Btc, dec!(10), dec!(300000))
            .unwrap()
    }

    fn usd_context(btc: Decimal) -> PriceContext {
        PriceContext::live(Currency::Usd, dec!(1)).with_price(AssetKind::Btc, btc)
    }

    #[test]
    fn test_valuate_gain() {
        let results = valuate(&[strategy_co()], &usd_context(dec!(40000))).unwrap();
        let r = &results[0];

        assert_eq!(r.current_value, dec!(400000));
        assert_eq!(r.unrealized_pnl, dec!(100000));
        assert_eq!(r.pnl_percent.value().unwrap().round_dp(2), dec!(33.33));
        assert_eq!(r.quantity(AssetKind::Btc), dec!(10));
    }

    #[test]
    fn test_what_if_loss() {
        let overrides = PriceOverrides::from([(AssetKind::Btc, dec!(25000))]);
        let results = what_if(&[strategy_co()], &usd_context(dec!(40000)), &overrides).unwrap();
        let r = &results[0];

        assert_eq!(r.current_value, dec!(250000));
        assert_eq!(r.unrealized_pnl, dec!(-50000));
        assert_eq!(r.pnl_percent.value().unwrap().round_dp(2), dec!(-16.67));
    }

    #[test]
    fn test_pnl_percent_matches_definition() {
        let record =
            HoldingsRecord::new("Metaplanet", "3350.T", "JP", AssetKind::Btc, dec!(7.5), dec!(123456.78))
                .unwrap();
        let ctx = PriceContext::live(Currency::Jpy, dec!(151.37)).with_price(AssetKind::Btc, dec!(61234.5));

        let r = &valuate(&[record.clone()], &ctx).unwrap()[0];

        let cost = record.acquisition_cost * ctx.exchange_rate;
        assert_eq!(r.cost_basis, cost);
        assert_eq!(
            r.pnl_percent,
            PnlPercent::Value(r.unrealized_pnl / r.cost_basis * dec!(100))
        );
    }

    #[test]
    fn test_zero_cost_reports_not_applicable() {
        let record =
            HoldingsRecord::new("Gifted", "GIFT", "US", AssetKind::Btc, dec!(3), dec!(0)).unwrap();
        for price in [dec!(1), dec!(40000), dec!(125000)] {
            let r = &valuate(&[record.clone()], &usd_context(price)).unwrap()[0];
            assert_eq!(r.pnl_percent, PnlPercent::NotApplicable);
            assert_eq!(r.unrealized_pnl, r.current_value);
        }
    }

    #[test]
    fn test_display_currency_conversion() {
        let ctx = PriceContext::live(Currency::Eur, dec!(0.9)).with_price(AssetKind::Btc, dec!(40000));
        let r = &valuate(&[strategy_co()], &ctx).unwrap()[0];

        assert_eq!(r.current_value, dec!(360000));
        assert_eq!(r.cost_basis, dec!(270000));
        assert_eq!(r.unrealized_pnl, dec!(90000));
    }

    #[test]
    fn test_zero_price_is_invalid() {
        let err = valuate(&[strategy_co()], &usd_context(dec!(0))).unwrap_err();
        assert!(matches!(err, TreasuryError::InvalidInput(_)));
    }

    #[test]
    fn test_non_positive_rate_is_invalid() {
        let ctx = PriceContext::live(Currency::Cad, dec!(0)).with_price(AssetKind::Btc, dec!(40000));
        assert!(matches!(
            valuate(&[], &ctx),
            Err(TreasuryError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_missing_price_is_invalid() {
        let eth_holder =
            HoldingsRecord::new("BitMine", "BMNR", "US", AssetKind::Eth, dec!(100), dec!(1)).unwrap();
        let err = valuate(&[strategy_co(), eth_holder], &usd_context(dec!(40000))).unwrap_err();
        assert!(matches!(err, TreasuryError::InvalidInput(_)));
    }

    #[test]
    fn test_negative_override_is_invalid() {
        let overrides = PriceOverrides::from([(AssetKind::Btc, dec!(-5))]);
        let err = what_if(&[strategy_co()], &usd_context(dec!(40000)), &overrides).unwrap_err();
        assert!(matches!(err, TreasuryError::InvalidInput(_)));
    }

    #[test]
    fn test_empty_overrides_match_valuate() {
        let records = vec![strategy_co()];
        let ctx = usd_context(dec!(40000));

        let plain = valuate(&records, &ctx).unwrap();
        let hypo = what_if(&records, &ctx, &PriceOverrides::new()).unwrap();

        assert_eq!(plain, hypo);
    }

    #[test]
    fn test_what_if_does_not_mutate_base() {
        let ctx = usd_context(dec!(40000));
        let snapshot = ctx.clone();
        let overrides = PriceOverrides::from([(AssetKind::Btc, dec!(1))]);

        what_if(&[strategy_co()], &ctx, &overrides).unwrap();

        assert_eq!(ctx, snapshot);
        assert_eq!(ctx.provenance, Provenance::Live);
    }
}
