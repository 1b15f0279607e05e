use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::config::{FederalSegment, FederalTable};
use crate::error::TaxGlideError;
use crate::rounding::{ceil_to_hundred, floor_to_nickel};
use crate::types::{Money, Rate};
use crate::TaxGlideResult;

/// Federal tax for a taxable income under one tariff table.
///
/// The taxable income is lifted to the next full 100 (official step rule),
/// the covering segment supplies an anchor amount plus a per-100 marginal,
/// and the result is rounded down to the nearest 0.05 (ESTV practice).
pub fn federal_tax(income: Money, table: &FederalTable) -> TaxGlideResult<Money> {
    let income = income.max(Decimal::ZERO);
    let stepped = ceil_to_hundred(income);

    let first = table.segments.first().ok_or_else(|| {
        TaxGlideError::CalculationError("federal table has no segments".into())
    })?;
    if stepped < first.from {
        return Ok(Decimal::ZERO);
    }

    let seg = segment_at(stepped, table)?;
    // Exact by construction: stepped is a multiple of 100 and anchors sit on
    // segment boundaries.
    let units = (stepped - seg.at_income) / dec!(100);
    let raw = seg.base_tax_at + units * seg.per100;
    Ok(floor_to_nickel(raw))
}

/// Segment covering the stepped income. A missing segment for a covered
/// income range is a configuration bug, not a user error.
pub fn segment_at(income: Money, table: &FederalTable) -> TaxGlideResult<&FederalSegment> {
    let stepped = ceil_to_hundred(income.max(Decimal::ZERO));
    table.segment_for(stepped).ok_or_else(|| {
        TaxGlideError::CalculationError(format!(
            "no federal segment covers income {stepped}"
        ))
    })
}

/// Marginal federal rate as a fraction (per100 is CHF per 100 CHF).
/// Incomes below the tariff floor have a zero marginal.
pub fn marginal_rate(income: Money, table: &FederalTable) -> TaxGlideResult<Rate> {
    let stepped = ceil_to_hundred(income.max(Decimal::ZERO));
    match table.segments.first() {
        Some(first) if stepped < first.from => return Ok(Decimal::ZERO),
        _ => {}
    }
    let seg = segment_at(income, table)?;
    Ok(seg.per100 / dec!(100))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TaxConfig;

    fn single_table() -> FederalTable {
        TaxConfig::builtin(2025).unwrap().federal.single.clone()
    }

    #[test]
    fn test_below_threshold_is_zero() {
        let table = single_table();
        assert_eq!(federal_tax(dec!(12000), &table).unwrap(), Decimal::ZERO);
        assert_eq!(federal_tax(dec!(0), &table).unwrap(), Decimal::ZERO);
    }

    #[test]
    fn test_negative_income_clamps_to_zero() {
        let table = single_table();
        assert_eq!(federal_tax(dec!(-5000), &table).unwrap(), Decimal::ZERO);
    }

    #[test]
    fn test_known_single_amounts() {
        let table = single_table();
        assert_eq!(federal_tax(dec!(32000), &table).unwrap(), dec!(129.35));
        assert_eq!(federal_tax(dec!(60000), &table).unwrap(), dec!(671.45));
        assert_eq!(federal_tax(dec!(90000), &table).unwrap(), dec!(2027.95));
        assert_eq!(federal_tax(dec!(120000), &table).unwrap(), dec!(4254.35));
    }

    #[test]
    fn test_step_ceiling_lifts_to_next_hundred() {
        let table = single_table();
        // 33,150 is stepped to 33,200, the start of the 0.88 segment.
        assert_eq!(
            federal_tax(dec!(33150), &table).unwrap(),
            federal_tax(dec!(33200), &table).unwrap()
        );
        assert_eq!(federal_tax(dec!(33200), &table).unwrap(), dec!(138.60));
    }

    #[test]
    fn test_boundary_income_uses_higher_segment() {
        let table = single_table();
        let seg = segment_at(dec!(82000), &table).unwrap();
        assert_eq!(seg.from, dec!(82000));
        assert_eq!(seg.per100, dec!(5.86));
    }

    #[test]
    fn test_marginal_rate_is_fraction() {
        let table = single_table();
        assert_eq!(marginal_rate(dec!(90000), &table).unwrap(), dec!(0.0586));
        assert_eq!(marginal_rate(dec!(20000), &table).unwrap(), dec!(0.0077));
    }

    #[test]
    fn test_flat_top_segment() {
        let table = single_table();
        // Above the top threshold the tariff is flat 11.5% of income.
        let tax = federal_tax(dec!(800000), &table).unwrap();
        assert_eq!(tax, dec!(800000) * dec!(0.115));
    }

    #[test]
    fn test_monotone_over_boundaries() {
        let table = single_table();
        let mut prev = Decimal::ZERO;
        let mut income = Decimal::ZERO;
        while income <= dec!(260000) {
            let tax = federal_tax(income, &table).unwrap();
            assert!(tax >= prev, "federal tax decreased at income {income}");
            prev = tax;
            income += dec!(100);
        }
    }
}
