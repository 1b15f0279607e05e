use rust_decimal::Decimal;
use serde::Serialize;

use crate::cantonal::bracket_at;
use crate::config::{Canton, TaxConfig};
use crate::error::TaxGlideError;
use crate::federal::segment_at;
use crate::types::{FilingStatus, Incomes, Money, Rate};
use crate::TaxGlideResult;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FederalBracketInfo {
    pub from: Money,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub to: Option<Money>,
    pub per100: Money,
    pub at_income: Money,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CantonalBracketInfo {
    pub lower: Money,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub upper: Option<Money>,
    pub rate_percent: Rate,
}

#[derive(Debug, Clone, Serialize)]
pub struct BracketComparison {
    pub original_sg_income: Money,
    pub original_fed_income: Money,
    pub adjusted_sg_income: Money,
    pub adjusted_fed_income: Money,
    pub deduction_amount: Money,
    pub federal_bracket_before: FederalBracketInfo,
    pub federal_bracket_after: FederalBracketInfo,
    pub federal_bracket_changed: bool,
    pub sg_bracket_before: CantonalBracketInfo,
    pub sg_bracket_after: CantonalBracketInfo,
    pub sg_bracket_changed: bool,
}

/// Federal segment and cantonal bracket before and after a deduction, with
/// change flags. Useful to see whether a deduction crosses a tariff
/// boundary at all.
pub fn compare_brackets(
    config: &TaxConfig,
    canton: Option<&str>,
    filing_status: FilingStatus,
    incomes: Incomes,
    deduction: Money,
) -> TaxGlideResult<BracketComparison> {
    if deduction < Decimal::ZERO {
        return Err(TaxGlideError::InvalidInput {
            field: "deduction".into(),
            reason: "deduction must be non-negative".into(),
        });
    }
    if incomes.sg < Decimal::ZERO || incomes.fed < Decimal::ZERO {
        return Err(TaxGlideError::InvalidInput {
            field: "income".into(),
            reason: "income must be non-negative".into(),
        });
    }

    let (_, canton) = config.canton(canton)?;
    let table = config.federal.for_status(filing_status);
    let adjusted = incomes.deduct(deduction);

    let federal_before = federal_info(incomes.fed, table)?;
    let federal_after = federal_info(adjusted.fed, table)?;
    let sg_before = cantonal_info(incomes.sg, canton)?;
    let sg_after = cantonal_info(adjusted.sg, canton)?;

    Ok(BracketComparison {
        original_sg_income: incomes.sg,
        original_fed_income: incomes.fed,
        adjusted_sg_income: adjusted.sg,
        adjusted_fed_income: adjusted.fed,
        deduction_amount: deduction,
        federal_bracket_changed: federal_before != federal_after,
        federal_bracket_before: federal_before,
        federal_bracket_after: federal_after,
        sg_bracket_changed: sg_before != sg_after,
        sg_bracket_before: sg_before,
        sg_bracket_after: sg_after,
    })
}

fn federal_info(
    income: Money,
    table: &crate::config::FederalTable,
) -> TaxGlideResult<FederalBracketInfo> {
    let seg = segment_at(income, table)?;
    Ok(FederalBracketInfo {
        from: seg.from,
        to: seg.to,
        per100: seg.per100,
        at_income: seg.at_income,
    })
}

fn cantonal_info(income: Money, canton: &Canton) -> TaxGlideResult<CantonalBracketInfo> {
    if let Some(bracket) = bracket_at(income, canton) {
        return Ok(CantonalBracketInfo {
            lower: bracket.lower,
            upper: Some(bracket.upper()),
            rate_percent: bracket.rate_percent,
        });
    }
    match &canton.override_rule {
        // Override region: the whole income is charged flat, modelled as an
        // unbounded pseudo-bracket.
        Some(ov) => Ok(CantonalBracketInfo {
            lower: ov.threshold,
            upper: None,
            rate_percent: ov.flat_percent,
        }),
        None => Err(TaxGlideError::CalculationError(format!(
            "no cantonal bracket covers income {income}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn config() -> TaxConfig {
        TaxConfig::builtin(2025).unwrap()
    }

    #[test]
    fn test_reference_scenario_s7() {
        let config = config();
        let comparison = compare_brackets(
            &config,
            None,
            FilingStatus::Single,
            Incomes {
                sg: dec!(80000),
                fed: dec!(82000),
            },
            dec!(3500),
        )
        .unwrap();

        assert!(comparison.federal_bracket_changed);
        assert!(!comparison.sg_bracket_changed);
        assert_eq!(comparison.federal_bracket_before.from, dec!(82000));
        assert_eq!(comparison.federal_bracket_after.from, dec!(73900));
        assert_eq!(comparison.sg_bracket_before.lower, dec!(76080));
        assert_eq!(comparison.adjusted_fed_income, dec!(78500));
        assert_eq!(comparison.adjusted_sg_income, dec!(76500));
    }

    #[test]
    fn test_no_change_within_segment() {
        let config = config();
        let comparison = compare_brackets(
            &config,
            None,
            FilingStatus::Single,
            Incomes::uniform(dec!(90000)),
            dec!(1000),
        )
        .unwrap();
        assert!(!comparison.federal_bracket_changed);
        assert!(!comparison.sg_bracket_changed);
    }

    #[test]
    fn test_override_region_reported_as_flat_bracket() {
        let config = config();
        let comparison = compare_brackets(
            &config,
            None,
            FilingStatus::Single,
            Incomes::uniform(dec!(260000)),
            dec!(20000),
        )
        .unwrap();
        assert_eq!(comparison.sg_bracket_before.upper, None);
        assert_eq!(comparison.sg_bracket_before.rate_percent, dec!(8.5));
        // 240,000 is back under the threshold, inside the bracket table.
        assert!(comparison.sg_bracket_changed);
        assert_eq!(comparison.sg_bracket_after.lower, dec!(92925));
    }

    #[test]
    fn test_deduction_clamps_at_zero_income() {
        let config = config();
        let comparison = compare_brackets(
            &config,
            None,
            FilingStatus::Single,
            Incomes::uniform(dec!(20000)),
            dec!(30000),
        )
        .unwrap();
        assert_eq!(comparison.adjusted_fed_income, Decimal::ZERO);
        assert_eq!(comparison.federal_bracket_after.from, Decimal::ZERO);
    }

    #[test]
    fn test_negative_deduction_rejected() {
        let config = config();
        let err = compare_brackets(
            &config,
            None,
            FilingStatus::Single,
            Incomes::uniform(dec!(50000)),
            dec!(-100),
        )
        .unwrap_err();
        assert!(matches!(err, TaxGlideError::InvalidInput { .. }));
    }
}
