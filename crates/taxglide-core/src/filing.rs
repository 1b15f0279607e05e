use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::types::{FilingStatus, Money};
use crate::TaxGlideResult;

/// Apply the filing-status rate rule around a plain `income -> tax`
/// evaluator.
///
/// Joint filing uses the Swiss splitting rule: the effective rate at half
/// the combined income is applied to the whole income. Single filing passes
/// straight through.
pub fn tax_under_status<F>(income: Money, status: FilingStatus, eval: F) -> TaxGlideResult<Money>
where
    F: Fn(Money) -> TaxGlideResult<Money>,
{
    match status {
        FilingStatus::Single => eval(income),
        FilingStatus::MarriedJoint => {
            if income <= Decimal::ZERO {
                return Ok(Decimal::ZERO);
            }
            let half = income / dec!(2);
            let tax_at_half = eval(half)?;
            let effective_rate = tax_at_half / half;
            Ok(effective_rate * income)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cantonal::cantonal_simple_tax;
    use crate::config::TaxConfig;
    use rust_decimal_macros::dec;

    #[test]
    fn test_single_is_identity() {
        let config = TaxConfig::builtin(2025).unwrap();
        let canton = config.cantons.get("sg").unwrap();
        let direct = cantonal_simple_tax(dec!(100000), canton).unwrap();
        let adapted = tax_under_status(dec!(100000), FilingStatus::Single, |i| {
            cantonal_simple_tax(i, canton)
        })
        .unwrap();
        assert_eq!(direct, adapted);
    }

    #[test]
    fn test_joint_matches_manual_splitting() {
        let config = TaxConfig::builtin(2025).unwrap();
        let canton = config.cantons.get("sg").unwrap();
        let income = dec!(100000);
        let half = income / dec!(2);
        let tax_at_half = cantonal_simple_tax(half, canton).unwrap();
        let expected = tax_at_half / half * income;

        let actual = tax_under_status(income, FilingStatus::MarriedJoint, |i| {
            cantonal_simple_tax(i, canton)
        })
        .unwrap();
        assert!((actual - expected).abs() < dec!(1.0));
    }

    #[test]
    fn test_joint_is_cheaper_than_single() {
        let config = TaxConfig::builtin(2025).unwrap();
        let canton = config.cantons.get("sg").unwrap();
        let single = tax_under_status(dec!(94000), FilingStatus::Single, |i| {
            cantonal_simple_tax(i, canton)
        })
        .unwrap();
        let joint = tax_under_status(dec!(94000), FilingStatus::MarriedJoint, |i| {
            cantonal_simple_tax(i, canton)
        })
        .unwrap();
        assert!(joint < single);
    }

    #[test]
    fn test_zero_income_is_zero() {
        let result = tax_under_status(Decimal::ZERO, FilingStatus::MarriedJoint, |_| {
            panic!("evaluator must not run for zero income")
        });
        assert_eq!(result.unwrap(), Decimal::ZERO);
    }
}
