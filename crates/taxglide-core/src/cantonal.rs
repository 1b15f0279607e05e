use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::config::{Canton, CantonalBracket};
use crate::types::Money;
use crate::TaxGlideResult;

/// Cantonal "simple" tax: progressive portion-of-bracket sum, or the flat
/// high-income override when configured and triggered. The threshold is
/// inclusive: `income == threshold` already uses the override.
pub fn cantonal_simple_tax(income: Money, canton: &Canton) -> TaxGlideResult<Money> {
    let income = income.max(Decimal::ZERO);
    let taxable = canton.rounding.round_taxable(income);

    if let Some(ov) = &canton.override_rule {
        if taxable >= ov.threshold {
            let tax = taxable * ov.flat_percent / dec!(100);
            return Ok(canton.rounding.round_tax(tax));
        }
    }

    let mut tax = Decimal::ZERO;
    for bracket in &canton.brackets {
        if bracket.lower >= taxable {
            break;
        }
        let overlap = taxable.min(bracket.upper()) - bracket.lower;
        if overlap > Decimal::ZERO {
            tax += overlap * bracket.rate_percent / dec!(100);
        }
    }
    Ok(canton.rounding.round_tax(tax))
}

/// Bracket covering `income`, after the canton's taxable rounding. Returns
/// None when the override region applies or the table does not reach the
/// income.
pub fn bracket_at(income: Money, canton: &Canton) -> Option<&CantonalBracket> {
    let taxable = canton.rounding.round_taxable(income.max(Decimal::ZERO));
    if let Some(ov) = &canton.override_rule {
        if taxable >= ov.threshold {
            return None;
        }
    }
    canton.brackets.iter().find(|b| b.contains(taxable))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TaxConfig;

    fn sg() -> Canton {
        TaxConfig::builtin(2025)
            .unwrap()
            .cantons
            .get("sg")
            .unwrap()
            .clone()
    }

    #[test]
    fn test_zero_and_free_band() {
        let canton = sg();
        assert_eq!(cantonal_simple_tax(dec!(0), &canton).unwrap(), dec!(0));
        assert_eq!(cantonal_simple_tax(dec!(11600), &canton).unwrap(), dec!(0));
    }

    #[test]
    fn test_known_simple_amounts() {
        let canton = sg();
        assert_eq!(
            cantonal_simple_tax(dec!(32000), &canton).unwrap(),
            dec!(1140.00)
        );
        assert_eq!(
            cantonal_simple_tax(dec!(60000), &canton).unwrap(),
            dec!(3344.00)
        );
        assert_eq!(
            cantonal_simple_tax(dec!(90000), &canton).unwrap(),
            dec!(6101.60)
        );
        assert_eq!(
            cantonal_simple_tax(dec!(120000), &canton).unwrap(),
            dec!(8904.80)
        );
    }

    #[test]
    fn test_partial_bracket_consumption() {
        let canton = sg();
        // 13,600 consumes 2,000 of the 4% band.
        assert_eq!(
            cantonal_simple_tax(dec!(13600), &canton).unwrap(),
            dec!(80.00)
        );
    }

    #[test]
    fn test_override_threshold_is_inclusive() {
        let canton = sg();
        let at_threshold = cantonal_simple_tax(dec!(249500), &canton).unwrap();
        assert_eq!(at_threshold, dec!(249500) * dec!(0.085));
        // Just below the threshold the bracket table still applies and the
        // transition stays monotone.
        let below = cantonal_simple_tax(dec!(249499), &canton).unwrap();
        assert!(below < at_threshold);
    }

    #[test]
    fn test_bracket_at_respects_override() {
        let canton = sg();
        assert!(bracket_at(dec!(300000), &canton).is_none());
        let bracket = bracket_at(dec!(80000), &canton).unwrap();
        assert_eq!(bracket.lower, dec!(76080));
        assert_eq!(bracket.rate_percent, dec!(7.9));
    }

    #[test]
    fn test_monotone_in_income() {
        let canton = sg();
        let mut prev = Decimal::ZERO;
        let mut income = Decimal::ZERO;
        while income <= dec!(300000) {
            let tax = cantonal_simple_tax(income, &canton).unwrap();
            assert!(tax >= prev, "cantonal tax decreased at income {income}");
            prev = tax;
            income += dec!(500);
        }
    }
}
