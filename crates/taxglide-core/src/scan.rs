use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Serialize;

use crate::error::TaxGlideError;
use crate::federal::segment_at;
use crate::kernel::TaxKernel;
use crate::types::{Incomes, Money, Rate};
use crate::TaxGlideResult;

/// One row of the deduction scan.
#[derive(Debug, Clone, Serialize)]
pub struct ScanRow {
    pub deduction: Money,
    pub new_income: Money,
    pub new_income_sg: Money,
    pub new_income_fed: Money,
    pub total_tax: Money,
    pub federal: Money,
    pub sg_simple: Money,
    pub sg_after_multipliers: Money,
    pub saved: Money,
    pub roi_percent: Rate,
    pub federal_from: Money,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub federal_to: Option<Money>,
    pub federal_per100: Money,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub local_marginal_percent: Option<Rate>,
}

#[derive(Debug, Clone)]
pub struct ScanParams {
    pub max_deduction: Money,
    pub step: Money,
    pub include_local_marginal: bool,
}

/// Tabulate taxes over `d ∈ {0, step, 2·step, …}` up to the deduction
/// ceiling. Rows are produced in strictly increasing `d`.
///
/// The local marginal is a forward difference over +100 CHF of extra
/// deduction; the last row falls back to a backward difference.
pub fn scan(
    kernel: &TaxKernel<'_>,
    incomes: Incomes,
    params: &ScanParams,
) -> TaxGlideResult<Vec<ScanRow>> {
    if params.step <= Decimal::ZERO {
        return Err(TaxGlideError::InvalidInput {
            field: "step".into(),
            reason: "deduction step must be positive".into(),
        });
    }
    if params.max_deduction < Decimal::ZERO {
        return Err(TaxGlideError::InvalidInput {
            field: "max_deduction".into(),
            reason: "deduction ceiling must be non-negative".into(),
        });
    }
    if incomes.sg < Decimal::ZERO || incomes.fed < Decimal::ZERO {
        return Err(TaxGlideError::InvalidInput {
            field: "income".into(),
            reason: "income must be non-negative".into(),
        });
    }

    let base = kernel.totals(incomes)?;
    let mut rows = Vec::new();
    let mut d = Decimal::ZERO;
    while d <= params.max_deduction {
        let reduced = incomes.deduct(d);
        let at = kernel.totals(reduced)?;
        let saved = base.total - at.total;
        let roi_percent = if d > Decimal::ZERO {
            dec!(100) * saved / d
        } else {
            Decimal::ZERO
        };

        let seg = segment_at(reduced.fed, kernel.federal_table())?;

        let local_marginal_percent = if params.include_local_marginal {
            let is_last = d + params.step > params.max_deduction;
            let total_here = at.total;
            if !is_last || d < dec!(100) {
                let deeper = kernel.totals(incomes.deduct(d + dec!(100)))?;
                Some((total_here - deeper.total) / dec!(100) * dec!(100))
            } else {
                let shallower = kernel.totals(incomes.deduct(d - dec!(100)))?;
                Some((shallower.total - total_here) / dec!(100) * dec!(100))
            }
        } else {
            None
        };

        rows.push(ScanRow {
            deduction: d,
            new_income: reduced.reference(),
            new_income_sg: reduced.sg,
            new_income_fed: reduced.fed,
            total_tax: at.total,
            federal: at.federal,
            sg_simple: at.sg_simple,
            sg_after_multipliers: at.sg_after_multipliers,
            saved,
            roi_percent,
            federal_from: seg.from,
            federal_to: seg.to,
            federal_per100: seg.per100,
            local_marginal_percent,
        });

        d += params.step;
    }

    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TaxConfig;
    use crate::types::FilingStatus;

    fn config() -> TaxConfig {
        TaxConfig::builtin(2025).unwrap()
    }

    fn kernel(config: &TaxConfig) -> TaxKernel<'_> {
        TaxKernel::new(config, None, None, FilingStatus::Single, &[], &[]).unwrap()
    }

    fn params(max: Decimal) -> ScanParams {
        ScanParams {
            max_deduction: max,
            step: dec!(100),
            include_local_marginal: true,
        }
    }

    #[test]
    fn test_rows_strictly_increasing_and_complete() {
        let config = config();
        let k = kernel(&config);
        let rows = scan(&k, Incomes::uniform(dec!(85000)), &params(dec!(5000))).unwrap();
        assert_eq!(rows.len(), 51);
        for pair in rows.windows(2) {
            assert!(pair[0].deduction < pair[1].deduction);
        }
        assert_eq!(rows[0].deduction, Decimal::ZERO);
        assert_eq!(rows.last().unwrap().deduction, dec!(5000));
    }

    #[test]
    fn test_first_row_is_baseline() {
        let config = config();
        let k = kernel(&config);
        let rows = scan(&k, Incomes::uniform(dec!(85000)), &params(dec!(2000))).unwrap();
        assert_eq!(rows[0].saved, Decimal::ZERO);
        assert_eq!(rows[0].roi_percent, Decimal::ZERO);
        assert_eq!(rows[0].new_income, dec!(85000));
    }

    #[test]
    fn test_savings_monotone_in_deduction() {
        let config = config();
        let k = kernel(&config);
        let rows = scan(&k, Incomes::uniform(dec!(85000)), &params(dec!(10000))).unwrap();
        for pair in rows.windows(2) {
            assert!(pair[1].saved >= pair[0].saved);
            assert!(pair[1].total_tax <= pair[0].total_tax);
        }
    }

    #[test]
    fn test_deduction_beyond_income_clamps_to_zero() {
        let config = config();
        let k = kernel(&config);
        let rows = scan(&k, Incomes::uniform(dec!(16000)), &params(dec!(20000))).unwrap();
        let last = rows.last().unwrap();
        assert_eq!(last.new_income, Decimal::ZERO);
        assert_eq!(last.total_tax, Decimal::ZERO);
        // ROI is still computed against the baseline, which stays positive.
        assert!(rows[0].total_tax > Decimal::ZERO);
        assert_eq!(last.saved, rows[0].total_tax);
    }

    #[test]
    fn test_federal_segment_annotation_tracks_new_income() {
        let config = config();
        let k = kernel(&config);
        let rows = scan(&k, Incomes::uniform(dec!(85000)), &params(dec!(10000))).unwrap();
        // At d = 0 the income sits in the 82,000 segment, at d = 10,000 in
        // the 73,900 segment.
        assert_eq!(rows[0].federal_from, dec!(82000));
        assert_eq!(rows.last().unwrap().federal_from, dec!(73900));
    }

    #[test]
    fn test_local_marginal_positive_and_bounded() {
        let config = config();
        let k = kernel(&config);
        let rows = scan(&k, Incomes::uniform(dec!(85000)), &params(dec!(10000))).unwrap();
        for row in &rows {
            let lm = row.local_marginal_percent.unwrap();
            assert!(lm > Decimal::ZERO, "marginal not positive at {}", row.deduction);
            assert!(lm < dec!(50));
        }
    }

    #[test]
    fn test_marginal_omitted_when_disabled() {
        let config = config();
        let k = kernel(&config);
        let p = ScanParams {
            max_deduction: dec!(1000),
            step: dec!(100),
            include_local_marginal: false,
        };
        let rows = scan(&k, Incomes::uniform(dec!(85000)), &p).unwrap();
        assert!(rows.iter().all(|r| r.local_marginal_percent.is_none()));
    }

    #[test]
    fn test_step_validation() {
        let config = config();
        let k = kernel(&config);
        let p = ScanParams {
            max_deduction: dec!(1000),
            step: Decimal::ZERO,
            include_local_marginal: false,
        };
        let err = scan(&k, Incomes::uniform(dec!(85000)), &p).unwrap_err();
        assert!(matches!(err, TaxGlideError::InvalidInput { .. }));
    }
}
