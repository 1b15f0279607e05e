use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Serialize;

use crate::error::TaxGlideError;
use crate::federal::segment_at;
use crate::kernel::{TaxKernel, TaxTotals};
use crate::plateau::{detect_plateau, PlateauReport};
use crate::scan::{scan, ScanParams, ScanRow};
use crate::types::{Incomes, Money, Rate};
use crate::TaxGlideResult;

const TOLERANCE_LADDER_BP: [Decimal; 4] = [dec!(25), dec!(50), dec!(100), dec!(200)];

/// Utilization share above which the ROI criterion takes over in candidate
/// scoring.
const UTILIZATION_CAP: Decimal = dec!(0.5);

// ---------------------------------------------------------------------------
// Report types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct BaselineTaxes {
    pub total_tax: Money,
    pub federal_tax: Money,
    pub sg_tax: Money,
}

#[derive(Debug, Clone, Serialize)]
pub struct IncomeDetails {
    pub original_sg: Money,
    pub original_fed: Money,
    pub after_deduction_sg: Money,
    pub after_deduction_fed: Money,
}

#[derive(Debug, Clone, Serialize)]
pub struct MultiplierSummary {
    pub applied: Vec<String>,
    pub total_rate: Rate,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub feuer_warning: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct OptimizationSummary {
    pub roi_percent: Rate,
    pub plateau_width_chf: Money,
    pub federal_bracket_changed: bool,
    pub marginal_rate_percent: Rate,
}

#[derive(Debug, Clone, Serialize)]
pub struct UtilizationWarning {
    #[serde(rename = "type")]
    pub kind: String,
    pub utilization_percent: Rate,
    pub roi_percent: Rate,
    pub message: String,
    pub technical_note: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct SweetSpot {
    pub deduction: Money,
    pub new_income: Money,
    pub total_tax_at_spot: Money,
    pub federal_tax_at_spot: Money,
    pub sg_tax_at_spot: Money,
    pub baseline: BaselineTaxes,
    pub tax_saved_absolute: Money,
    pub tax_saved_percent: Rate,
    pub explanation: String,
    pub income_details: IncomeDetails,
    pub multipliers: MultiplierSummary,
    pub optimization_summary: OptimizationSummary,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub utilization_warning: Option<UtilizationWarning>,
}

#[derive(Debug, Clone, Serialize)]
pub struct FederalNudge {
    pub nudge_chf: Money,
    pub estimated_federal_saving: Money,
}

#[derive(Debug, Clone, Serialize)]
pub struct BestRate {
    pub deduction: Money,
    pub new_income: Money,
    pub total: Money,
    pub saved: Money,
    pub savings_rate_percent: Rate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectionReason {
    FirstChoice,
    RoiImprovement,
    UtilizationImprovement,
    BalancedImprovement,
}

#[derive(Debug, Clone, Serialize)]
pub struct AdaptiveRetry {
    pub original_tolerance_bp: Rate,
    pub chosen_tolerance_bp: Rate,
    pub roi_improvement: Rate,
    pub utilization_improvement: Rate,
    pub selection_reason: SelectionReason,
}

#[derive(Debug, Clone, Serialize)]
pub struct ToleranceInfo {
    pub tolerance_used_bp: Rate,
    pub tolerance_percent: Rate,
    pub tolerance_source: String,
    pub explanation: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct OptimizationReport {
    pub base_total: Money,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub best_rate: Option<BestRate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub plateau_near_max_roi: Option<PlateauReport>,
    pub sweet_spot: SweetSpot,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub federal_100_nudge: Option<FederalNudge>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub adaptive_retry_used: Option<AdaptiveRetry>,
    pub multipliers_applied: Vec<String>,
    pub tolerance_info: ToleranceInfo,
}

#[derive(Debug, Clone)]
pub struct OptimizeParams {
    pub max_deduction: Money,
    pub step: Money,
    pub tolerance_bp: Option<Rate>,
}

// ---------------------------------------------------------------------------
// Tolerance policy
// ---------------------------------------------------------------------------

/// Initial ROI tolerance by income size class. Smaller incomes sit on
/// narrower federal segments, so their plateaus are read more strictly.
pub fn auto_tolerance_bp(income: Money) -> Rate {
    if income < dec!(40000) {
        dec!(5)
    } else if income < dec!(80000) {
        dec!(10)
    } else if income < dec!(120000) {
        dec!(25)
    } else {
        dec!(50)
    }
}

fn tolerance_schedule(initial: Rate) -> Vec<Rate> {
    let mut schedule = vec![initial];
    for bp in TOLERANCE_LADDER_BP {
        if bp > initial {
            schedule.push(bp);
        }
    }
    schedule
}

// ---------------------------------------------------------------------------
// Sweet-spot selection
// ---------------------------------------------------------------------------

struct SpotChoice {
    sweet_spot: SweetSpot,
    nudge: Option<FederalNudge>,
    roi_at_spot: Rate,
    utilization: Rate,
}

/// Pick the plateau's right endpoint and annotate it: the largest deduction
/// that still earns near-maximum ROI, conservative under income uncertainty.
fn select_sweet_spot(
    kernel: &TaxKernel<'_>,
    incomes: Incomes,
    rows: &[ScanRow],
    plateau: &PlateauReport,
    baseline: &TaxTotals,
    max_deduction: Money,
) -> TaxGlideResult<SpotChoice> {
    let row = rows
        .iter()
        .find(|r| r.deduction == plateau.max_d)
        .ok_or_else(|| {
            TaxGlideError::CalculationError(format!(
                "plateau endpoint {} missing from scan rows",
                plateau.max_d
            ))
        })?;

    let table = kernel.federal_table();
    let seg_before = segment_at(incomes.fed, table)?;
    let seg_after = segment_at(row.new_income_fed, table)?;
    let federal_bracket_changed = seg_before.from != seg_after.from;

    let nudge = if federal_bracket_changed {
        compute_nudge(kernel, row.new_income_fed, seg_after.from, row.federal)?
    } else {
        None
    };

    let tax_saved_percent = if baseline.total > Decimal::ZERO {
        dec!(100) * row.saved / baseline.total
    } else {
        Decimal::ZERO
    };

    let marginal_rate_percent = row
        .local_marginal_percent
        .or_else(|| rows.last().and_then(|r| r.local_marginal_percent))
        .unwrap_or(Decimal::ZERO);

    let utilization = if max_deduction > Decimal::ZERO {
        row.deduction / max_deduction
    } else {
        Decimal::ZERO
    };

    let utilization_warning = utilization_warning(utilization, row.roi_percent);

    let explanation = format!(
        "Deducting {} CHF lowers the total tax from {} to {} CHF ({} saved, {}% per franc deducted). \
         This is the largest deduction still within {} bp of the best observed ROI.",
        row.deduction,
        baseline.total.round_dp(2),
        row.total_tax.round_dp(2),
        row.saved.round_dp(2),
        row.roi_percent.round_dp(2),
        plateau.tolerance_bp
    );

    let sweet_spot = SweetSpot {
        deduction: row.deduction,
        new_income: row.new_income,
        total_tax_at_spot: row.total_tax,
        federal_tax_at_spot: row.federal,
        sg_tax_at_spot: row.sg_after_multipliers,
        baseline: BaselineTaxes {
            total_tax: baseline.total,
            federal_tax: baseline.federal,
            sg_tax: baseline.sg_after_multipliers,
        },
        tax_saved_absolute: row.saved,
        tax_saved_percent,
        explanation,
        income_details: IncomeDetails {
            original_sg: incomes.sg,
            original_fed: incomes.fed,
            after_deduction_sg: row.new_income_sg,
            after_deduction_fed: row.new_income_fed,
        },
        multipliers: MultiplierSummary {
            applied: baseline.applied.clone(),
            total_rate: baseline.total_rate,
            feuer_warning: baseline
                .warnings
                .iter()
                .find(|w| w.contains("FEUER"))
                .cloned(),
        },
        optimization_summary: OptimizationSummary {
            roi_percent: row.roi_percent,
            plateau_width_chf: plateau.max_d - plateau.min_d,
            federal_bracket_changed,
            marginal_rate_percent,
        },
        utilization_warning,
    };

    Ok(SpotChoice {
        roi_at_spot: row.roi_percent,
        utilization,
        sweet_spot,
        nudge,
    })
}

/// Smallest extra deduction (whole CHF, at most 100) that lands the federal
/// taxable income exactly on the segment's lower boundary, together with the
/// federal tax it saves. Worth surfacing because the 100-step ceiling makes
/// income just above a boundary pay for the full next step.
fn compute_nudge(
    kernel: &TaxKernel<'_>,
    new_fed: Money,
    boundary: Money,
    federal_at_spot: Money,
) -> TaxGlideResult<Option<FederalNudge>> {
    let over = (new_fed - boundary).ceil();
    if over <= Decimal::ZERO || over > dec!(100) {
        return Ok(None);
    }
    let nudged_federal = kernel.federal_component(new_fed - over)?;
    let saving = federal_at_spot - nudged_federal;
    if saving <= Decimal::ZERO {
        return Ok(None);
    }
    Ok(Some(FederalNudge {
        nudge_chf: over,
        estimated_federal_saving: saving,
    }))
}

fn utilization_warning(utilization: Rate, roi_percent: Rate) -> Option<UtilizationWarning> {
    let utilization_percent = (utilization * dec!(100)).round_dp(1);
    if utilization >= dec!(0.9) {
        Some(UtilizationWarning {
            kind: "high_utilization".into(),
            utilization_percent,
            roi_percent,
            message: "The recommendation uses nearly the whole deduction ceiling; a larger \
                      ceiling might allow further savings."
                .into(),
            technical_note: "The ROI plateau reaches the deduction ceiling, so max_d is \
                             truncated at max_deduction."
                .into(),
        })
    } else if utilization > Decimal::ZERO && utilization < dec!(0.05) {
        Some(UtilizationWarning {
            kind: "low_utilization".into(),
            utilization_percent,
            roi_percent,
            message: "Only a small share of the deduction ceiling is worth using; the ROI \
                      drops off quickly beyond the recommendation."
                .into(),
            technical_note: "The near-maximum ROI plateau is narrow relative to \
                             max_deduction."
                .into(),
        })
    } else {
        None
    }
}

// ---------------------------------------------------------------------------
// Orchestrator
// ---------------------------------------------------------------------------

/// Grid-scan the deduction space, detect the ROI plateau under one or more
/// tolerances, and report the conservative sweet spot.
pub fn optimize(
    kernel: &TaxKernel<'_>,
    incomes: Incomes,
    params: &OptimizeParams,
) -> TaxGlideResult<OptimizationReport> {
    if let Some(tol) = params.tolerance_bp {
        if tol < Decimal::ZERO {
            return Err(TaxGlideError::InvalidInput {
                field: "tolerance_bp".into(),
                reason: "tolerance must be non-negative".into(),
            });
        }
    }

    let scan_params = ScanParams {
        max_deduction: params.max_deduction,
        step: params.step,
        include_local_marginal: true,
    };
    let rows = scan(kernel, incomes, &scan_params)?;
    let baseline = kernel.totals(incomes)?;

    let (initial_tolerance, source) = match params.tolerance_bp {
        Some(bp) => (bp, "user"),
        None => (auto_tolerance_bp(incomes.reference()), "auto_income_class"),
    };

    let best_row = match rows
        .iter()
        .filter(|r| r.deduction > Decimal::ZERO)
        .max_by(|a, b| a.roi_percent.cmp(&b.roi_percent))
    {
        Some(row) if row.roi_percent > Decimal::ZERO => row,
        _ => {
            return Ok(no_benefit_report(
                &baseline,
                incomes,
                initial_tolerance,
                source,
            ))
        }
    };

    let schedule = if source == "user" {
        vec![initial_tolerance]
    } else {
        tolerance_schedule(initial_tolerance)
    };

    let mut candidates = Vec::new();
    for tolerance in &schedule {
        let plateau = detect_plateau(&rows, *tolerance).ok_or_else(|| {
            TaxGlideError::CalculationError("plateau detection on empty scan".into())
        })?;
        let choice = select_sweet_spot(
            kernel,
            incomes,
            &rows,
            &plateau,
            &baseline,
            params.max_deduction,
        )?;
        candidates.push((*tolerance, plateau, choice));
    }

    // Lexicographic score: utilization capped at 0.5 first, ROI at the spot
    // second. Ties keep the earlier (tighter) tolerance.
    let mut chosen = 0;
    for i in 1..candidates.len() {
        let score = |c: &(Rate, PlateauReport, SpotChoice)| {
            (c.2.utilization.min(UTILIZATION_CAP), c.2.roi_at_spot)
        };
        if score(&candidates[i]) > score(&candidates[chosen]) {
            chosen = i;
        }
    }

    let adaptive_retry_used = if candidates.len() > 1 {
        let first = &candidates[0];
        let winner = &candidates[chosen];
        let roi_improvement = winner.2.roi_at_spot - first.2.roi_at_spot;
        let utilization_improvement = winner.2.utilization - first.2.utilization;
        let selection_reason = if chosen == 0 {
            SelectionReason::FirstChoice
        } else {
            match (
                roi_improvement > Decimal::ZERO,
                utilization_improvement > Decimal::ZERO,
            ) {
                (true, true) => SelectionReason::BalancedImprovement,
                (true, false) => SelectionReason::RoiImprovement,
                (false, true) => SelectionReason::UtilizationImprovement,
                (false, false) => SelectionReason::FirstChoice,
            }
        };
        log::debug!(
            "adaptive retry: {} candidates, chose {} bp ({:?})",
            candidates.len(),
            winner.0,
            selection_reason
        );
        Some(AdaptiveRetry {
            original_tolerance_bp: first.0,
            chosen_tolerance_bp: winner.0,
            roi_improvement,
            utilization_improvement,
            selection_reason,
        })
    } else {
        None
    };

    let (tolerance_used, plateau, choice) = candidates.swap_remove(chosen);

    let tolerance_info = ToleranceInfo {
        tolerance_used_bp: tolerance_used,
        tolerance_percent: tolerance_used / dec!(100),
        tolerance_source: source.to_string(),
        explanation: format!(
            "Rows within {tolerance_used} bp ({}%) of the maximum ROI count as the plateau.",
            tolerance_used / dec!(100)
        ),
    };

    Ok(OptimizationReport {
        base_total: baseline.total,
        best_rate: Some(BestRate {
            deduction: best_row.deduction,
            new_income: best_row.new_income,
            total: best_row.total_tax,
            saved: best_row.saved,
            savings_rate_percent: best_row.roi_percent,
        }),
        plateau_near_max_roi: Some(plateau),
        sweet_spot: choice.sweet_spot,
        federal_100_nudge: choice.nudge,
        adaptive_retry_used,
        multipliers_applied: baseline.applied,
        tolerance_info,
    })
}

/// Successful result for the "no beneficial deduction" domain outcome.
fn no_benefit_report(
    baseline: &TaxTotals,
    incomes: Incomes,
    tolerance_bp: Rate,
    source: &str,
) -> OptimizationReport {
    let sweet_spot = SweetSpot {
        deduction: Decimal::ZERO,
        new_income: incomes.reference(),
        total_tax_at_spot: baseline.total,
        federal_tax_at_spot: baseline.federal,
        sg_tax_at_spot: baseline.sg_after_multipliers,
        baseline: BaselineTaxes {
            total_tax: baseline.total,
            federal_tax: baseline.federal,
            sg_tax: baseline.sg_after_multipliers,
        },
        tax_saved_absolute: Decimal::ZERO,
        tax_saved_percent: Decimal::ZERO,
        explanation: "No beneficial deduction found: within the given ceiling no deduction \
                      lowers the tax burden."
            .into(),
        income_details: IncomeDetails {
            original_sg: incomes.sg,
            original_fed: incomes.fed,
            after_deduction_sg: incomes.sg,
            after_deduction_fed: incomes.fed,
        },
        multipliers: MultiplierSummary {
            applied: baseline.applied.clone(),
            total_rate: baseline.total_rate,
            feuer_warning: baseline
                .warnings
                .iter()
                .find(|w| w.contains("FEUER"))
                .cloned(),
        },
        optimization_summary: OptimizationSummary {
            roi_percent: Decimal::ZERO,
            plateau_width_chf: Decimal::ZERO,
            federal_bracket_changed: false,
            marginal_rate_percent: Decimal::ZERO,
        },
        utilization_warning: None,
    };

    OptimizationReport {
        base_total: baseline.total,
        best_rate: None,
        plateau_near_max_roi: None,
        sweet_spot,
        federal_100_nudge: None,
        adaptive_retry_used: None,
        multipliers_applied: baseline.applied.clone(),
        tolerance_info: ToleranceInfo {
            tolerance_used_bp: tolerance_bp,
            tolerance_percent: tolerance_bp / dec!(100),
            tolerance_source: source.to_string(),
            explanation: "No plateau exists because no deduction improves the ROI.".into(),
        },
    }
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

    fn params(max: Decimal, tolerance_bp: Option<Decimal>) -> OptimizeParams {
        OptimizeParams {
            max_deduction: max,
            step: dec!(100),
            tolerance_bp,
        }
    }

    #[test]
    fn test_auto_tolerance_classes() {
        assert_eq!(auto_tolerance_bp(dec!(30000)), dec!(5));
        assert_eq!(auto_tolerance_bp(dec!(60000)), dec!(10));
        assert_eq!(auto_tolerance_bp(dec!(85000)), dec!(25));
        assert_eq!(auto_tolerance_bp(dec!(150000)), dec!(50));
    }

    #[test]
    fn test_optimize_85k_scenario() {
        let config = config();
        let k = kernel(&config);
        let report = optimize(&k, Incomes::uniform(dec!(85000)), &params(dec!(10000), None))
            .unwrap();

        let spot = &report.sweet_spot;
        // A whole multiple of the 100 CHF step, within the plateau.
        assert_eq!(spot.deduction % dec!(100), Decimal::ZERO);
        assert!(spot.deduction >= Decimal::ZERO);
        let plateau = report.plateau_near_max_roi.as_ref().unwrap();
        assert!(plateau.max_d >= spot.deduction);
        assert!(plateau.min_d <= spot.deduction);
        assert!(spot.tax_saved_percent > Decimal::ZERO);
        assert!(spot.tax_saved_absolute > Decimal::ZERO);
    }

    #[test]
    fn test_sweet_spot_is_plateau_right_endpoint() {
        let config = config();
        let k = kernel(&config);
        let report = optimize(&k, Incomes::uniform(dec!(85000)), &params(dec!(10000), None))
            .unwrap();
        let plateau = report.plateau_near_max_roi.as_ref().unwrap();
        assert_eq!(report.sweet_spot.deduction, plateau.max_d);
    }

    #[test]
    fn test_bracket_change_invariant() {
        let config = config();
        let k = kernel(&config);
        let report = optimize(&k, Incomes::uniform(dec!(85000)), &params(dec!(10000), None))
            .unwrap();
        let spot = &report.sweet_spot;
        if spot.optimization_summary.federal_bracket_changed {
            let table = k.federal_table();
            let before = segment_at(dec!(85000), table).unwrap();
            let after = segment_at(spot.income_details.after_deduction_fed, table).unwrap();
            assert_ne!(before.from, after.from);
        }
    }

    #[test]
    fn test_roundtrip_calc_reproduces_spot_total() {
        let config = config();
        let k = kernel(&config);
        let report = optimize(&k, Incomes::uniform(dec!(85000)), &params(dec!(10000), None))
            .unwrap();
        let spot = &report.sweet_spot;
        let reproduced = k
            .totals(Incomes::uniform(dec!(85000)).deduct(spot.deduction))
            .unwrap();
        assert_eq!(reproduced.total, spot.total_tax_at_spot);
    }

    #[test]
    fn test_determinism() {
        let config = config();
        let k = kernel(&config);
        let p = params(dec!(10000), None);
        let a = optimize(&k, Incomes::uniform(dec!(85000)), &p).unwrap();
        let b = optimize(&k, Incomes::uniform(dec!(85000)), &p).unwrap();
        assert_eq!(
            serde_json::to_value(&a).unwrap(),
            serde_json::to_value(&b).unwrap()
        );
    }

    #[test]
    fn test_chosen_tolerance_reproduces_outcome() {
        let config = config();
        let k = kernel(&config);
        let auto = optimize(&k, Incomes::uniform(dec!(34567)), &params(dec!(10000), None))
            .unwrap();
        let chosen_bp = auto.tolerance_info.tolerance_used_bp;
        let pinned = optimize(
            &k,
            Incomes::uniform(dec!(34567)),
            &params(dec!(10000), Some(chosen_bp)),
        )
        .unwrap();
        assert_eq!(pinned.sweet_spot.deduction, auto.sweet_spot.deduction);
        assert_eq!(
            pinned.sweet_spot.total_tax_at_spot,
            auto.sweet_spot.total_tax_at_spot
        );
    }

    #[test]
    fn test_adaptive_retry_escalates_for_mid_income() {
        // The regression case: a ~34.5k income with a 10k ceiling used to
        // recommend a few hundred francs. The retry ladder must escalate the
        // tolerance until utilization is meaningful.
        let config = config();
        let k = kernel(&config);
        let report = optimize(&k, Incomes::uniform(dec!(34567)), &params(dec!(10000), None))
            .unwrap();
        let spot = &report.sweet_spot;

        assert!(spot.deduction >= dec!(1000), "deduction {}", spot.deduction);
        let utilization = spot.deduction / dec!(10000);
        assert!(utilization >= dec!(0.10));
        let roi = spot.optimization_summary.roi_percent;
        assert!(roi >= dec!(10) && roi <= dec!(100));

        let retry = report.adaptive_retry_used.as_ref().unwrap();
        assert!(retry.chosen_tolerance_bp > retry.original_tolerance_bp);
        assert_eq!(
            retry.selection_reason,
            SelectionReason::UtilizationImprovement
        );
    }

    #[test]
    fn test_user_tolerance_disables_retry() {
        let config = config();
        let k = kernel(&config);
        let report = optimize(
            &k,
            Incomes::uniform(dec!(34567)),
            &params(dec!(10000), Some(dec!(5))),
        )
        .unwrap();
        assert!(report.adaptive_retry_used.is_none());
        assert_eq!(report.tolerance_info.tolerance_source, "user");
    }

    #[test]
    fn test_zero_income_yields_no_benefit() {
        let config = config();
        let k = kernel(&config);
        let report = optimize(&k, Incomes::uniform(Decimal::ZERO), &params(dec!(5000), None))
            .unwrap();
        assert_eq!(report.sweet_spot.deduction, Decimal::ZERO);
        assert!(report.best_rate.is_none());
        assert!(report.plateau_near_max_roi.is_none());
        assert!(report
            .sweet_spot
            .explanation
            .contains("No beneficial deduction"));
    }

    #[test]
    fn test_income_below_all_thresholds_yields_no_benefit() {
        let config = config();
        let k = kernel(&config);
        let report = optimize(&k, Incomes::uniform(dec!(9000)), &params(dec!(3000), None))
            .unwrap();
        assert_eq!(report.sweet_spot.deduction, Decimal::ZERO);
        assert_eq!(report.base_total, Decimal::ZERO);
    }

    #[test]
    fn test_negative_tolerance_rejected() {
        let config = config();
        let k = kernel(&config);
        let err = optimize(
            &k,
            Incomes::uniform(dec!(85000)),
            &params(dec!(10000), Some(dec!(-1))),
        )
        .unwrap_err();
        assert!(matches!(err, TaxGlideError::InvalidInput { .. }));
    }

    #[test]
    fn test_plateau_containment_property() {
        let config = config();
        let k = kernel(&config);
        for income in [dec!(45000), dec!(85000), dec!(110000)] {
            let report = optimize(&k, Incomes::uniform(income), &params(dec!(12000), None))
                .unwrap();
            let plateau = report.plateau_near_max_roi.as_ref().unwrap();
            let spot = report.sweet_spot.deduction;
            assert!(spot >= plateau.min_d && spot <= plateau.max_d);
            assert!(plateau.roi_min_percent >= plateau.roi_max_percent - plateau.tolerance_bp / dec!(100));
        }
    }

    #[test]
    fn test_high_utilization_warning() {
        let config = config();
        let k = kernel(&config);
        let report = optimize(&k, Incomes::uniform(dec!(85000)), &params(dec!(10000), None))
            .unwrap();
        if report.sweet_spot.deduction == dec!(10000) {
            let warning = report.sweet_spot.utilization_warning.as_ref().unwrap();
            assert_eq!(warning.kind, "high_utilization");
        }
    }
}
