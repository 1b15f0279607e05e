use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Serialize;

use crate::scan::ScanRow;
use crate::types::{Money, Rate};

/// Contiguous deduction range whose ROI stays within `tolerance_bp` basis
/// points of the best observed ROI.
#[derive(Debug, Clone, Serialize)]
pub struct PlateauReport {
    pub min_d: Money,
    pub max_d: Money,
    pub roi_min_percent: Rate,
    pub roi_max_percent: Rate,
    pub tolerance_bp: Rate,
}

/// Detect the near-maximum ROI plateau. Rows must be in strictly increasing
/// deduction order; the zero-deduction row never participates.
///
/// The run is anchored at the rightmost row attaining the maximum ROI and
/// extended in both directions while rows stay at or above
/// `r_max − tolerance_bp / 100`. Returns None when no positive deduction
/// exists.
pub fn detect_plateau(rows: &[ScanRow], tolerance_bp: Rate) -> Option<PlateauReport> {
    let first = rows.iter().position(|r| r.deduction > Decimal::ZERO)?;

    let mut peak = first;
    for i in first..rows.len() {
        if rows[i].roi_percent >= rows[peak].roi_percent {
            peak = i;
        }
    }
    let r_max = rows[peak].roi_percent;
    let threshold = r_max - tolerance_bp / dec!(100);

    let mut hi = peak;
    while hi + 1 < rows.len() && rows[hi + 1].roi_percent >= threshold {
        hi += 1;
    }
    let mut lo = peak;
    while lo > first && rows[lo - 1].roi_percent >= threshold {
        lo -= 1;
    }

    let mut roi_min = rows[lo].roi_percent;
    let mut roi_max = rows[lo].roi_percent;
    for row in &rows[lo..=hi] {
        roi_min = roi_min.min(row.roi_percent);
        roi_max = roi_max.max(row.roi_percent);
    }

    Some(PlateauReport {
        min_d: rows[lo].deduction,
        max_d: rows[hi].deduction,
        roi_min_percent: roi_min,
        roi_max_percent: roi_max,
        tolerance_bp,
    })
}
