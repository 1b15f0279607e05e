use std::collections::BTreeSet;

use rust_decimal::Decimal;
use serde::Serialize;

use crate::config::Municipality;
use crate::error::TaxGlideError;
use crate::types::{Money, Rate};
use crate::TaxGlideResult;

/// Code of the optional fire-service levy, warned about when left off.
pub const FIRE_SERVICE_CODE: &str = "FEUER";

/// Outcome of applying a municipality's multipliers to a simple tax.
#[derive(Debug, Clone, Serialize)]
pub struct MultiplierOutcome {
    pub after_tax: Money,
    pub applied: Vec<String>,
    pub total_rate: Rate,
    pub warnings: Vec<String>,
}

/// Reject pick/skip codes that the municipality does not define.
pub fn validate_codes(
    municipality: &Municipality,
    picks: &BTreeSet<String>,
    skips: &BTreeSet<String>,
) -> TaxGlideResult<()> {
    for (field, codes) in [("pick", picks), ("skip", skips)] {
        for code in codes {
            if municipality.multiplier(code).is_none() {
                return Err(TaxGlideError::InvalidInput {
                    field: field.into(),
                    reason: format!(
                        "unknown multiplier code '{code}' for municipality {}",
                        municipality.name
                    ),
                });
            }
        }
    }
    Ok(())
}

/// Apply the additive Steuerfuss rule: every selected multiplier applies to
/// the simple tax independently, so the total is `base × Σ rate`.
///
/// An entry is on iff it is default-selected (optional entries default to
/// off) or picked, and not skipped; skips win over picks. No selected entry
/// at all yields zero tax, which is surfaced as a warning.
pub fn apply_multipliers(
    base_tax: Money,
    municipality: &Municipality,
    picks: &BTreeSet<String>,
    skips: &BTreeSet<String>,
) -> MultiplierOutcome {
    let mut applied = Vec::new();
    let mut total_rate = Decimal::ZERO;
    let mut warnings = Vec::new();

    for m in &municipality.multipliers {
        let on_by_default = m.default_selected && !m.optional;
        let on = (on_by_default || picks.contains(&m.code)) && !skips.contains(&m.code);
        if on {
            applied.push(m.code.clone());
            total_rate += m.rate;
        }
    }

    let after_tax = if applied.is_empty() {
        warnings.push(format!(
            "no multipliers selected for {}; cantonal and communal tax is zero",
            municipality.name
        ));
        Decimal::ZERO
    } else {
        base_tax * total_rate
    };

    if let Some(feuer) = municipality.multiplier(FIRE_SERVICE_CODE) {
        if feuer.optional && !applied.iter().any(|c| c == FIRE_SERVICE_CODE) {
            let estimate = (base_tax * feuer.rate).round_dp(2);
            warnings.push(format!(
                "{} ({}) not applied; picking it would add about {estimate} CHF",
                feuer.name, feuer.code
            ));
        }
    }

    MultiplierOutcome {
        after_tax,
        applied,
        total_rate,
        warnings,
    }
}
