use std::collections::BTreeSet;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Serialize;

use crate::cantonal::cantonal_simple_tax;
use crate::config::{Canton, FederalTable, Municipality, TaxConfig};
use crate::error::TaxGlideError;
use crate::federal::{self, federal_tax};
use crate::filing::tax_under_status;
use crate::multipliers::{apply_multipliers, validate_codes};
use crate::rounding::floor_to_nickel;
use crate::types::{FilingStatus, Incomes, Money, Rate};
use crate::TaxGlideResult;

/// Resolved evaluation context: immutable borrows of the configuration plus
/// the validated multiplier selection. One kernel serves any number of
/// income evaluations within a request.
#[derive(Debug)]
pub struct TaxKernel<'a> {
    canton_key: &'a str,
    municipality_key: &'a str,
    canton: &'a Canton,
    municipality: &'a Municipality,
    federal_table: &'a FederalTable,
    filing_status: FilingStatus,
    picks: BTreeSet<String>,
    skips: BTreeSet<String>,
}

/// Component totals at one income pair.
#[derive(Debug, Clone)]
pub struct TaxTotals {
    pub federal: Money,
    pub sg_simple: Money,
    pub sg_after_multipliers: Money,
    pub total: Money,
    pub applied: Vec<String>,
    pub total_rate: Rate,
    pub warnings: Vec<String>,
}

/// Full breakdown: totals plus derived rates.
#[derive(Debug, Clone, Serialize)]
pub struct TaxBreakdown {
    pub federal: Money,
    pub sg_simple: Money,
    pub sg_after_multipliers: Money,
    pub total: Money,
    pub avg_rate: Rate,
    pub marginal_total: Rate,
    pub marginal_federal_per100: Rate,
    pub picks_applied: Vec<String>,
    pub warnings: Vec<String>,
}

impl<'a> TaxKernel<'a> {
    pub fn new(
        config: &'a TaxConfig,
        canton: Option<&str>,
        municipality: Option<&str>,
        filing_status: FilingStatus,
        picks: &[String],
        skips: &[String],
    ) -> TaxGlideResult<Self> {
        let (canton_key, canton) = config.canton(canton)?;
        let (municipality_key, municipality) = config.municipality(canton, municipality)?;

        let picks: BTreeSet<String> = picks.iter().cloned().collect();
        let skips: BTreeSet<String> = skips.iter().cloned().collect();
        validate_codes(municipality, &picks, &skips)?;

        Ok(Self {
            canton_key,
            municipality_key,
            canton,
            municipality,
            federal_table: config.federal.for_status(filing_status),
            filing_status,
            picks,
            skips,
        })
    }

    pub fn canton_key(&self) -> &str {
        self.canton_key
    }

    pub fn canton(&self) -> &Canton {
        self.canton
    }

    pub fn municipality_key(&self) -> &str {
        self.municipality_key
    }

    pub fn municipality(&self) -> &Municipality {
        self.municipality
    }

    pub fn filing_status(&self) -> FilingStatus {
        self.filing_status
    }

    pub fn federal_table(&self) -> &FederalTable {
        self.federal_table
    }

    /// Federal component alone, with the filing-status rule and the final
    /// ESTV rounding applied.
    pub fn federal_component(&self, income_fed: Money) -> TaxGlideResult<Money> {
        let tax = tax_under_status(income_fed, self.filing_status, |i| {
            federal_tax(i, self.federal_table)
        })?;
        Ok(floor_to_nickel(tax))
    }

    /// Component totals at one income pair.
    pub fn totals(&self, incomes: Incomes) -> TaxGlideResult<TaxTotals> {
        let federal = self.federal_component(incomes.fed)?;

        let sg_simple = tax_under_status(incomes.sg, self.filing_status, |i| {
            cantonal_simple_tax(i, self.canton)
        })?;
        let sg_simple = self.canton.rounding.round_tax(sg_simple);

        let outcome = apply_multipliers(sg_simple, self.municipality, &self.picks, &self.skips);
        let total = federal + outcome.after_tax;

        Ok(TaxTotals {
            federal,
            sg_simple,
            sg_after_multipliers: outcome.after_tax,
            total,
            applied: outcome.applied,
            total_rate: outcome.total_rate,
            warnings: outcome.warnings,
        })
    }

    /// Full breakdown with average and marginal rates.
    ///
    /// The combined marginal is a finite difference over +100 CHF on both
    /// incomes; the federal marginal is read from the segment covering the
    /// stepped federal income.
    pub fn breakdown(&self, incomes: Incomes) -> TaxGlideResult<TaxBreakdown> {
        if incomes.sg < Decimal::ZERO || incomes.fed < Decimal::ZERO {
            return Err(TaxGlideError::InvalidInput {
                field: "income".into(),
                reason: "income must be non-negative".into(),
            });
        }

        let at = self.totals(incomes)?;
        let bump = Incomes {
            sg: incomes.sg + dec!(100),
            fed: incomes.fed + dec!(100),
        };
        let above = self.totals(bump)?;

        let reference = incomes.reference();
        let avg_rate = if reference > Decimal::ZERO {
            at.total / reference
        } else {
            Decimal::ZERO
        };
        let marginal_total = (above.total - at.total) / dec!(100);
        let marginal_federal_per100 =
            federal::marginal_rate(incomes.fed, self.federal_table)?;

        Ok(TaxBreakdown {
            federal: at.federal,
            sg_simple: at.sg_simple,
            sg_after_multipliers: at.sg_after_multipliers,
            total: at.total,
            avg_rate,
            marginal_total,
            marginal_federal_per100,
            picks_applied: at.applied,
            warnings: at.warnings,
        })
    }
}
