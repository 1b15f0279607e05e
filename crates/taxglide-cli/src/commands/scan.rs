use clap::Args;
use rust_decimal::Decimal;
use serde_json::Value;

use taxglide_core::kernel::TaxKernel;
use taxglide_core::scan::{scan, ScanParams};
use taxglide_core::{FilingStatus, TaxGlideError, TaxGlideResult};

use super::{load_config, resolve_incomes, FilingStatusArg};

/// Arguments for the deduction scan
#[derive(Args)]
pub struct ScanArgs {
    /// Tax year, e.g. 2025
    #[arg(long)]
    pub year: i32,

    /// Taxable income (CHF) used for both jurisdictions
    #[arg(long)]
    pub income: Option<i64>,

    /// Cantonal taxable income (CHF); requires --income-fed
    #[arg(long)]
    pub income_sg: Option<i64>,

    /// Federal taxable income (CHF); requires --income-sg
    #[arg(long)]
    pub income_fed: Option<i64>,

    /// Largest deduction to tabulate (CHF)
    #[arg(long)]
    pub max_deduction: i64,

    /// Deduction grid step (CHF)
    #[arg(long, default_value_t = 100)]
    pub d_step: i64,

    /// Include the local marginal rate per row
    #[arg(long, overrides_with = "no_include_local_marginal")]
    pub include_local_marginal: bool,

    /// Leave the local marginal rate out
    #[arg(long, overrides_with = "include_local_marginal")]
    pub no_include_local_marginal: bool,

    /// Render the rows as CSV instead of a table
    #[arg(long)]
    pub csv: bool,

    /// Filing status
    #[arg(long, value_enum, default_value = "single")]
    pub filing_status: FilingStatusArg,

    /// Canton key (defaults from configuration)
    #[arg(long)]
    pub canton: Option<String>,

    /// Municipality key (defaults from configuration)
    #[arg(long)]
    pub municipality: Option<String>,

    /// Multiplier code to switch on (repeatable)
    #[arg(long = "pick")]
    pub picks: Vec<String>,

    /// Multiplier code to switch off (repeatable; wins over --pick)
    #[arg(long = "skip")]
    pub skips: Vec<String>,
}

impl ScanArgs {
    /// Marginal column defaults to on; --no-include-local-marginal wins.
    fn wants_marginal(&self) -> bool {
        !self.no_include_local_marginal
    }
}

pub fn run(args: &ScanArgs, config_root: &str) -> TaxGlideResult<Value> {
    let incomes = resolve_incomes(args.income, args.income_sg, args.income_fed)?;
    if args.max_deduction < 0 {
        return Err(TaxGlideError::InvalidInput {
            field: "max_deduction".into(),
            reason: "deduction ceiling must be non-negative".into(),
        });
    }
    let config = load_config(config_root, args.year)?;
    let filing_status: FilingStatus = args.filing_status.into();

    let kernel = TaxKernel::new(
        &config,
        args.canton.as_deref(),
        args.municipality.as_deref(),
        filing_status,
        &args.picks,
        &args.skips,
    )?;

    let params = ScanParams {
        max_deduction: Decimal::from(args.max_deduction),
        step: Decimal::from(args.d_step),
        include_local_marginal: args.wants_marginal(),
    };
    let rows = scan(&kernel, incomes, &params)?;
    Ok(serde_json::to_value(&rows)?)
}
