use clap::Args;
use rust_decimal::Decimal;
use serde_json::{json, Value};

use taxglide_core::kernel::TaxKernel;
use taxglide_core::optimize::{optimize, OptimizeParams};
use taxglide_core::{FilingStatus, TaxGlideError, TaxGlideResult};

use super::{load_config, location_context, merge, resolve_incomes, FilingStatusArg};

/// Arguments for the deduction optimiser
#[derive(Args)]
pub struct OptimizeArgs {
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

    /// Largest deduction to consider (CHF)
    #[arg(long)]
    pub max_deduction: i64,

    /// Deduction grid step (CHF)
    #[arg(long, default_value_t = 100)]
    pub step: i64,

    /// ROI tolerance in basis points; omitted means the income-class policy
    /// plus adaptive retry
    #[arg(long)]
    pub tolerance_bp: Option<Decimal>,

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

pub fn run(args: &OptimizeArgs, config_root: &str) -> TaxGlideResult<Value> {
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

    let params = OptimizeParams {
        max_deduction: Decimal::from(args.max_deduction),
        step: Decimal::from(args.step),
        tolerance_bp: args.tolerance_bp,
    };
    let report = optimize(&kernel, incomes, &params)?;

    let context = merge(
        json!({
            "year": args.year,
            "filing_status": filing_status.as_str(),
        }),
        location_context(&kernel),
    );
    Ok(merge(serde_json::to_value(&report)?, context))
}
