use clap::Args;
use serde_json::{json, Value};

use taxglide_core::kernel::TaxKernel;
use taxglide_core::{FilingStatus, TaxGlideResult};

use super::{load_config, location_context, merge, resolve_incomes, FilingStatusArg};

/// Arguments for the tax breakdown
#[derive(Args)]
pub struct CalcArgs {
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

pub fn run(args: &CalcArgs, config_root: &str) -> TaxGlideResult<Value> {
    let incomes = resolve_incomes(args.income, args.income_sg, args.income_fed)?;
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
    let breakdown = kernel.breakdown(incomes)?;

    let context = merge(
        json!({
            "year": args.year,
            "income_sg": incomes.sg,
            "income_fed": incomes.fed,
            "filing_status": filing_status.as_str(),
        }),
        location_context(&kernel),
    );
    Ok(merge(serde_json::to_value(&breakdown)?, context))
}
