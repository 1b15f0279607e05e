use clap::Args;
use rust_decimal::Decimal;
use serde_json::Value;

use taxglide_core::compare::compare_brackets;
use taxglide_core::{FilingStatus, TaxGlideResult};

use super::{load_config, resolve_incomes, FilingStatusArg};

/// Arguments for the bracket comparison
#[derive(Args)]
pub struct CompareBracketsArgs {
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

    /// Deduction to subtract before the second lookup (CHF)
    #[arg(long, default_value_t = 0)]
    pub deduction: i64,

    /// Filing status
    #[arg(long, value_enum, default_value = "single")]
    pub filing_status: FilingStatusArg,

    /// Canton key (defaults from configuration)
    #[arg(long)]
    pub canton: Option<String>,
}

pub fn run(args: &CompareBracketsArgs, config_root: &str) -> TaxGlideResult<Value> {
    let incomes = resolve_incomes(args.income, args.income_sg, args.income_fed)?;
    let config = load_config(config_root, args.year)?;
    let filing_status: FilingStatus = args.filing_status.into();

    let comparison = compare_brackets(
        &config,
        args.canton.as_deref(),
        filing_status,
        incomes,
        Decimal::from(args.deduction),
    )?;
    Ok(serde_json::to_value(&comparison)?)
}
