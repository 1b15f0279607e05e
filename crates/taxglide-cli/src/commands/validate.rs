use clap::Args;
use serde_json::{json, Value};

use std::path::Path;

use taxglide_core::config::TaxConfig;
use taxglide_core::TaxGlideResult;

/// Arguments for configuration validation
#[derive(Args)]
pub struct ValidateArgs {
    /// Tax year, e.g. 2025
    #[arg(long)]
    pub year: i32,
}

pub fn run(args: &ValidateArgs, config_root: &str) -> TaxGlideResult<Value> {
    // Parse without the strict gate so structural findings are reported
    // instead of refusing the document outright.
    let config = TaxConfig::load_with(Path::new(config_root), args.year, false)?;
    let issues = config.validate();
    Ok(json!({
        "year": args.year,
        "ok": issues.is_empty(),
        "issues": issues,
    }))
}
