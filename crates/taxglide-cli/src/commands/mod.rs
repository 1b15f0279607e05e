pub mod calc;
pub mod compare;
pub mod optimize;
pub mod scan;
pub mod validate;

use std::path::Path;

use clap::ValueEnum;
use rust_decimal::Decimal;
use serde_json::{json, Value};

use taxglide_core::config::{version_info, TaxConfig};
use taxglide_core::kernel::TaxKernel;
use taxglide_core::{FilingStatus, Incomes, TaxGlideError, TaxGlideResult};

/// CLI-side mirror of the core filing status, fixing the flag value names.
#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum FilingStatusArg {
    #[default]
    #[value(name = "single")]
    Single,
    #[value(name = "married_joint")]
    MarriedJoint,
}

impl From<FilingStatusArg> for FilingStatus {
    fn from(arg: FilingStatusArg) -> Self {
        match arg {
            FilingStatusArg::Single => FilingStatus::Single,
            FilingStatusArg::MarriedJoint => FilingStatus::MarriedJoint,
        }
    }
}

/// `--income` XOR (`--income-sg` AND `--income-fed`).
pub fn resolve_incomes(
    income: Option<i64>,
    income_sg: Option<i64>,
    income_fed: Option<i64>,
) -> TaxGlideResult<Incomes> {
    let incomes = match (income, income_sg, income_fed) {
        (Some(single), None, None) => Incomes::uniform(Decimal::from(single)),
        (None, Some(sg), Some(fed)) => Incomes {
            sg: Decimal::from(sg),
            fed: Decimal::from(fed),
        },
        _ => {
            return Err(TaxGlideError::InvalidInput {
                field: "income".into(),
                reason: "provide either --income or both --income-sg and --income-fed".into(),
            })
        }
    };
    if incomes.sg < Decimal::ZERO || incomes.fed < Decimal::ZERO {
        return Err(TaxGlideError::InvalidInput {
            field: "income".into(),
            reason: "income must be non-negative".into(),
        });
    }
    Ok(incomes)
}

pub fn load_config(config_root: &str, year: i32) -> TaxGlideResult<TaxConfig> {
    TaxConfig::load(Path::new(config_root), year)
}

/// Location context echoed back with calc/optimize results.
pub fn location_context(kernel: &TaxKernel<'_>) -> Value {
    json!({
        "canton_key": kernel.canton_key(),
        "canton_name": kernel.canton().name,
        "municipality_key": kernel.municipality_key(),
        "municipality_name": kernel.municipality().name,
    })
}

/// Merge `extra` key/value pairs into an object produced by serde.
pub fn merge(value: Value, extra: Value) -> Value {
    match (value, extra) {
        (Value::Object(mut base), Value::Object(extra)) => {
            base.extend(extra);
            Value::Object(base)
        }
        (base, _) => base,
    }
}

pub fn version(config_root: &str) -> TaxGlideResult<Value> {
    let info = version_info(Path::new(config_root));
    Ok(serde_json::to_value(info)?)
}
