use chrono::Utc;
use serde_json::{json, Value};

use taxglide_core::config::SCHEMA_VERSION;
use taxglide_core::TaxGlideError;

/// Structured success envelope, the contract GUI integrations consume.
pub fn print_success(value: &Value) {
    let envelope = json!({
        "success": true,
        "schema_version": SCHEMA_VERSION,
        "timestamp": Utc::now(),
        "data": value,
    });
    println!(
        "{}",
        serde_json::to_string_pretty(&envelope).unwrap_or_default()
    );
}

/// Structured error envelope with a stable machine-readable code.
pub fn print_error(error: &TaxGlideError) {
    let envelope = json!({
        "success": false,
        "schema_version": SCHEMA_VERSION,
        "timestamp": Utc::now(),
        "error": {
            "code": error.code(),
            "message": error.to_string(),
        },
    });
    println!(
        "{}",
        serde_json::to_string_pretty(&envelope).unwrap_or_default()
    );
}
