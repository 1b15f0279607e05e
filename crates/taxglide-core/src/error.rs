use thiserror::Error;

#[derive(Debug, Error)]
pub enum TaxGlideError {
    #[error("Invalid input: {field} — {reason}")]
    InvalidInput { field: String, reason: String },

    #[error("No configuration available for year {year}")]
    ConfigurationMissing { year: i32 },

    #[error("Configuration invalid: {0}")]
    ConfigurationInvalid(String),

    #[error("Calculation error: {0}")]
    CalculationError(String),

    #[error("Schema mismatch: this build supports schema {supported}, configuration declares {found}")]
    SchemaMismatch { supported: String, found: String },
}

impl TaxGlideError {
    /// Exit code contract shared with the CLI surface.
    pub fn exit_code(&self) -> i32 {
        match self {
            TaxGlideError::InvalidInput { .. } => 2,
            TaxGlideError::CalculationError(_) => 3,
            TaxGlideError::ConfigurationMissing { .. } => 4,
            TaxGlideError::ConfigurationInvalid(_) => 5,
            TaxGlideError::SchemaMismatch { .. } => 9,
        }
    }

    /// Stable machine-readable code for structured error output.
    pub fn code(&self) -> &'static str {
        match self {
            TaxGlideError::InvalidInput { .. } => "invalid_input",
            TaxGlideError::ConfigurationMissing { .. } => "configuration_missing",
            TaxGlideError::ConfigurationInvalid(_) => "configuration_invalid",
            TaxGlideError::CalculationError(_) => "calculation_error",
            TaxGlideError::SchemaMismatch { .. } => "schema_mismatch",
        }
    }
}

impl From<serde_json::Error> for TaxGlideError {
    fn from(e: serde_json::Error) -> Self {
        TaxGlideError::ConfigurationInvalid(e.to_string())
    }
}
