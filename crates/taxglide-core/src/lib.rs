pub mod cantonal;
pub mod compare;
pub mod config;
pub mod error;
pub mod federal;
pub mod filing;
pub mod kernel;
pub mod multipliers;
pub mod optimize;
pub mod plateau;
pub mod rounding;
pub mod scan;
pub mod types;

pub use error::TaxGlideError;
pub use types::*;

/// Standard result type for all taxglide operations
pub type TaxGlideResult<T> = Result<T, TaxGlideError>;
