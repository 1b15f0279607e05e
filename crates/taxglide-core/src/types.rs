use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// All monetary values. Wraps Decimal to prevent accidental f64 usage.
pub type Money = Decimal;

/// Rates expressed as decimals (0.05 = 5%). Fields carrying percentages
/// (0–100) say so in their name (`_percent`, `per100`, `_bp`).
pub type Rate = Decimal;

/// Filing status selects the federal tariff table and, for joint filing,
/// switches on the income-splitting rate rule.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilingStatus {
    #[default]
    Single,
    MarriedJoint,
}

impl FilingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            FilingStatus::Single => "single",
            FilingStatus::MarriedJoint => "married_joint",
        }
    }
}

/// Taxable incomes for the two jurisdictions. They usually coincide, but
/// cantonal and federal taxable income can differ after deductions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Incomes {
    pub sg: Money,
    pub fed: Money,
}

impl Incomes {
    pub fn uniform(income: Money) -> Self {
        Self {
            sg: income,
            fed: income,
        }
    }

    /// Reference income for average-rate style denominators.
    pub fn reference(&self) -> Money {
        self.sg.max(self.fed)
    }

    /// Both incomes reduced by `deduction`, clamped at zero.
    pub fn deduct(&self, deduction: Money) -> Self {
        Self {
            sg: (self.sg - deduction).max(Decimal::ZERO),
            fed: (self.fed - deduction).max(Decimal::ZERO),
        }
    }
}
