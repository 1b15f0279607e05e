use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;

/// Direction when snapping a value to a step grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoundMode {
    FloorStep,
    NearestStep,
    CeilStep,
}

/// Round `amount` to a multiple of `step`. A step of zero (or less) leaves
/// the amount untouched. Nearest ties round away from zero, matching Swiss
/// commercial practice rather than banker's rounding.
pub fn round_to_step(amount: Decimal, step: Decimal, mode: RoundMode) -> Decimal {
    if step <= Decimal::ZERO {
        return amount;
    }
    let quotient = amount / step;
    let units = match mode {
        RoundMode::FloorStep => quotient.floor(),
        RoundMode::CeilStep => quotient.ceil(),
        RoundMode::NearestStep => {
            quotient.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        }
    };
    units * step
}

/// Official federal rule: taxable income is lifted to the next full 100
/// before the tariff lookup.
pub fn ceil_to_hundred(amount: Decimal) -> Decimal {
    round_to_step(amount, dec!(100), RoundMode::CeilStep)
}

/// ESTV practice: the final federal tax amount is rounded down to the
/// nearest 5 centimes.
pub fn floor_to_nickel(amount: Decimal) -> Decimal {
    round_to_step(amount, dec!(0.05), RoundMode::FloorStep)
}
