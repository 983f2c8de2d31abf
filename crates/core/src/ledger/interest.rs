//! Savings yield computation.
//!
//! CRITICAL: Rounding strategy for credited yield:
//! - Convert the nominal annual rate to an effective monthly rate
//! - Round the credited amount to 2 decimal places
//! - Use banker's rounding (round half to even)

use rust_decimal::{Decimal, MathematicalOps, RoundingStrategy};

/// Converts a nominal annual rate to the effective monthly rate.
///
/// monthly = (1 + annual)^(1/12) - 1, computed in exact decimal arithmetic
/// so the result is reproducible bit-for-bit across runs.
#[must_use]
pub fn monthly_rate(annual_rate: Decimal) -> Decimal {
    let one_twelfth = Decimal::ONE / Decimal::from(12);
    (Decimal::ONE + annual_rate).powd(one_twelfth) - Decimal::ONE
}

/// Computes the yield credited on a balance for one month.
///
/// Uses banker's rounding (round half to even) to 2 decimal places.
#[must_use]
pub fn yield_amount(balance: Decimal, annual_rate: Decimal) -> Decimal {
    (balance * monthly_rate(annual_rate))
        .round_dp_with_strategy(2, RoundingStrategy::MidpointNearestEven)
}
