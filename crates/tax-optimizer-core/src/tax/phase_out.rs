//! Generic linear phase-out.
//!
//! A benefit is fully retained at or below `start`, fully lost at or above
//! `end`, and interpolated linearly in between. Statutory phase-outs that are
//! expressed as "reduce the benefit by r per dollar over the threshold" map
//! onto the same primitive with `end = start + benefit / r` (see
//! [`rate_phase_out_end`]).

use rust_decimal::Decimal;

use crate::types::{Money, Rate};

/// Retained fraction of a benefit for `value` between `start` and `end`.
///
/// Returns 1 at or below `start`, 0 at or above `end`. When `start >= end`
/// the range is degenerate and the result is a step at `start`.
pub fn phase_out_fraction(value: Money, start: Money, end: Money) -> Rate {
    if start >= end {
        return if value <= start {
            Decimal::ONE
        } else {
            Decimal::ZERO
        };
    }
    if value <= start {
        return Decimal::ONE;
    }
    if value >= end {
        return Decimal::ZERO;
    }
    let fraction = Decimal::ONE - (value - start) / (end - start);
    fraction.max(Decimal::ZERO).min(Decimal::ONE)
}

/// End threshold at which a `benefit` reduced at `rate` per dollar above
/// `start` reaches zero. A non-positive rate never phases out.
pub fn rate_phase_out_end(start: Money, benefit: Money, rate: Rate) -> Option<Money> {
    if rate <= Decimal::ZERO {
        return None;
    }
    Some(start + benefit.max(Decimal::ZERO) / rate)
}

/// Apply a per-dollar reduction to `benefit`.
///
/// Equal to `benefit * phase_out_fraction(value, start, end)` with `end`
/// from [`rate_phase_out_end`], evaluated as `benefit - excess * rate` so
/// whole-dollar inputs stay exact.
pub fn phase_out_by_rate(benefit: Money, value: Money, start: Money, rate: Rate) -> Money {
    if benefit <= Decimal::ZERO {
        return Decimal::ZERO;
    }
    if rate <= Decimal::ZERO || value <= start {
        return benefit;
    }
    (benefit - (value - start) * rate).max(Decimal::ZERO)
}
