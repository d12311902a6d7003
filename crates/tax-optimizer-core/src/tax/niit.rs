use rust_decimal::Decimal;

use crate::types::{Money, Rate};

/// Net investment income tax: `rate * min(AGI over threshold, NII)`,
/// both operands floored at zero first.
pub fn net_investment_income_tax(
    agi: Money,
    net_investment_income: Money,
    threshold: Money,
    rate: Rate,
) -> Money {
    let excess_agi = (agi - threshold).max(Decimal::ZERO);
    let nii = net_investment_income.max(Decimal::ZERO);
    rate * excess_agi.min(nii)
}
