use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::{Money, Rate};

/// Payroll-equivalent rates for net self-employment earnings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelfEmploymentParams {
    /// Share of net profit treated as earnings (0.9235).
    pub earnings_factor: Rate,
    /// Social Security wage base ceiling.
    pub wage_base: Money,
    pub social_security_rate: Rate,
    pub medicare_rate: Rate,
    pub additional_medicare_rate: Rate,
    pub additional_medicare_threshold: Money,
    /// Share of SE tax deductible above the line.
    pub deductible_share: Rate,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelfEmploymentTax {
    pub taxable_base: Money,
    pub social_security: Money,
    pub medicare: Money,
    pub additional_medicare: Money,
    pub tax: Money,
    pub deduction: Money,
}

pub fn self_employment_tax(net_profit: Money, params: &SelfEmploymentParams) -> SelfEmploymentTax {
    if net_profit <= Decimal::ZERO {
        return SelfEmploymentTax::default();
    }

    let base = net_profit * params.earnings_factor;
    let social_security = base.min(params.wage_base) * params.social_security_rate;
    let medicare = base * params.medicare_rate;
    let additional_medicare =
        (base - params.additional_medicare_threshold).max(Decimal::ZERO) * params.additional_medicare_rate;
    let tax = social_security + medicare + additional_medicare;

    SelfEmploymentTax {
        taxable_base: base,
        social_security,
        medicare,
        additional_medicare,
        tax,
        deduction: tax * params.deductible_share,
    }
}
