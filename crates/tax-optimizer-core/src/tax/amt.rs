//! Alternative minimum tax.
//!
//! AMTI starts from regular taxable income and adds back the preference
//! items the regular system allows. The exemption shrinks at a fixed rate
//! per dollar of AMTI over the phase-out start, expressed through the
//! shared linear phase-out engine. Tentative minimum tax is a two-tier rate
//! split; AMT owed is whatever that exceeds regular income tax.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::tax::phase_out::phase_out_by_rate;
use crate::types::{ByFilingStatus, FilingStatus, Money, Rate};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AmtParams {
    pub exemption: ByFilingStatus<Money>,
    pub phase_out_start: ByFilingStatus<Money>,
    /// Exemption lost per dollar of AMTI above the phase-out start.
    pub exemption_reduction_rate: Rate,
    /// Tier split for joint and single filers; halved for separate filers.
    pub bracket_threshold: Money,
    pub low_rate: Rate,
    pub high_rate: Rate,
    /// A positive margin at or below this is reported as "close to AMT".
    pub warning_margin: Money,
}

impl AmtParams {
    pub fn tier_threshold(&self, status: FilingStatus) -> Money {
        if status == FilingStatus::MarriedSeparate {
            self.bracket_threshold / Decimal::TWO
        } else {
            self.bracket_threshold
        }
    }
}

/// Figures from the regular computation plus the preference items.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AmtInput {
    pub filing_status: FilingStatus,
    pub taxable_income: Money,
    /// Regular income tax the minimum tax is compared with.
    pub regular_tax: Money,
    /// SALT deduction actually claimed on the regular return (after the cap).
    pub salt_deduction: Money,
    pub iso_spread: Money,
    pub private_activity_bond_interest: Money,
    pub depreciation_adjustment: Money,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AmtResult {
    pub amti: Money,
    pub exemption: Money,
    pub tentative_minimum_tax: Money,
    pub regular_tax: Money,
    pub amt_owed: Money,
    /// Regular tax minus tentative minimum tax. Small and positive means
    /// the return is close to triggering AMT.
    pub amt_margin: Money,
}

impl AmtResult {
    pub fn is_near_trigger(&self, warning_margin: Money) -> bool {
        self.amt_margin > Decimal::ZERO && self.amt_margin <= warning_margin
    }
}

pub fn alternative_minimum_tax(input: &AmtInput, params: &AmtParams) -> AmtResult {
    let status = input.filing_status;

    let amti = input.taxable_income.max(Decimal::ZERO)
        + input.salt_deduction.max(Decimal::ZERO)
        + input.iso_spread.max(Decimal::ZERO)
        + input.private_activity_bond_interest.max(Decimal::ZERO)
        + input.depreciation_adjustment.max(Decimal::ZERO);

    let base_exemption = *params.exemption.get(status);
    let exemption = phase_out_by_rate(
        base_exemption,
        amti,
        *params.phase_out_start.get(status),
        params.exemption_reduction_rate,
    )
    .max(Decimal::ZERO);

    let amt_base = (amti - exemption).max(Decimal::ZERO);
    let tier = params.tier_threshold(status);
    let tentative_minimum_tax = if amt_base <= tier {
        amt_base * params.low_rate
    } else {
        tier * params.low_rate + (amt_base - tier) * params.high_rate
    };

    let regular_tax = input.regular_tax.max(Decimal::ZERO);
    AmtResult {
        amti,
        exemption,
        tentative_minimum_tax,
        regular_tax,
        amt_owed: (tentative_minimum_tax - regular_tax).max(Decimal::ZERO),
        amt_margin: regular_tax - tentative_minimum_tax,
    }
}
