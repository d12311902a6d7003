//! Qualified business income deduction.
//!
//! One calculator serves both the liability pipeline and the pass-through
//! analyzer so the SSTB phase-out and W-2 wage / UBIA limitation are
//! applied identically everywhere.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::tax::phase_out::phase_out_fraction;
use crate::types::{ByFilingStatus, FilingStatus, Money, Rate};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QbiParams {
    pub rate: Rate,
    /// Taxable income where the limitations begin.
    pub threshold: ByFilingStatus<Money>,
    /// Width of the phase-in range above the threshold.
    pub phase_in_range: ByFilingStatus<Money>,
    pub wage_limit_rate: Rate,
    pub alt_wage_limit_rate: Rate,
    pub ubia_rate: Rate,
}

/// One qualified trade or business.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QbiBusiness {
    pub name: String,
    pub qbi: Money,
    pub w2_wages: Money,
    pub ubia: Money,
    pub is_sstb: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QbiComponent {
    pub name: String,
    pub tentative: Money,
    pub wage_limit: Money,
    pub component: Money,
    pub lost_to_wage_limit: Money,
    pub lost_to_sstb: Money,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QbiResult {
    pub components: Vec<QbiComponent>,
    pub combined_before_cap: Money,
    pub income_cap: Money,
    pub deduction: Money,
    pub lost_to_wage_limit: Money,
    pub lost_to_sstb: Money,
}

/// Deduction for `businesses` given taxable income before the QBI deduction.
pub fn qbi_deduction(
    businesses: &[QbiBusiness],
    taxable_income_before_qbi: Money,
    net_capital_gain: Money,
    status: FilingStatus,
    params: &QbiParams,
) -> QbiResult {
    let threshold = *params.threshold.get(status);
    let range = *params.phase_in_range.get(status);
    let ti = taxable_income_before_qbi.max(Decimal::ZERO);

    // Share of the range already crossed: 0 at threshold, 1 at the top.
    let crossed = Decimal::ONE - phase_out_fraction(ti, threshold, threshold + range);
    // SSTB amounts that survive the applicable-percentage rule.
    let sstb_share = Decimal::ONE - crossed;

    let mut components = Vec::with_capacity(businesses.len());
    for biz in businesses {
        let qbi = biz.qbi;
        if qbi <= Decimal::ZERO {
            components.push(QbiComponent {
                name: biz.name.clone(),
                ..Default::default()
            });
            continue;
        }

        let full = qbi * params.rate;
        let (qbi_used, wages, ubia) = if biz.is_sstb {
            (qbi * sstb_share, biz.w2_wages * sstb_share, biz.ubia * sstb_share)
        } else {
            (qbi, biz.w2_wages, biz.ubia)
        };
        let tentative = qbi_used * params.rate;
        let lost_to_sstb = full - tentative;

        let wage_limit = (wages * params.wage_limit_rate)
            .max(wages * params.alt_wage_limit_rate + ubia * params.ubia_rate);

        let component = if crossed.is_zero() || tentative <= wage_limit {
            tentative
        } else {
            tentative - (tentative - wage_limit) * crossed
        };

        components.push(QbiComponent {
            name: biz.name.clone(),
            tentative,
            wage_limit,
            component,
            lost_to_wage_limit: tentative - component,
            lost_to_sstb,
        });
    }

    let combined_before_cap: Money = components.iter().map(|c| c.component).sum();
    let combined_before_cap = combined_before_cap.max(Decimal::ZERO);
    let income_cap = ((ti - net_capital_gain.max(Decimal::ZERO)).max(Decimal::ZERO)) * params.rate;

    QbiResult {
        lost_to_wage_limit: components.iter().map(|c| c.lost_to_wage_limit).sum(),
        lost_to_sstb: components.iter().map(|c| c.lost_to_sstb).sum(),
        components,
        combined_before_cap,
        income_cap,
        deduction: combined_before_cap.min(income_cap),
    }
}
