//! Taxpayer facts for one tax year.
//!
//! A [`TaxProfile`] is built once per request and never mutated by the
//! pipeline. Every section defaults to zero/false, and deserialization is
//! lenient (see [`coerce`]), so a sparse or partly malformed document still
//! produces a usable profile.

pub mod coerce;
pub mod patch;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::{FilingStatus, Money};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct IncomeSources {
    #[serde(deserialize_with = "coerce::money")]
    pub wages: Money,
    #[serde(deserialize_with = "coerce::money")]
    pub taxable_interest: Money,
    #[serde(deserialize_with = "coerce::money")]
    pub tax_exempt_interest: Money,
    /// Total ordinary dividends, qualified dividends included.
    #[serde(deserialize_with = "coerce::money")]
    pub ordinary_dividends: Money,
    #[serde(deserialize_with = "coerce::money")]
    pub qualified_dividends: Money,
    #[serde(deserialize_with = "coerce::money")]
    pub retirement_distributions: Money,
    #[serde(deserialize_with = "coerce::money")]
    pub taxable_social_security: Money,
    #[serde(deserialize_with = "coerce::money")]
    pub unemployment: Money,
    #[serde(deserialize_with = "coerce::money")]
    pub other_income: Money,
    /// Tips already included in wages that qualify for the tips deduction.
    #[serde(deserialize_with = "coerce::money")]
    pub qualified_tips: Money,
    /// Overtime premium already included in wages.
    #[serde(deserialize_with = "coerce::money")]
    pub qualified_overtime: Money,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Dependent {
    pub name: String,
    #[serde(deserialize_with = "coerce::count")]
    pub age: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Adjustments {
    #[serde(deserialize_with = "coerce::money")]
    pub traditional_ira: Money,
    #[serde(deserialize_with = "coerce::money")]
    pub hsa: Money,
    #[serde(deserialize_with = "coerce::money")]
    pub student_loan_interest: Money,
    #[serde(deserialize_with = "coerce::money")]
    pub self_employed_health_insurance: Money,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RetirementContributions {
    /// Pre-tax 401(k)/403(b) deferral, not yet removed from `wages`.
    #[serde(deserialize_with = "coerce::money")]
    pub elective_deferral: Money,
    #[serde(deserialize_with = "coerce::flag")]
    pub covered_by_workplace_plan: bool,
    #[serde(deserialize_with = "coerce::money")]
    pub sep_contribution: Money,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ItemizedDeductions {
    #[serde(deserialize_with = "coerce::money")]
    pub state_income_tax: Money,
    #[serde(deserialize_with = "coerce::money")]
    pub real_estate_tax: Money,
    #[serde(deserialize_with = "coerce::money")]
    pub personal_property_tax: Money,
    #[serde(deserialize_with = "coerce::money")]
    pub mortgage_interest: Money,
    #[serde(deserialize_with = "coerce::money")]
    pub charitable_cash: Money,
    #[serde(deserialize_with = "coerce::money")]
    pub charitable_noncash: Money,
    #[serde(deserialize_with = "coerce::money")]
    pub medical_expenses: Money,
    #[serde(deserialize_with = "coerce::money")]
    pub other: Money,
    #[serde(deserialize_with = "coerce::flag")]
    pub force_itemize: bool,
}

impl ItemizedDeductions {
    pub fn salt_paid(&self) -> Money {
        self.state_income_tax + self.real_estate_tax + self.personal_property_tax
    }

    pub fn charitable(&self) -> Money {
        self.charitable_cash + self.charitable_noncash
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SelfEmploymentDetail {
    #[serde(deserialize_with = "coerce::money")]
    pub gross_receipts: Money,
    #[serde(deserialize_with = "coerce::money")]
    pub expenses: Money,
    #[serde(deserialize_with = "coerce::flag")]
    pub is_sstb: bool,
    #[serde(deserialize_with = "coerce::money")]
    pub w2_wages: Money,
    #[serde(deserialize_with = "coerce::money")]
    pub ubia: Money,
}

impl SelfEmploymentDetail {
    /// Schedule C net; negative when expenses exceed receipts.
    pub fn net_profit(&self) -> Money {
        self.gross_receipts - self.expenses
    }
}

/// One pass-through (partnership or S corporation) interest.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct K1Detail {
    pub entity_name: String,
    #[serde(deserialize_with = "coerce::money")]
    pub ordinary_income: Money,
    #[serde(deserialize_with = "coerce::money")]
    pub rental_income: Money,
    /// Subject to self-employment tax; not QBI.
    #[serde(deserialize_with = "coerce::money")]
    pub guaranteed_payments: Money,
    #[serde(deserialize_with = "coerce::money")]
    pub w2_wages: Money,
    #[serde(deserialize_with = "coerce::money")]
    pub ubia: Money,
    #[serde(deserialize_with = "coerce::flag")]
    pub is_sstb: bool,
    /// Passive income counts toward net investment income.
    #[serde(deserialize_with = "coerce::flag")]
    pub is_passive: bool,
    #[serde(deserialize_with = "coerce::flag")]
    pub ptet_eligible: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CapitalGainsDetail {
    #[serde(deserialize_with = "coerce::money")]
    pub short_term_gains: Money,
    #[serde(deserialize_with = "coerce::money")]
    pub short_term_losses: Money,
    #[serde(deserialize_with = "coerce::money")]
    pub long_term_gains: Money,
    #[serde(deserialize_with = "coerce::money")]
    pub long_term_losses: Money,
    /// Prior-year capital loss carried into this year (applied to long-term).
    #[serde(deserialize_with = "coerce::money")]
    pub carryover_loss: Money,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AmtPreferenceItems {
    /// Bargain element of incentive stock options exercised and held.
    #[serde(deserialize_with = "coerce::money")]
    pub iso_spread: Money,
    #[serde(deserialize_with = "coerce::money")]
    pub private_activity_bond_interest: Money,
    #[serde(deserialize_with = "coerce::money")]
    pub depreciation_adjustment: Money,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Payments {
    #[serde(deserialize_with = "coerce::money")]
    pub federal_withholding: Money,
    #[serde(deserialize_with = "coerce::money")]
    pub estimated_payments: Money,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TaxProfile {
    pub tax_year: Option<u16>,
    pub filing_status: FilingStatus,
    /// Two-letter state code for state-aware analyzers.
    pub state_code: Option<String>,
    #[serde(deserialize_with = "coerce::count")]
    pub taxpayer_age: u32,
    #[serde(deserialize_with = "coerce::count")]
    pub spouse_age: u32,
    pub income: IncomeSources,
    pub dependents: Vec<Dependent>,
    pub adjustments: Adjustments,
    pub retirement: RetirementContributions,
    pub itemized: ItemizedDeductions,
    pub self_employment: SelfEmploymentDetail,
    pub k1: Vec<K1Detail>,
    pub capital_gains: CapitalGainsDetail,
    pub amt_items: AmtPreferenceItems,
    pub payments: Payments,
    /// Other nonrefundable credits claimed.
    #[serde(deserialize_with = "coerce::money")]
    pub other_credits: Money,
}

impl TaxProfile {
    pub fn from_json_str(json: &str) -> crate::TaxOptimizerResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn dependent_ages(&self) -> Vec<u32> {
        self.dependents.iter().map(|d| d.age).collect()
    }

    /// Taxpayers on the return aged `age` or older.
    pub fn filers_at_least(&self, age: u32) -> u32 {
        let mut count = u32::from(self.taxpayer_age >= age);
        if self.filing_status == FilingStatus::Married {
            count += u32::from(self.spouse_age >= age);
        }
        count
    }

    pub fn k1_guaranteed_payments(&self) -> Money {
        self.k1.iter().map(|k| k.guaranteed_payments).sum()
    }

    pub fn k1_total_income(&self) -> Money {
        self.k1
            .iter()
            .map(|k| k.ordinary_income + k.rental_income + k.guaranteed_payments)
            .sum()
    }

    pub fn passive_k1_income(&self) -> Money {
        self.k1
            .iter()
            .filter(|k| k.is_passive)
            .map(|k| k.ordinary_income + k.rental_income)
            .sum::<Money>()
            .max(Decimal::ZERO)
    }
}
