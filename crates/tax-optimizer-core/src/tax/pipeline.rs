//! Full liability computation: taxpayer facts in, [`TaxResult`] out.
//!
//! The stages run once, in order, with no iteration to a fixed point.
//! Modified AGI for the IRA and student-loan phase-outs is taken before
//! those two adjustments; every later phase-out (SALT cap, new-provision
//! deductions, credits, NIIT) reads the final AGI.

use std::time::Instant;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::{ContributionLimits, TaxYearConfig};
use crate::profile::TaxProfile;
use crate::tax::amt::{alternative_minimum_tax, AmtInput, AmtResult};
use crate::tax::brackets::bracket_tax;
use crate::tax::credits::{dependent_credits, DependentCredits};
use crate::tax::niit::net_investment_income_tax;
use crate::tax::phase_out::{phase_out_by_rate, phase_out_fraction};
use crate::tax::qbi::{qbi_deduction, QbiBusiness, QbiResult};
use crate::tax::self_employment::self_employment_tax;
use crate::tax::stacked::stacked_income_tax;
use crate::types::{with_metadata, ComputationOutput, Money, Rate};
use crate::TaxOptimizerResult;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaxResult {
    pub total_income: Money,
    pub adjustments: Money,
    pub agi: Money,
    pub standard_deduction: Money,
    pub itemized_deductions: Money,
    pub itemized: bool,
    pub deduction: Money,
    /// SALT actually deducted (zero when the standard deduction is taken).
    pub salt_deduction: Money,
    pub new_provision_deductions: Money,
    pub taxable_income_before_qbi: Money,
    pub qbi_deduction: Money,
    pub qbi: QbiResult,
    pub taxable_income: Money,
    pub ordinary_taxable_income: Money,
    /// Qualified dividends plus net long-term gain, before the taxable-income cap.
    pub preferential_income: Money,
    pub net_capital_gain: Money,
    pub capital_loss_carryforward: Money,
    pub regular_tax: Money,
    pub capital_gains_tax: Money,
    pub se_tax: Money,
    pub se_deduction: Money,
    pub niit: Money,
    pub amt: AmtResult,
    pub total_tax_before_credits: Money,
    pub dependent_credits: DependentCredits,
    pub total_credits: Money,
    pub final_tax: Money,
    pub total_payments: Money,
    /// Positive is a refund, negative is a balance due.
    pub refund_or_owed: Money,
    pub effective_rate: Rate,
    pub marginal_rate: Rate,
}

/// Pipeline bound to one validated tax year.
#[derive(Debug, Clone)]
pub struct TaxPipeline {
    config: TaxYearConfig,
}

impl TaxPipeline {
    pub fn new(config: TaxYearConfig) -> TaxOptimizerResult<Self> {
        config.validate()?;
        Ok(TaxPipeline { config })
    }

    pub fn tax_year_2025() -> Self {
        TaxPipeline {
            config: TaxYearConfig::tax_year_2025(),
        }
    }

    pub fn config(&self) -> &TaxYearConfig {
        &self.config
    }

    pub fn compute(&self, profile: &TaxProfile) -> TaxResult {
        let cfg = &self.config;
        let status = profile.filing_status;
        let income = &profile.income;

        // Capital gain netting
        let cg = &profile.capital_gains;
        let net_short = cg.short_term_gains - cg.short_term_losses;
        let net_long = cg.long_term_gains - cg.long_term_losses - cg.carryover_loss;
        let net_total = net_short + net_long;
        let loss_limit = *cfg.capital_loss_limit.get(status);
        let (capital_result, capital_loss_carryforward) = if net_total >= Decimal::ZERO {
            (net_total, Decimal::ZERO)
        } else {
            let loss = -net_total;
            (-loss.min(loss_limit), (loss - loss_limit).max(Decimal::ZERO))
        };
        let net_capital_gain = if net_total > Decimal::ZERO {
            net_long.min(net_total).max(Decimal::ZERO)
        } else {
            Decimal::ZERO
        };
        let dividends = income.ordinary_dividends.max(income.qualified_dividends);
        let preferential_income = income.qualified_dividends + net_capital_gain;

        // Self-employment
        let schedule_c = profile.self_employment.net_profit();
        let se_earnings = schedule_c + profile.k1_guaranteed_payments();
        let se = self_employment_tax(se_earnings, &cfg.self_employment);

        // Total income
        let wages = (income.wages - profile.retirement.elective_deferral).max(Decimal::ZERO);
        let total_income = wages
            + income.taxable_interest
            + dividends
            + income.retirement_distributions
            + income.taxable_social_security
            + income.unemployment
            + income.other_income
            + schedule_c
            + profile.k1_total_income()
            + capital_result;

        // Above-the-line adjustments
        let limits = &cfg.contribution_limits;
        let sep = profile
            .retirement
            .sep_contribution
            .min(sep_contribution_limit(schedule_c, se.deduction, limits));
        let se_health = profile
            .adjustments
            .self_employed_health_insurance
            .min(se_earnings.max(Decimal::ZERO));
        let pre_phase_out =
            se.deduction + sep + se_health + profile.adjustments.hsa;
        let magi_for_adjustments = (total_income - pre_phase_out).max(Decimal::ZERO);

        let ira = deductible_ira(profile, magi_for_adjustments, cfg);
        let student_loan = profile
            .adjustments
            .student_loan_interest
            .min(limits.student_loan_interest_cap)
            * phase_out_fraction(
                magi_for_adjustments,
                *limits.student_loan_phase_out_start.get(status),
                *limits.student_loan_phase_out_end.get(status),
            );
        let adjustments = pre_phase_out + ira + student_loan;
        let agi = (total_income - adjustments).max(Decimal::ZERO);
        let magi = agi;

        // Standard vs itemized
        let seniors = profile.filers_at_least(cfg.senior_age);
        let standard_deduction = *cfg.standard_deduction.get(status)
            + *cfg.additional_standard_deduction.get(status) * Decimal::from(seniors);

        let itemized_in = &profile.itemized;
        let salt_cap = salt_cap(magi, cfg, profile);
        let salt_if_itemized = itemized_in.salt_paid().min(salt_cap);
        let charity = itemized_in
            .charitable()
            .min(agi * cfg.itemized.charitable_agi_limit);
        let medical =
            (itemized_in.medical_expenses - agi * cfg.itemized.medical_agi_floor).max(Decimal::ZERO);
        let itemized_deductions =
            salt_if_itemized + itemized_in.mortgage_interest + charity + medical + itemized_in.other;
        let itemized = itemized_in.force_itemize || itemized_deductions > standard_deduction;
        let (deduction, salt_deduction) = if itemized {
            (itemized_deductions, salt_if_itemized)
        } else {
            (standard_deduction, Decimal::ZERO)
        };

        let new_provision_deductions = new_provision_deductions(profile, magi, seniors, cfg);

        // QBI
        let taxable_income_before_qbi =
            (agi - deduction - new_provision_deductions).max(Decimal::ZERO);
        let businesses = qbi_businesses(profile, se.deduction, sep);
        let qbi = qbi_deduction(
            &businesses,
            taxable_income_before_qbi,
            net_capital_gain + income.qualified_dividends,
            status,
            &cfg.qbi,
        );
        let taxable_income = (taxable_income_before_qbi - qbi.deduction).max(Decimal::ZERO);

        // Regular and preferential tax
        let preferential_taxable = preferential_income.min(taxable_income);
        let ordinary_taxable_income = taxable_income - preferential_taxable;
        let ordinary_table = cfg.ordinary_brackets.get(status);
        let regular_tax = bracket_tax(ordinary_taxable_income, ordinary_table);
        let capital_gains_tax = stacked_income_tax(
            ordinary_taxable_income,
            preferential_taxable,
            cfg.preferential_brackets.get(status),
        );

        let net_investment_income = income.taxable_interest
            + dividends
            + capital_result.max(Decimal::ZERO)
            + profile.passive_k1_income();
        let niit = net_investment_income_tax(
            magi,
            net_investment_income,
            *cfg.niit.threshold.get(status),
            cfg.niit.rate,
        );

        let amt = alternative_minimum_tax(
            &AmtInput {
                filing_status: status,
                taxable_income,
                regular_tax: regular_tax + capital_gains_tax,
                salt_deduction,
                iso_spread: profile.amt_items.iso_spread,
                private_activity_bond_interest: profile.amt_items.private_activity_bond_interest,
                depreciation_adjustment: profile.amt_items.depreciation_adjustment,
            },
            &cfg.amt,
        );

        let total_tax_before_credits =
            regular_tax + capital_gains_tax + se.tax + niit + amt.amt_owed;

        // Nonrefundable credits, limited to income tax
        let dependent_credits =
            dependent_credits(&profile.dependent_ages(), magi, status, &cfg.dependent_credits);
        let income_tax = regular_tax + capital_gains_tax + amt.amt_owed;
        let total_credits = (dependent_credits.allowed + profile.other_credits).min(income_tax);

        let final_tax = (total_tax_before_credits - total_credits).max(Decimal::ZERO);
        let total_payments =
            profile.payments.federal_withholding + profile.payments.estimated_payments;
        let effective_rate = if total_income > Decimal::ZERO {
            final_tax / total_income
        } else {
            Decimal::ZERO
        };

        debug!(
            status = status.as_str(),
            agi = %agi,
            taxable_income = %taxable_income,
            final_tax = %final_tax,
            "tax pipeline computed"
        );

        TaxResult {
            total_income,
            adjustments,
            agi,
            standard_deduction,
            itemized_deductions,
            itemized,
            deduction,
            salt_deduction,
            new_provision_deductions,
            taxable_income_before_qbi,
            qbi_deduction: qbi.deduction,
            qbi,
            taxable_income,
            ordinary_taxable_income,
            preferential_income,
            net_capital_gain,
            capital_loss_carryforward,
            regular_tax,
            capital_gains_tax,
            se_tax: se.tax,
            se_deduction: se.deduction,
            niit,
            amt,
            total_tax_before_credits,
            dependent_credits,
            total_credits,
            final_tax,
            total_payments,
            refund_or_owed: total_payments - final_tax,
            effective_rate,
            marginal_rate: ordinary_table.marginal_rate(ordinary_taxable_income),
        }
    }
}

/// Maximum SEP contribution for a sole proprietor: the plan rate applied
/// to net profit after the deductible half of SE tax, capped.
pub fn sep_contribution_limit(
    net_profit: Money,
    se_deduction: Money,
    limits: &ContributionLimits,
) -> Money {
    ((net_profit - se_deduction).max(Decimal::ZERO) * limits.sep_rate).min(limits.sep_cap)
}

/// IRA contribution limit including the catch-up for `age`.
pub fn ira_limit(age: u32, limits: &ContributionLimits) -> Money {
    if age >= limits.catch_up_age {
        limits.ira + limits.ira_catch_up
    } else {
        limits.ira
    }
}

/// Elective deferral limit including the catch-up for `age`.
pub fn elective_deferral_limit(age: u32, limits: &ContributionLimits) -> Money {
    if age >= limits.catch_up_age {
        limits.elective_deferral + limits.elective_catch_up
    } else {
        limits.elective_deferral
    }
}

/// Share of a traditional IRA contribution that is deductible at `magi`.
pub fn ira_deductible_fraction(profile: &TaxProfile, magi: Money, cfg: &TaxYearConfig) -> Rate {
    if !profile.retirement.covered_by_workplace_plan {
        return Decimal::ONE;
    }
    let limits = &cfg.contribution_limits;
    phase_out_fraction(
        magi,
        *limits.ira_phase_out_start.get(profile.filing_status),
        *limits.ira_phase_out_end.get(profile.filing_status),
    )
}

fn deductible_ira(profile: &TaxProfile, magi: Money, cfg: &TaxYearConfig) -> Money {
    let limit = ira_limit(profile.taxpayer_age, &cfg.contribution_limits);
    profile.adjustments.traditional_ira.min(limit) * ira_deductible_fraction(profile, magi, cfg)
}

fn salt_cap(magi: Money, cfg: &TaxYearConfig, profile: &TaxProfile) -> Money {
    let status = profile.filing_status;
    let cap = *cfg.salt.cap.get(status);
    let floor = *cfg.salt.floor.get(status);
    floor
        + phase_out_by_rate(
            cap - floor,
            magi,
            *cfg.salt.phase_down_start.get(status),
            cfg.salt.phase_down_rate,
        )
}

fn new_provision_deductions(
    profile: &TaxProfile,
    magi: Money,
    seniors: u32,
    cfg: &TaxYearConfig,
) -> Money {
    let status = profile.filing_status;
    let np = &cfg.new_provisions;

    let senior = phase_out_by_rate(
        *np.senior.cap.get(status) * Decimal::from(seniors),
        magi,
        *np.senior.phase_out_start.get(status),
        np.senior.phase_out_rate,
    );
    // Tips and overtime: the cap phases out, not the amount earned.
    let tips = profile.income.qualified_tips.min(phase_out_by_rate(
        *np.tips.cap.get(status),
        magi,
        *np.tips.phase_out_start.get(status),
        np.tips.phase_out_rate,
    ));
    let overtime = profile.income.qualified_overtime.min(phase_out_by_rate(
        *np.overtime.cap.get(status),
        magi,
        *np.overtime.phase_out_start.get(status),
        np.overtime.phase_out_rate,
    ));
    senior + tips + overtime
}

/// Qualified businesses on the return. Schedule C QBI is net profit less
/// its share of the SE-tax deduction and the SEP contribution; K-1 QBI
/// excludes guaranteed payments.
pub fn qbi_businesses(profile: &TaxProfile, se_deduction: Money, sep: Money) -> Vec<QbiBusiness> {
    let mut businesses = Vec::with_capacity(profile.k1.len() + 1);

    let schedule_c = profile.self_employment.net_profit();
    if !schedule_c.is_zero() {
        let se_earnings = schedule_c + profile.k1_guaranteed_payments();
        let se_share = if se_earnings > Decimal::ZERO && schedule_c > Decimal::ZERO {
            se_deduction * schedule_c / se_earnings
        } else {
            Decimal::ZERO
        };
        businesses.push(QbiBusiness {
            name: "Schedule C".into(),
            qbi: schedule_c - se_share - sep,
            w2_wages: profile.self_employment.w2_wages,
            ubia: profile.self_employment.ubia,
            is_sstb: profile.self_employment.is_sstb,
        });
    }

    for k1 in &profile.k1 {
        businesses.push(QbiBusiness {
            name: k1.entity_name.clone(),
            qbi: k1.ordinary_income + k1.rental_income,
            w2_wages: k1.w2_wages,
            ubia: k1.ubia,
            is_sstb: k1.is_sstb,
        });
    }

    businesses
}

/// Warning for a profile labelled with a different year than the parameters.
pub fn tax_year_mismatch(profile_year: u16, config_year: u16) -> String {
    format!(
        "Profile is for tax year {profile_year} but was computed with {config_year} parameters."
    )
}

/// Compute one return and wrap it with methodology and warnings.
pub fn calculate_tax(
    profile: &TaxProfile,
    config: &TaxYearConfig,
) -> TaxOptimizerResult<ComputationOutput<TaxResult>> {
    let start = Instant::now();
    let pipeline = TaxPipeline::new(config.clone())?;
    let result = pipeline.compute(profile);
    let mut warnings: Vec<String> = Vec::new();

    if profile.income.qualified_dividends > profile.income.ordinary_dividends {
        warnings.push(format!(
            "Qualified dividends ({}) exceed ordinary dividends ({}); qualified amount used as the dividend total.",
            profile.income.qualified_dividends, profile.income.ordinary_dividends
        ));
    }
    if result.capital_loss_carryforward > Decimal::ZERO {
        warnings.push(format!(
            "Net capital loss exceeds the annual limit; {} carries forward.",
            result.capital_loss_carryforward
        ));
    }
    if result.amt.amt_owed > Decimal::ZERO {
        warnings.push(format!(
            "Alternative minimum tax of {} applies.",
            result.amt.amt_owed
        ));
    } else if result.amt.is_near_trigger(config.amt.warning_margin) {
        warnings.push(format!(
            "Regular tax exceeds tentative minimum tax by only {}; additional preference items may trigger AMT.",
            result.amt.amt_margin
        ));
    }
    if profile.retirement.elective_deferral > profile.income.wages {
        warnings.push("Elective deferral exceeds wages; wages floored at zero.".into());
    }
    if let Some(year) = profile.tax_year {
        if year != config.tax_year {
            warnings.push(tax_year_mismatch(year, config.tax_year));
        }
    }

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Single-pass liability: progressive brackets on ordinary income, stacked \
         preferential rates, SE tax, NIIT and AMT, less nonrefundable credits",
        &serde_json::json!({
            "tax_year": config.tax_year,
            "filing_status": profile.filing_status.as_str(),
            "itemized": result.itemized,
            "magi_iteration": "single pass",
        }),
        warnings,
        elapsed,
        result,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::{
        Adjustments, AmtPreferenceItems, CapitalGainsDetail, Dependent, IncomeSources,
        ItemizedDeductions, RetirementContributions, SelfEmploymentDetail,
    };
    use crate::types::FilingStatus;
    use rust_decimal_macros::dec;

    fn pipeline() -> TaxPipeline {
        TaxPipeline::tax_year_2025()
    }

    fn wage_earner(wages: Money) -> TaxProfile {
        TaxProfile {
            income: IncomeSources {
                wages,
                ..Default::default()
            },
            ..Default::default()
        }
    }

    #[test]
    fn test_single_60k_wages_standard_deduction() {
        let r = pipeline().compute(&wage_earner(dec!(60_000)));
        assert_eq!(r.agi, dec!(60_000));
        assert_eq!(r.deduction, dec!(15_700));
        assert_eq!(r.taxable_income, dec!(44_300));
        // 1,192.50 + 32,375 * 12%
        assert_eq!(r.regular_tax, dec!(5_077.50));
        assert_eq!(r.capital_gains_tax, dec!(0));
        assert_eq!(r.se_tax, dec!(0));
        assert_eq!(r.niit, dec!(0));
        assert_eq!(r.amt.amt_owed, dec!(0));
        assert_eq!(r.total_credits, dec!(0));
        assert_eq!(r.final_tax, dec!(5_077.50));
        assert_eq!(r.refund_or_owed, dec!(-5_077.50));
    }

    #[test]
    fn test_empty_profile_is_all_zero() {
        let r = pipeline().compute(&TaxProfile::default());
        assert_eq!(r.total_income, dec!(0));
        assert_eq!(r.taxable_income, dec!(0));
        assert_eq!(r.final_tax, dec!(0));
        assert_eq!(r.effective_rate, dec!(0));
    }

    #[test]
    fn test_qualified_dividends_stacked_on_wages() {
        // Wages 55,700 -> ordinary 40,000 after 15,700; QD 20,000 stacked on top
        let mut p = wage_earner(dec!(55_700));
        p.income.ordinary_dividends = dec!(20_000);
        p.income.qualified_dividends = dec!(20_000);
        let r = pipeline().compute(&p);
        assert_eq!(r.taxable_income, dec!(60_000));
        assert_eq!(r.ordinary_taxable_income, dec!(40_000));
        assert_eq!(r.regular_tax, dec!(4_561.50));
        assert_eq!(r.capital_gains_tax, dec!(1_747.50));
        assert_eq!(r.final_tax, dec!(6_309));
    }

    #[test]
    fn test_capital_loss_limited_and_carried_forward() {
        let mut p = wage_earner(dec!(60_000));
        p.capital_gains = CapitalGainsDetail {
            short_term_losses: dec!(10_000),
            ..Default::default()
        };
        let r = pipeline().compute(&p);
        assert_eq!(r.total_income, dec!(57_000));
        assert_eq!(r.capital_loss_carryforward, dec!(7_000));
        assert_eq!(r.net_capital_gain, dec!(0));
    }

    #[test]
    fn test_net_long_term_gain_limited_by_net_total() {
        // ST loss 4,000 offsets LT gain 10,000 -> preferential 6,000
        let mut p = wage_earner(dec!(60_000));
        p.capital_gains = CapitalGainsDetail {
            short_term_losses: dec!(4_000),
            long_term_gains: dec!(10_000),
            ..Default::default()
        };
        let r = pipeline().compute(&p);
        assert_eq!(r.net_capital_gain, dec!(6_000));
        assert_eq!(r.preferential_income, dec!(6_000));
    }

    #[test]
    fn test_self_employment_tax_and_half_deduction() {
        let p = TaxProfile {
            self_employment: SelfEmploymentDetail {
                gross_receipts: dec!(120_000),
                expenses: dec!(20_000),
                ..Default::default()
            },
            ..Default::default()
        };
        let r = pipeline().compute(&p);
        assert_eq!(r.se_tax, dec!(14_129.55));
        assert_eq!(r.se_deduction, dec!(7_064.775));
        assert_eq!(r.agi, dec!(92_935.225));
        // QBI component 20% of 92,935.225 = 18,587.045, capped at
        // 20% of taxable income before QBI (77,235.225)
        assert_eq!(r.qbi.combined_before_cap, dec!(18_587.045));
        assert_eq!(r.qbi_deduction, dec!(15_447.045));
        assert_eq!(r.taxable_income, dec!(61_788.18));
        assert!(r.final_tax > r.se_tax);
    }

    #[test]
    fn test_itemizes_when_larger_and_salt_capped() {
        let mut p = wage_earner(dec!(200_000));
        p.itemized = ItemizedDeductions {
            state_income_tax: dec!(30_000),
            real_estate_tax: dec!(15_000),
            mortgage_interest: dec!(12_000),
            ..Default::default()
        };
        let r = pipeline().compute(&p);
        assert!(r.itemized);
        assert_eq!(r.salt_deduction, dec!(40_000));
        assert_eq!(r.deduction, dec!(52_000));
    }

    #[test]
    fn test_salt_cap_phases_down_to_floor() {
        // MAGI 600,000: cap 40,000 - 30% * 100,000 -> floor 10,000
        let mut p = wage_earner(dec!(600_000));
        p.itemized.state_income_tax = dec!(50_000);
        p.itemized.force_itemize = true;
        let r = pipeline().compute(&p);
        assert_eq!(r.salt_deduction, dec!(10_000));

        // MAGI 550,000: 40,000 - 15,000 = 25,000
        let mut p = wage_earner(dec!(550_000));
        p.itemized.state_income_tax = dec!(50_000);
        let r = pipeline().compute(&p);
        assert_eq!(r.salt_deduction, dec!(25_000));
    }

    #[test]
    fn test_standard_deduction_leaves_salt_out_of_amt() {
        let mut p = wage_earner(dec!(60_000));
        p.itemized.state_income_tax = dec!(3_000);
        let r = pipeline().compute(&p);
        assert!(!r.itemized);
        assert_eq!(r.salt_deduction, dec!(0));
        assert_eq!(r.amt.amti, r.taxable_income);
    }

    #[test]
    fn test_elective_deferral_reduces_wages() {
        let mut p = wage_earner(dec!(60_000));
        p.retirement = RetirementContributions {
            elective_deferral: dec!(10_000),
            ..Default::default()
        };
        let r = pipeline().compute(&p);
        assert_eq!(r.taxable_income, dec!(34_300));
    }

    #[test]
    fn test_ira_deduction_phases_out_for_covered_worker() {
        // MAGI 84,000 is halfway through 79,000..89,000
        let mut p = wage_earner(dec!(84_000));
        p.adjustments = Adjustments {
            traditional_ira: dec!(7_000),
            ..Default::default()
        };
        p.retirement.covered_by_workplace_plan = true;
        let r = pipeline().compute(&p);
        assert_eq!(r.adjustments, dec!(3_500));

        p.retirement.covered_by_workplace_plan = false;
        let r = pipeline().compute(&p);
        assert_eq!(r.adjustments, dec!(7_000));
    }

    #[test]
    fn test_child_credit_limited_to_income_tax() {
        let mut p = wage_earner(dec!(30_000));
        p.filing_status = FilingStatus::Head;
        p.dependents = vec![
            Dependent { name: "A".into(), age: 5 },
            Dependent { name: "B".into(), age: 8 },
        ];
        let r = pipeline().compute(&p);
        // Taxable 6,450 -> tax 645; credits 4,400 limited to 645
        assert_eq!(r.taxable_income, dec!(6_450));
        assert_eq!(r.total_credits, dec!(645));
        assert_eq!(r.final_tax, dec!(0));
    }

    #[test]
    fn test_senior_deduction_and_additional_standard() {
        let mut p = wage_earner(dec!(60_000));
        p.taxpayer_age = 70;
        let r = pipeline().compute(&p);
        assert_eq!(r.standard_deduction, dec!(17_700));
        assert_eq!(r.new_provision_deductions, dec!(6_000));
        assert_eq!(r.taxable_income, dec!(36_300));
    }

    #[test]
    fn test_tips_deduction_cap_phases_out() {
        // MAGI 160,000: cap 25,000 - 1,000 still covers 10,000 of tips
        let mut p = wage_earner(dec!(160_000));
        p.income.qualified_tips = dec!(10_000);
        let r = pipeline().compute(&p);
        assert_eq!(r.new_provision_deductions, dec!(10_000));

        // MAGI 320,000: cap 25,000 - 17,000 = 8,000
        let mut p = wage_earner(dec!(320_000));
        p.income.qualified_tips = dec!(10_000);
        let r = pipeline().compute(&p);
        assert_eq!(r.new_provision_deductions, dec!(8_000));
    }

    #[test]
    fn test_niit_applies_to_investment_income() {
        let mut p = wage_earner(dec!(240_000));
        p.income.taxable_interest = dec!(30_000);
        let r = pipeline().compute(&p);
        // AGI 270,000, excess 70,000 vs NII 30,000
        assert_eq!(r.niit, dec!(1_140));
    }

    #[test]
    fn test_iso_exercise_produces_amt_in_total() {
        let mut p = wage_earner(dec!(150_000));
        p.amt_items = AmtPreferenceItems {
            iso_spread: dec!(300_000),
            ..Default::default()
        };
        let r = pipeline().compute(&p);
        assert!(r.amt.amt_owed > dec!(0));
        assert_eq!(
            r.total_tax_before_credits,
            r.regular_tax + r.capital_gains_tax + r.se_tax + r.niit + r.amt.amt_owed
        );
        assert_eq!(r.final_tax, r.total_tax_before_credits);
    }

    #[test]
    fn test_payments_produce_refund() {
        let mut p = wage_earner(dec!(60_000));
        p.payments.federal_withholding = dec!(6_000);
        let r = pipeline().compute(&p);
        assert_eq!(r.total_payments, dec!(6_000));
        assert_eq!(r.refund_or_owed, dec!(922.50));
    }

    #[test]
    fn test_calculate_tax_envelope_and_warnings() {
        let mut p = wage_earner(dec!(60_000));
        p.capital_gains.long_term_losses = dec!(20_000);
        let out = calculate_tax(&p, &TaxYearConfig::tax_year_2025()).unwrap();
        assert_eq!(out.result.capital_loss_carryforward, dec!(17_000));
        assert!(out.warnings.iter().any(|w| w.contains("carries forward")));
        assert_eq!(out.metadata.precision, "rust_decimal_128bit");
    }

    #[test]
    fn test_iso_spread_near_amt_trigger_warns() {
        // Regular 37,079; AMTI 184,300 + 38,000 - 88,100 = 134,200 at 26% = 34,892
        let mut p = wage_earner(dec!(200_000));
        p.amt_items.iso_spread = dec!(38_000);
        let out = calculate_tax(&p, &TaxYearConfig::tax_year_2025()).unwrap();
        let amt = &out.result.amt;
        assert_eq!(amt.tentative_minimum_tax, dec!(34_892));
        assert_eq!(amt.amt_margin, dec!(2_187));
        assert_eq!(amt.amt_owed, dec!(0));
        assert!(amt.is_near_trigger(dec!(5_000)));
        assert!(out
            .warnings
            .iter()
            .any(|w| w.contains("by only 2187") && w.contains("may trigger AMT")));
    }

    #[test]
    fn test_profile_year_mismatch_warns() {
        let mut p = wage_earner(dec!(60_000));
        p.tax_year = Some(2026);
        let out = calculate_tax(&p, &TaxYearConfig::tax_year_2025()).unwrap();
        assert!(out
            .warnings
            .iter()
            .any(|w| w == "Profile is for tax year 2026 but was computed with 2025 parameters."));

        p.tax_year = Some(2025);
        let out = calculate_tax(&p, &TaxYearConfig::tax_year_2025()).unwrap();
        assert!(out.warnings.iter().all(|w| !w.contains("tax year")));
    }

    #[test]
    fn test_invalid_config_rejected() {
        let mut cfg = TaxYearConfig::tax_year_2025();
        cfg.amt.low_rate = dec!(26);
        assert!(TaxPipeline::new(cfg.clone()).is_err());
        assert!(calculate_tax(&TaxProfile::default(), &cfg).is_err());
    }

    #[test]
    fn test_sep_limit_helper() {
        let limits = TaxYearConfig::tax_year_2025().contribution_limits;
        // (100,000 - 7,064.775) * 20%
        assert_eq!(
            sep_contribution_limit(dec!(100_000), dec!(7_064.775), &limits),
            dec!(18_587.045)
        );
        assert_eq!(sep_contribution_limit(dec!(1_000_000), dec!(0), &limits), dec!(70_000));
        assert_eq!(elective_deferral_limit(55, &limits), dec!(31_000));
        assert_eq!(ira_limit(30, &limits), dec!(7_000));
    }
}
