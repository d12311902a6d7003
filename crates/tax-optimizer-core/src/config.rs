//! Year-scoped tax parameters.
//!
//! Every bracket, threshold, limit and rate the pipeline or an analyzer
//! reads lives in one immutable [`TaxYearConfig`]. Several years can be
//! loaded side by side; nothing in the computation is compiled in except
//! the illustrative [`TaxYearConfig::tax_year_2025`] preset.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::error::TaxOptimizerError;
use crate::tax::amt::AmtParams;
use crate::tax::brackets::BracketTable;
use crate::tax::credits::DependentCreditParams;
use crate::tax::qbi::QbiParams;
use crate::tax::self_employment::SelfEmploymentParams;
use crate::types::{ByFilingStatus, Money, Rate};
use crate::TaxOptimizerResult;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NiitParams {
    pub rate: Rate,
    pub threshold: ByFilingStatus<Money>,
}

/// State-and-local-tax deduction cap. The cap steps down by `phase_down_rate`
/// per dollar of MAGI over `phase_down_start`, but never below `floor`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaltParams {
    pub cap: ByFilingStatus<Money>,
    pub floor: ByFilingStatus<Money>,
    pub phase_down_start: ByFilingStatus<Money>,
    pub phase_down_rate: Rate,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemizedParams {
    pub charitable_agi_limit: Rate,
    pub medical_agi_floor: Rate,
}

/// A capped below-the-line deduction phased out at a per-dollar rate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProvisionParams {
    pub cap: ByFilingStatus<Money>,
    pub phase_out_start: ByFilingStatus<Money>,
    pub phase_out_rate: Rate,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewProvisionParams {
    /// `cap` is per qualifying taxpayer aged `senior_age` or older.
    pub senior: ProvisionParams,
    pub tips: ProvisionParams,
    pub overtime: ProvisionParams,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContributionLimits {
    pub elective_deferral: Money,
    pub elective_catch_up: Money,
    pub ira: Money,
    pub ira_catch_up: Money,
    pub catch_up_age: u32,
    /// Deductibility range for taxpayers covered by a workplace plan.
    pub ira_phase_out_start: ByFilingStatus<Money>,
    pub ira_phase_out_end: ByFilingStatus<Money>,
    pub sep_rate: Rate,
    pub sep_cap: Money,
    pub student_loan_interest_cap: Money,
    pub student_loan_phase_out_start: ByFilingStatus<Money>,
    pub student_loan_phase_out_end: ByFilingStatus<Money>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaxYearConfig {
    pub tax_year: u16,
    pub ordinary_brackets: ByFilingStatus<BracketTable>,
    pub preferential_brackets: ByFilingStatus<BracketTable>,
    pub standard_deduction: ByFilingStatus<Money>,
    /// Extra standard deduction per taxpayer aged `senior_age` or older.
    pub additional_standard_deduction: ByFilingStatus<Money>,
    pub senior_age: u32,
    pub capital_loss_limit: ByFilingStatus<Money>,
    pub self_employment: SelfEmploymentParams,
    pub niit: NiitParams,
    pub amt: AmtParams,
    pub salt: SaltParams,
    pub itemized: ItemizedParams,
    pub qbi: QbiParams,
    pub dependent_credits: DependentCreditParams,
    pub new_provisions: NewProvisionParams,
    pub contribution_limits: ContributionLimits,
}

impl TaxYearConfig {
    /// Load and validate a year from JSON.
    pub fn from_json_str(json: &str) -> TaxOptimizerResult<Self> {
        let config: TaxYearConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json_string(&self) -> TaxOptimizerResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Reject rates outside [0, 1] and negative amounts. Bracket tables are
    /// validated when they are built.
    pub fn validate(&self) -> TaxOptimizerResult<()> {
        let se = &self.self_employment;
        for (field, rate) in [
            ("selfEmployment.earningsFactor", se.earnings_factor),
            ("selfEmployment.socialSecurityRate", se.social_security_rate),
            ("selfEmployment.medicareRate", se.medicare_rate),
            ("selfEmployment.additionalMedicareRate", se.additional_medicare_rate),
            ("selfEmployment.deductibleShare", se.deductible_share),
            ("niit.rate", self.niit.rate),
            ("amt.exemptionReductionRate", self.amt.exemption_reduction_rate),
            ("amt.lowRate", self.amt.low_rate),
            ("amt.highRate", self.amt.high_rate),
            ("salt.phaseDownRate", self.salt.phase_down_rate),
            ("itemized.charitableAgiLimit", self.itemized.charitable_agi_limit),
            ("itemized.medicalAgiFloor", self.itemized.medical_agi_floor),
            ("qbi.rate", self.qbi.rate),
            ("qbi.wageLimitRate", self.qbi.wage_limit_rate),
            ("qbi.altWageLimitRate", self.qbi.alt_wage_limit_rate),
            ("qbi.ubiaRate", self.qbi.ubia_rate),
            ("newProvisions.senior.phaseOutRate", self.new_provisions.senior.phase_out_rate),
            ("newProvisions.tips.phaseOutRate", self.new_provisions.tips.phase_out_rate),
            ("newProvisions.overtime.phaseOutRate", self.new_provisions.overtime.phase_out_rate),
            ("contributionLimits.sepRate", self.contribution_limits.sep_rate),
        ] {
            check_rate(field, rate)?;
        }

        // Divisors in the analyzers
        for (field, rate) in [
            ("amt.lowRate", self.amt.low_rate),
            ("qbi.wageLimitRate", self.qbi.wage_limit_rate),
        ] {
            if rate.is_zero() {
                return Err(TaxOptimizerError::InvalidConfig {
                    field: field.into(),
                    reason: "Rate must be greater than zero".into(),
                });
            }
        }

        for (field, amount) in [
            ("selfEmployment.wageBase", se.wage_base),
            ("selfEmployment.additionalMedicareThreshold", se.additional_medicare_threshold),
            ("amt.bracketThreshold", self.amt.bracket_threshold),
            ("amt.warningMargin", self.amt.warning_margin),
            ("dependentCredits.childCredit", self.dependent_credits.child_credit),
            ("dependentCredits.otherDependentCredit", self.dependent_credits.other_dependent_credit),
            ("contributionLimits.electiveDeferral", self.contribution_limits.elective_deferral),
            ("contributionLimits.ira", self.contribution_limits.ira),
            ("contributionLimits.sepCap", self.contribution_limits.sep_cap),
        ] {
            check_amount(field, amount)?;
        }

        for (name, table) in [
            ("standardDeduction", &self.standard_deduction),
            ("additionalStandardDeduction", &self.additional_standard_deduction),
            ("capitalLossLimit", &self.capital_loss_limit),
            ("niit.threshold", &self.niit.threshold),
            ("amt.exemption", &self.amt.exemption),
            ("amt.phaseOutStart", &self.amt.phase_out_start),
            ("salt.cap", &self.salt.cap),
            ("salt.floor", &self.salt.floor),
            ("qbi.threshold", &self.qbi.threshold),
            ("qbi.phaseInRange", &self.qbi.phase_in_range),
        ] {
            for (status, amount) in table.iter() {
                check_amount(&format!("{name}.{}", status.as_str()), *amount)?;
            }
        }

        for (status, floor) in self.salt.floor.iter() {
            if *floor > *self.salt.cap.get(status) {
                return Err(TaxOptimizerError::InvalidConfig {
                    field: format!("salt.floor.{}", status.as_str()),
                    reason: "SALT floor cannot exceed the cap".into(),
                });
            }
        }

        Ok(())
    }

    /// Illustrative 2025 parameters. Not a legal source.
    pub fn tax_year_2025() -> Self {
        let single_ordinary = BracketTable::from_trusted_pairs(&[
            (dec!(0), dec!(0.10)),
            (dec!(11_925), dec!(0.12)),
            (dec!(48_475), dec!(0.22)),
            (dec!(103_350), dec!(0.24)),
            (dec!(197_300), dec!(0.32)),
            (dec!(250_525), dec!(0.35)),
            (dec!(626_350), dec!(0.37)),
        ]);
        let married_ordinary = BracketTable::from_trusted_pairs(&[
            (dec!(0), dec!(0.10)),
            (dec!(23_850), dec!(0.12)),
            (dec!(96_950), dec!(0.22)),
            (dec!(206_700), dec!(0.24)),
            (dec!(394_600), dec!(0.32)),
            (dec!(501_050), dec!(0.35)),
            (dec!(751_600), dec!(0.37)),
        ]);
        let separate_ordinary = BracketTable::from_trusted_pairs(&[
            (dec!(0), dec!(0.10)),
            (dec!(11_925), dec!(0.12)),
            (dec!(48_475), dec!(0.22)),
            (dec!(103_350), dec!(0.24)),
            (dec!(197_300), dec!(0.32)),
            (dec!(250_525), dec!(0.35)),
            (dec!(375_800), dec!(0.37)),
        ]);
        let head_ordinary = BracketTable::from_trusted_pairs(&[
            (dec!(0), dec!(0.10)),
            (dec!(17_000), dec!(0.12)),
            (dec!(64_850), dec!(0.22)),
            (dec!(103_350), dec!(0.24)),
            (dec!(197_300), dec!(0.32)),
            (dec!(250_500), dec!(0.35)),
            (dec!(626_350), dec!(0.37)),
        ]);

        let pref = |zero_top: Money, fifteen_top: Money| {
            BracketTable::from_trusted_pairs(&[
                (dec!(0), dec!(0)),
                (zero_top, dec!(0.15)),
                (fifteen_top, dec!(0.20)),
            ])
        };

        TaxYearConfig {
            tax_year: 2025,
            ordinary_brackets: ByFilingStatus {
                single: single_ordinary,
                married: married_ordinary.clone(),
                married_separate: separate_ordinary,
                head: head_ordinary,
                widow: married_ordinary,
            },
            preferential_brackets: ByFilingStatus {
                single: pref(dec!(48_350), dec!(533_400)),
                married: pref(dec!(96_700), dec!(600_050)),
                married_separate: pref(dec!(48_350), dec!(300_000)),
                head: pref(dec!(64_750), dec!(566_700)),
                widow: pref(dec!(96_700), dec!(600_050)),
            },
            standard_deduction: ByFilingStatus {
                single: dec!(15_700),
                married: dec!(31_400),
                married_separate: dec!(15_700),
                head: dec!(23_550),
                widow: dec!(31_400),
            },
            additional_standard_deduction: ByFilingStatus {
                single: dec!(2_000),
                married: dec!(1_600),
                married_separate: dec!(1_600),
                head: dec!(2_000),
                widow: dec!(1_600),
            },
            senior_age: 65,
            capital_loss_limit: ByFilingStatus {
                single: dec!(3_000),
                married: dec!(3_000),
                married_separate: dec!(1_500),
                head: dec!(3_000),
                widow: dec!(3_000),
            },
            self_employment: SelfEmploymentParams {
                earnings_factor: dec!(0.9235),
                wage_base: dec!(176_100),
                social_security_rate: dec!(0.124),
                medicare_rate: dec!(0.029),
                additional_medicare_rate: dec!(0.009),
                additional_medicare_threshold: dec!(200_000),
                deductible_share: dec!(0.5),
            },
            niit: NiitParams {
                rate: dec!(0.038),
                threshold: ByFilingStatus {
                    single: dec!(200_000),
                    married: dec!(250_000),
                    married_separate: dec!(125_000),
                    head: dec!(200_000),
                    widow: dec!(250_000),
                },
            },
            amt: AmtParams {
                exemption: ByFilingStatus {
                    single: dec!(88_100),
                    married: dec!(137_000),
                    married_separate: dec!(68_500),
                    head: dec!(88_100),
                    widow: dec!(137_000),
                },
                phase_out_start: ByFilingStatus {
                    single: dec!(626_350),
                    married: dec!(1_252_700),
                    married_separate: dec!(626_350),
                    head: dec!(626_350),
                    widow: dec!(1_252_700),
                },
                exemption_reduction_rate: dec!(0.25),
                bracket_threshold: dec!(239_100),
                low_rate: dec!(0.26),
                high_rate: dec!(0.28),
                warning_margin: dec!(5_000),
            },
            salt: SaltParams {
                cap: ByFilingStatus {
                    single: dec!(40_000),
                    married: dec!(40_000),
                    married_separate: dec!(20_000),
                    head: dec!(40_000),
                    widow: dec!(40_000),
                },
                floor: ByFilingStatus {
                    single: dec!(10_000),
                    married: dec!(10_000),
                    married_separate: dec!(5_000),
                    head: dec!(10_000),
                    widow: dec!(10_000),
                },
                phase_down_start: ByFilingStatus {
                    single: dec!(500_000),
                    married: dec!(500_000),
                    married_separate: dec!(250_000),
                    head: dec!(500_000),
                    widow: dec!(500_000),
                },
                phase_down_rate: dec!(0.30),
            },
            itemized: ItemizedParams {
                charitable_agi_limit: dec!(0.60),
                medical_agi_floor: dec!(0.075),
            },
            qbi: QbiParams {
                rate: dec!(0.20),
                threshold: ByFilingStatus::joint_split(dec!(197_300), dec!(394_600)),
                phase_in_range: ByFilingStatus::joint_split(dec!(50_000), dec!(100_000)),
                wage_limit_rate: dec!(0.50),
                alt_wage_limit_rate: dec!(0.25),
                ubia_rate: dec!(0.025),
            },
            dependent_credits: DependentCreditParams {
                child_credit: dec!(2_200),
                other_dependent_credit: dec!(500),
                child_age_limit: 17,
                phase_out_threshold: ByFilingStatus::joint_split(dec!(200_000), dec!(400_000)),
                phase_out_reduction: dec!(50),
                phase_out_step: dec!(1_000),
            },
            new_provisions: NewProvisionParams {
                senior: ProvisionParams {
                    cap: ByFilingStatus::joint_split(dec!(6_000), dec!(6_000)),
                    phase_out_start: ByFilingStatus::joint_split(dec!(75_000), dec!(150_000)),
                    phase_out_rate: dec!(0.06),
                },
                tips: ProvisionParams {
                    cap: ByFilingStatus::joint_split(dec!(25_000), dec!(25_000)),
                    phase_out_start: ByFilingStatus::joint_split(dec!(150_000), dec!(300_000)),
                    phase_out_rate: dec!(0.10),
                },
                overtime: ProvisionParams {
                    cap: ByFilingStatus::joint_split(dec!(12_500), dec!(25_000)),
                    phase_out_start: ByFilingStatus::joint_split(dec!(150_000), dec!(300_000)),
                    phase_out_rate: dec!(0.10),
                },
            },
            contribution_limits: ContributionLimits {
                elective_deferral: dec!(23_500),
                elective_catch_up: dec!(7_500),
                ira: dec!(7_000),
                ira_catch_up: dec!(1_000),
                catch_up_age: 50,
                ira_phase_out_start: ByFilingStatus {
                    single: dec!(79_000),
                    married: dec!(126_000),
                    married_separate: dec!(0),
                    head: dec!(79_000),
                    widow: dec!(126_000),
                },
                ira_phase_out_end: ByFilingStatus {
                    single: dec!(89_000),
                    married: dec!(146_000),
                    married_separate: dec!(10_000),
                    head: dec!(89_000),
                    widow: dec!(146_000),
                },
                sep_rate: dec!(0.20),
                sep_cap: dec!(70_000),
                student_loan_interest_cap: dec!(2_500),
                student_loan_phase_out_start: ByFilingStatus {
                    single: dec!(85_000),
                    married: dec!(170_000),
                    married_separate: dec!(0),
                    head: dec!(85_000),
                    widow: dec!(170_000),
                },
                student_loan_phase_out_end: ByFilingStatus {
                    single: dec!(100_000),
                    married: dec!(200_000),
                    married_separate: dec!(0),
                    head: dec!(100_000),
                    widow: dec!(200_000),
                },
            },
        }
    }
}

fn check_rate(field: &str, rate: Rate) -> TaxOptimizerResult<()> {
    if rate < Decimal::ZERO || rate > Decimal::ONE {
        return Err(TaxOptimizerError::InvalidConfig {
            field: field.into(),
            reason: "Rate must be between 0 and 1".into(),
        });
    }
    Ok(())
}

fn check_amount(field: &str, amount: Money) -> TaxOptimizerResult<()> {
    if amount < Decimal::ZERO {
        return Err(TaxOptimizerError::InvalidConfig {
            field: field.into(),
            reason: "Amount cannot be negative".into(),
        });
    }
    Ok(())
}
