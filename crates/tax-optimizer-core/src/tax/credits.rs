use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::{ByFilingStatus, FilingStatus, Money};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DependentCreditParams {
    pub child_credit: Money,
    pub other_dependent_credit: Money,
    /// Children strictly younger than this qualify for the child credit.
    pub child_age_limit: u32,
    pub phase_out_threshold: ByFilingStatus<Money>,
    /// Credit lost per started `phase_out_step` of MAGI over the threshold.
    pub phase_out_reduction: Money,
    pub phase_out_step: Money,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DependentCredits {
    pub qualifying_children: u32,
    pub other_dependents: u32,
    pub tentative: Money,
    pub reduction: Money,
    pub allowed: Money,
}

/// Child and other-dependent credits after the MAGI phase-out.
///
/// The reduction is stepwise: every started step over the threshold costs
/// the full reduction amount.
pub fn dependent_credits(
    dependent_ages: &[u32],
    magi: Money,
    status: FilingStatus,
    params: &DependentCreditParams,
) -> DependentCredits {
    let qualifying_children = dependent_ages
        .iter()
        .filter(|&&age| age < params.child_age_limit)
        .count() as u32;
    let other_dependents = dependent_ages.len() as u32 - qualifying_children;

    let tentative = params.child_credit * Decimal::from(qualifying_children)
        + params.other_dependent_credit * Decimal::from(other_dependents);

    let excess = (magi - *params.phase_out_threshold.get(status)).max(Decimal::ZERO);
    let steps = if excess.is_zero() || params.phase_out_step <= Decimal::ZERO {
        Decimal::ZERO
    } else {
        (excess / params.phase_out_step).ceil()
    };
    let reduction = (steps * params.phase_out_reduction).min(tentative);

    DependentCredits {
        qualifying_children,
        other_dependents,
        tentative,
        reduction,
        allowed: tentative - reduction,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TaxYearConfig;
    use rust_decimal_macros::dec;

    fn params() -> DependentCreditParams {
        TaxYearConfig::tax_year_2025().dependent_credits
    }

    #[test]
    fn test_children_and_other_dependents() {
        let c = dependent_credits(&[4, 12, 19], dec!(90_000), FilingStatus::Married, &params());
        assert_eq!(c.qualifying_children, 2);
        assert_eq!(c.other_dependents, 1);
        assert_eq!(c.allowed, dec!(4_900));
    }

    #[test]
    fn test_age_seventeen_is_other_dependent() {
        let c = dependent_credits(&[17], dec!(50_000), FilingStatus::Single, &params());
        assert_eq!(c.qualifying_children, 0);
        assert_eq!(c.allowed, dec!(500));
    }

    #[test]
    fn test_partial_step_counts_as_full_step() {
        // 200,001 is one dollar over: one started 1,000 step -> 50 lost
        let c = dependent_credits(&[5], dec!(200_001), FilingStatus::Single, &params());
        assert_eq!(c.reduction, dec!(50));
        assert_eq!(c.allowed, dec!(2_150));
    }

    #[test]
    fn test_reduction_never_exceeds_credit() {
        let c = dependent_credits(&[5], dec!(2_000_000), FilingStatus::Single, &params());
        assert_eq!(c.allowed, dec!(0));
        let none = dependent_credits(&[], dec!(0), FilingStatus::Head, &params());
        assert_eq!(none.allowed, dec!(0));
    }
}
