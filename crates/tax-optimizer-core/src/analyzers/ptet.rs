use rust_decimal::Decimal;
use serde_json::json;
use tracing::debug;

use crate::optimizer::{Analyzer, AnalyzerContext, Category, Difficulty, Recommendation};
use crate::TaxOptimizerResult;

/// Pass-through entity tax election.
///
/// The entity pays state tax on eligible K-1 income and deducts it, so the
/// partner's K-1 ordinary income falls by the entity tax and the partner's
/// own state income tax falls by the matching credit. Needs state tables
/// with a PTET rate for the taxpayer's state.
#[derive(Debug, Clone, Copy)]
pub struct PtetAnalyzer;

impl Analyzer for PtetAnalyzer {
    fn id(&self) -> &str {
        "ptet"
    }

    fn name(&self) -> &str {
        "Pass-through entity tax"
    }

    fn analyze(&self, ctx: &AnalyzerContext<'_>) -> TaxOptimizerResult<Vec<Recommendation>> {
        let profile = ctx.profile;
        if !profile.k1.iter().any(|k| k.ptet_eligible && k.ordinary_income > Decimal::ZERO) {
            return Ok(Vec::new());
        }
        let Some(schedule) = ctx.state_schedule() else {
            debug!(state = ?profile.state_code, "no state schedule for PTET");
            return Ok(Vec::new());
        };
        let Some(rate) = schedule.ptet_rate else {
            return Ok(Vec::new());
        };

        let mut k1 = profile.k1.clone();
        let mut entity_tax = Decimal::ZERO;
        let mut eligible_income = Decimal::ZERO;
        for entity in k1.iter_mut().filter(|k| k.ptet_eligible) {
            if entity.ordinary_income <= Decimal::ZERO {
                continue;
            }
            let tax = entity.ordinary_income * rate;
            eligible_income += entity.ordinary_income;
            entity_tax += tax;
            entity.ordinary_income -= tax;
        }

        let state_paid = profile.itemized.state_income_tax;
        let k1 = serde_json::to_value(&k1)?;
        let patch = json!({
            "k1": k1,
            "itemized": { "stateIncomeTax": (state_paid - entity_tax).max(Decimal::ZERO) },
        });
        let savings = ctx.savings_from_patch(&patch)?;

        Ok(vec![Recommendation::new(
            "ptet.elect",
            Category::State,
            Difficulty::Medium,
            "Elect pass-through entity tax",
            savings,
        )
        .with_description(format!(
            "The entity pays {} of state tax on {} of eligible income and deducts it federally.",
            entity_tax.round_dp(2),
            eligible_income
        ))
        .with_detail(format!(
            "Entity rate {}% versus {} of individual state tax on the same income",
            (rate * Decimal::ONE_HUNDRED).normalize(),
            schedule.tax_on(eligible_income).round_dp(2)
        ))
        .with_detail("The election must be made by the entity before its deadline")
        .with_patch(patch)
        .with_citation("notice_2020_75")])
    }
}
