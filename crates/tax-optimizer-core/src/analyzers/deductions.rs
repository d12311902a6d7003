use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde_json::json;

use crate::optimizer::{Analyzer, AnalyzerContext, Category, Difficulty, Recommendation};
use crate::TaxOptimizerResult;

/// Itemized total at or above this share of the standard deduction counts
/// as close enough for bunching to matter.
const BUNCHING_WINDOW: Decimal = dec!(0.75);

/// Standard-versus-itemized choice and charitable bunching.
#[derive(Debug, Clone, Copy)]
pub struct DeductionsAnalyzer;

impl Analyzer for DeductionsAnalyzer {
    fn id(&self) -> &str {
        "deductions"
    }

    fn name(&self) -> &str {
        "Deductions"
    }

    fn analyze(&self, ctx: &AnalyzerContext<'_>) -> TaxOptimizerResult<Vec<Recommendation>> {
        let mut out = Vec::new();
        out.extend(deduction_method(ctx)?);
        out.extend(charity_bunching(ctx)?);
        Ok(out)
    }
}

fn deduction_method(ctx: &AnalyzerContext<'_>) -> TaxOptimizerResult<Option<Recommendation>> {
    let base = ctx.baseline;
    if !ctx.profile.itemized.force_itemize || base.itemized_deductions >= base.standard_deduction {
        return Ok(None);
    }

    let patch = json!({ "itemized": { "forceItemize": false } });
    let savings = ctx.savings_from_patch(&patch)?;
    Ok(Some(
        Recommendation::new(
            "deductions.take_standard",
            Category::Deductions,
            Difficulty::Easy,
            "Take the standard deduction",
            savings,
        )
        .with_description(format!(
            "Itemized deductions of {} are below the {} standard deduction.",
            base.itemized_deductions, base.standard_deduction
        ))
        .with_patch(patch)
        .with_citation("irc_63"),
    ))
}

/// Give two years of charity in one year: itemize in the bunching year,
/// take the standard deduction in the next.
fn charity_bunching(ctx: &AnalyzerContext<'_>) -> TaxOptimizerResult<Option<Recommendation>> {
    let itemized = &ctx.profile.itemized;
    let base = ctx.baseline;
    let charity = itemized.charitable();
    if charity.is_zero() || base.itemized_deductions < base.standard_deduction * BUNCHING_WINDOW {
        return Ok(None);
    }

    let bunched = json!({ "itemized": { "charitableCash": itemized.charitable_cash + charity } });
    let skipped = json!({ "itemized": { "charitableCash": 0, "charitableNoncash": 0 } });
    let bunch_year = ctx.savings_from_patch(&bunched)?;
    let skip_year = ctx.savings_from_patch(&skipped)?;
    let net = bunch_year + skip_year;
    if net <= Decimal::ZERO {
        return Ok(None);
    }

    Ok(Some(
        Recommendation::new(
            "deductions.bunch_charity",
            Category::Deductions,
            Difficulty::Medium,
            "Bunch charitable gifts into alternating years",
            net,
        )
        .with_description(format!(
            "Give {} this year and nothing next year. Savings are net over the two years.",
            charity * Decimal::TWO
        ))
        .with_detail(format!("Bunching year savings: {}", bunch_year))
        .with_detail(format!("Off year change: {}", skip_year))
        .with_detail("A donor-advised fund keeps the annual giving schedule")
        .with_patch(bunched)
        .with_citation("irc_170"),
    ))
}
