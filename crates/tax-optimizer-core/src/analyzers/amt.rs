use rust_decimal::Decimal;
use serde_json::json;

use crate::optimizer::{Analyzer, AnalyzerContext, Category, Difficulty, Recommendation};
use crate::TaxOptimizerResult;

/// Defers incentive stock option spread that pushes the return into AMT.
#[derive(Debug, Clone, Copy)]
pub struct AmtAnalyzer;

impl Analyzer for AmtAnalyzer {
    fn id(&self) -> &str {
        "amt"
    }

    fn name(&self) -> &str {
        "Alternative minimum tax"
    }

    fn analyze(&self, ctx: &AnalyzerContext<'_>) -> TaxOptimizerResult<Vec<Recommendation>> {
        let amt = &ctx.baseline.amt;
        let iso_spread = ctx.profile.amt_items.iso_spread;
        if amt.amt_owed <= Decimal::ZERO || iso_spread <= Decimal::ZERO {
            return Ok(Vec::new());
        }

        // At least the low AMT rate applies to each deferred dollar.
        let deferred = (amt.amt_owed / ctx.config().amt.low_rate).ceil().min(iso_spread);
        let remaining = iso_spread - deferred;
        let patch = json!({ "amtItems": { "isoSpread": remaining } });
        let savings = ctx.savings_from_patch(&patch)?;

        Ok(vec![Recommendation::new(
            "amt.spread_iso_exercise",
            Category::Amt,
            Difficulty::Hard,
            "Spread incentive stock option exercises across years",
            savings,
        )
        .with_description(format!(
            "Exercising {} of spread this year and deferring {} avoids most of the {} AMT.",
            remaining, deferred, amt.amt_owed
        ))
        .with_detail(format!("Tentative minimum tax: {}", amt.tentative_minimum_tax))
        .with_detail("Deferred exercises are exposed to next year's AMT and stock price")
        .with_patch(patch)
        .with_citation("irc_56b3")])
    }
}
