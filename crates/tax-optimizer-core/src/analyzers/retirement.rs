use rust_decimal::Decimal;
use serde_json::json;

use crate::optimizer::{Analyzer, AnalyzerContext, Category, Difficulty, Recommendation};
use crate::tax::pipeline::{elective_deferral_limit, ira_deductible_fraction, ira_limit};
use crate::TaxOptimizerResult;

/// Unused 401(k) deferral and deductible IRA room.
#[derive(Debug, Clone, Copy)]
pub struct RetirementAnalyzer;

impl Analyzer for RetirementAnalyzer {
    fn id(&self) -> &str {
        "retirement"
    }

    fn name(&self) -> &str {
        "Retirement contributions"
    }

    fn analyze(&self, ctx: &AnalyzerContext<'_>) -> TaxOptimizerResult<Vec<Recommendation>> {
        let mut out = Vec::new();
        out.extend(deferral_headroom(ctx)?);
        out.extend(ira_headroom(ctx)?);
        Ok(out)
    }
}

fn deferral_headroom(ctx: &AnalyzerContext<'_>) -> TaxOptimizerResult<Option<Recommendation>> {
    let profile = ctx.profile;
    let retirement = &profile.retirement;
    // Deferral needs a workplace plan
    if !retirement.covered_by_workplace_plan && retirement.elective_deferral.is_zero() {
        return Ok(None);
    }

    let limit = elective_deferral_limit(profile.taxpayer_age, &ctx.config().contribution_limits);
    let target = limit.min(profile.income.wages);
    let headroom = target - retirement.elective_deferral;
    if headroom <= Decimal::ZERO {
        return Ok(None);
    }

    let patch = json!({ "retirement": { "electiveDeferral": target } });
    let savings = ctx.savings_from_patch(&patch)?;
    let mut rec = Recommendation::new(
        "retirement.max_401k",
        Category::Retirement,
        Difficulty::Easy,
        "Maximize 401(k) deferrals",
        savings,
    )
    .with_description(format!(
        "Increase pre-tax deferrals by {} to reach the {} limit.",
        headroom, limit
    ))
    .with_detail(format!("Current deferral: {}", retirement.elective_deferral))
    .with_detail(format!("Marginal rate: {}%", (ctx.marginal_rate() * Decimal::ONE_HUNDRED).normalize()));
    if limit > ctx.config().contribution_limits.elective_deferral {
        rec = rec.with_detail("Includes the age 50+ catch-up contribution");
    }
    Ok(Some(rec.with_patch(patch).with_citation("irc_402g")))
}

fn ira_headroom(ctx: &AnalyzerContext<'_>) -> TaxOptimizerResult<Option<Recommendation>> {
    let profile = ctx.profile;
    let cfg = ctx.config();
    let compensation = profile.income.wages
        + profile.self_employment.net_profit().max(Decimal::ZERO)
        + profile.k1_guaranteed_payments();
    let limit = ira_limit(profile.taxpayer_age, &cfg.contribution_limits).min(compensation);
    let current = profile.adjustments.traditional_ira;
    if limit <= current {
        return Ok(None);
    }

    let deductible = ira_deductible_fraction(profile, ctx.baseline.agi + current, cfg);
    if deductible.is_zero() {
        return Ok(None);
    }

    let patch = json!({ "adjustments": { "traditionalIra": limit } });
    let savings = ctx.savings_from_patch(&patch)?;
    let mut rec = Recommendation::new(
        "retirement.traditional_ira",
        Category::Retirement,
        Difficulty::Easy,
        "Contribute to a traditional IRA",
        savings,
    )
    .with_description(format!(
        "Contribute {} more to a traditional IRA before the filing deadline.",
        limit - current
    ));
    if deductible < Decimal::ONE {
        rec = rec.with_detail(format!(
            "Only {}% is deductible at your income with a workplace plan",
            (deductible * Decimal::ONE_HUNDRED).round_dp(1).normalize()
        ));
    }
    Ok(Some(rec.with_patch(patch).with_citation("irc_219")))
}
