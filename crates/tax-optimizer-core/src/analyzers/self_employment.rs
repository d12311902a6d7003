use rust_decimal::Decimal;
use serde_json::json;

use crate::optimizer::{Analyzer, AnalyzerContext, Category, Difficulty, Recommendation};
use crate::tax::pipeline::sep_contribution_limit;
use crate::TaxOptimizerResult;

/// SEP-IRA room for Schedule C income.
#[derive(Debug, Clone, Copy)]
pub struct SelfEmploymentAnalyzer;

impl Analyzer for SelfEmploymentAnalyzer {
    fn id(&self) -> &str {
        "self_employment"
    }

    fn name(&self) -> &str {
        "Self-employment retirement plan"
    }

    fn analyze(&self, ctx: &AnalyzerContext<'_>) -> TaxOptimizerResult<Vec<Recommendation>> {
        let net_profit = ctx.profile.self_employment.net_profit();
        if net_profit <= Decimal::ZERO {
            return Ok(Vec::new());
        }

        let limits = &ctx.config().contribution_limits;
        let limit = sep_contribution_limit(net_profit, ctx.baseline.se_deduction, limits);
        let current = ctx.profile.retirement.sep_contribution;
        if limit <= current {
            return Ok(Vec::new());
        }

        let patch = json!({ "retirement": { "sepContribution": limit } });
        let savings = ctx.savings_from_patch(&patch)?;
        Ok(vec![Recommendation::new(
            "self_employment.sep_ira",
            Category::SelfEmployment,
            Difficulty::Medium,
            "Fund a SEP-IRA",
            savings,
        )
        .with_description(format!(
            "Contribute up to {} from net self-employment earnings.",
            limit.round_dp(2)
        ))
        .with_detail(format!(
            "{}% of net profit after the SE tax deduction, capped at {}",
            (limits.sep_rate * Decimal::ONE_HUNDRED).normalize(),
            limits.sep_cap
        ))
        .with_detail("The contribution also reduces qualified business income")
        .with_patch(patch)
        .with_citation("irc_404")])
    }
}
