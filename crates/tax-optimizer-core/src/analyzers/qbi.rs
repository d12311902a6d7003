use rust_decimal::Decimal;

use crate::optimizer::{Analyzer, AnalyzerContext, Category, Difficulty, Recommendation};
use crate::tax::pipeline::{qbi_businesses, sep_contribution_limit};
use crate::tax::qbi::qbi_deduction;
use crate::TaxOptimizerResult;

/// QBI deduction lost to the W-2 wage and property limitation.
///
/// Reruns the QBI calculation with each limited business paying enough W-2
/// wages to clear the limit. The recovered deduction is valued at the
/// baseline marginal rate; the cost of the added wages is not modeled.
#[derive(Debug, Clone, Copy)]
pub struct QbiAnalyzer;

impl Analyzer for QbiAnalyzer {
    fn id(&self) -> &str {
        "qbi"
    }

    fn name(&self) -> &str {
        "Qualified business income"
    }

    fn analyze(&self, ctx: &AnalyzerContext<'_>) -> TaxOptimizerResult<Vec<Recommendation>> {
        let base = ctx.baseline;
        if base.qbi.lost_to_wage_limit <= Decimal::ZERO {
            return Ok(Vec::new());
        }

        let profile = ctx.profile;
        let cfg = ctx.config();
        let params = &cfg.qbi;
        let sep = profile.retirement.sep_contribution.min(sep_contribution_limit(
            profile.self_employment.net_profit(),
            base.se_deduction,
            &cfg.contribution_limits,
        ));

        let mut businesses = qbi_businesses(profile, base.se_deduction, sep);
        let mut details = Vec::new();
        for (biz, component) in businesses.iter_mut().zip(&base.qbi.components) {
            if component.lost_to_wage_limit <= Decimal::ZERO {
                continue;
            }
            let needed = component.tentative / params.wage_limit_rate;
            if needed > biz.w2_wages {
                details.push(format!(
                    "{}: W-2 wages of {} needed, {} paid ({} of deduction lost)",
                    biz.name,
                    needed.round_dp(2),
                    biz.w2_wages,
                    component.lost_to_wage_limit.round_dp(2)
                ));
                biz.w2_wages = needed;
            }
        }

        let unlimited = qbi_deduction(
            &businesses,
            base.taxable_income_before_qbi,
            base.net_capital_gain + profile.income.qualified_dividends,
            profile.filing_status,
            params,
        );
        let recovered = unlimited.deduction - base.qbi.deduction;
        if recovered <= Decimal::ZERO {
            return Ok(Vec::new());
        }

        let savings = (recovered * ctx.marginal_rate()).round_dp(2);
        let rec = Recommendation::new(
            "qbi.wage_limitation",
            Category::PassThrough,
            Difficulty::Hard,
            "Recover QBI deduction lost to the W-2 wage limit",
            savings,
        )
        .with_description(format!(
            "The wage limitation removes {} of deduction. Reasonable compensation \
             or an S corporation payroll could restore it.",
            recovered.round_dp(2)
        ));
        Ok(vec![details
            .into_iter()
            .fold(rec, |rec, line| rec.with_detail(line))
            .with_citation("irc_199a")])
    }
}
