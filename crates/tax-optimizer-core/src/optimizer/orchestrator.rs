//! Runs every registered analyzer against one baseline and ranks the result.
//!
//! Each analyzer runs inside its own fault boundary: an `Err` or a panic is
//! recorded as a failed [`AnalyzerRun`] and contributes nothing, while the
//! remaining analyzers continue. Ranking depends only on savings and
//! registration order, so sequential and parallel runs agree.

use std::any::Any;
use std::collections::BTreeMap;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::time::{Duration, Instant};

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::optimizer::analyzer::{Analyzer, AnalyzerContext, AnalyzerRegistry};
use crate::optimizer::citations::{Citation, CitationLookup};
use crate::optimizer::state_tables::StateTaxTables;
use crate::optimizer::whatif::{evaluate_what_if, WhatIfResult};
use crate::optimizer::{Category, Difficulty, Recommendation};
use crate::profile::TaxProfile;
use crate::tax::pipeline::{tax_year_mismatch, TaxPipeline, TaxResult};
use crate::types::{with_metadata, ComputationOutput, Money};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrchestratorOptions {
    /// Run analyzers on scoped threads.
    pub parallel: bool,
    /// Per-analyzer wall-clock budget. Overruns are reported, results kept.
    pub time_budget: Option<Duration>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum AnalyzerOutcome {
    Completed { recommendations: usize },
    Failed { diagnostic: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzerRun {
    pub analyzer_id: String,
    pub analyzer_name: String,
    pub outcome: AnalyzerOutcome,
    pub elapsed_us: u64,
    pub over_budget: bool,
}

impl AnalyzerRun {
    pub fn failed(&self) -> bool {
        matches!(self.outcome, AnalyzerOutcome::Failed { .. })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategorySummary {
    pub count: usize,
    pub savings: Money,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OptimizationSummary {
    pub by_category: BTreeMap<Category, CategorySummary>,
    pub easy_wins: usize,
    pub total_recommendations: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OptimizationReport {
    pub current_tax: TaxResult,
    /// Positive-savings recommendations, highest savings first.
    pub optimizations: Vec<Recommendation>,
    pub total_potential_savings: Money,
    /// `max(0, final tax - total savings)`. Non-binding: recommendations are
    /// estimated one at a time and may overlap or conflict.
    pub optimized_tax: Money,
    pub summary: OptimizationSummary,
    pub analyzer_runs: Vec<AnalyzerRun>,
    pub citations: BTreeMap<String, Citation>,
    pub amt_warning: bool,
}

pub struct OptimizationOrchestrator {
    pipeline: TaxPipeline,
    registry: AnalyzerRegistry,
    citations: Option<Arc<dyn CitationLookup>>,
    state_tables: Option<Arc<dyn StateTaxTables>>,
    options: OrchestratorOptions,
}

struct Execution {
    run: AnalyzerRun,
    recommendations: Vec<Recommendation>,
}

impl OptimizationOrchestrator {
    pub fn new(pipeline: TaxPipeline, registry: AnalyzerRegistry) -> Self {
        OptimizationOrchestrator {
            pipeline,
            registry,
            citations: None,
            state_tables: None,
            options: OrchestratorOptions::default(),
        }
    }

    pub fn with_citations(mut self, citations: Arc<dyn CitationLookup>) -> Self {
        self.citations = Some(citations);
        self
    }

    pub fn with_state_tables(mut self, state_tables: Arc<dyn StateTaxTables>) -> Self {
        self.state_tables = Some(state_tables);
        self
    }

    pub fn with_options(mut self, options: OrchestratorOptions) -> Self {
        self.options = options;
        self
    }

    pub fn pipeline(&self) -> &TaxPipeline {
        &self.pipeline
    }

    pub fn registry(&self) -> &AnalyzerRegistry {
        &self.registry
    }

    /// Baseline, run all analyzers, rank, summarize. Never fails.
    pub fn run(&self, profile: &TaxProfile) -> ComputationOutput<OptimizationReport> {
        let start = Instant::now();
        let mut warnings: Vec<String> = Vec::new();

        if let Some(year) = profile.tax_year {
            if year != self.pipeline.config().tax_year {
                warnings.push(tax_year_mismatch(year, self.pipeline.config().tax_year));
            }
        }

        // A baseline fault leaves nothing to analyze.
        let baseline = panic::catch_unwind(AssertUnwindSafe(|| self.pipeline.compute(profile)));
        let (baseline, baseline_ok) = match baseline {
            Ok(result) => (result, true),
            Err(payload) => {
                let diagnostic = panic_message(payload.as_ref());
                warn!(panic = %diagnostic, "baseline computation panicked");
                warnings.push(format!(
                    "Baseline tax computation failed ({diagnostic}); no analyzers were run"
                ));
                (TaxResult::default(), false)
            }
        };
        let ctx = AnalyzerContext::new(profile, &baseline, &self.pipeline)
            .with_citations(self.citations.as_deref())
            .with_state_tables(self.state_tables.as_deref());

        let executions = if !baseline_ok {
            Vec::new()
        } else if self.options.parallel && self.registry.len() > 1 {
            self.run_parallel(&ctx)
        } else {
            self.registry
                .analyzers()
                .iter()
                .map(|a| execute(a.as_ref(), &ctx, self.options.time_budget))
                .collect()
        };

        let mut ranked: Vec<(usize, usize, Recommendation)> = Vec::new();
        let mut analyzer_runs = Vec::with_capacity(executions.len());
        for (index, execution) in executions.into_iter().enumerate() {
            match &execution.run.outcome {
                AnalyzerOutcome::Failed { diagnostic } => warnings.push(format!(
                    "Analyzer '{}' failed and was skipped: {}",
                    execution.run.analyzer_id, diagnostic
                )),
                AnalyzerOutcome::Completed { .. } if execution.run.over_budget => {
                    warnings.push(format!(
                        "Analyzer '{}' exceeded its time budget ({} us)",
                        execution.run.analyzer_id, execution.run.elapsed_us
                    ))
                }
                AnalyzerOutcome::Completed { .. } => {}
            }
            ranked.extend(
                execution
                    .recommendations
                    .into_iter()
                    .enumerate()
                    .filter(|(_, r)| r.potential_savings > Decimal::ZERO)
                    .map(|(position, r)| (index, position, r)),
            );
            analyzer_runs.push(execution.run);
        }

        ranked.sort_by(|a, b| {
            b.2.potential_savings
                .cmp(&a.2.potential_savings)
                .then(a.0.cmp(&b.0))
                .then(a.1.cmp(&b.1))
                .then_with(|| a.2.id.cmp(&b.2.id))
        });
        let optimizations: Vec<Recommendation> = ranked.into_iter().map(|(_, _, r)| r).collect();

        let total_potential_savings: Money = optimizations.iter().map(|r| r.potential_savings).sum();
        let optimized_tax = (baseline.final_tax - total_potential_savings).max(Decimal::ZERO);
        let summary = summarize(&optimizations);

        let citations = match &self.citations {
            Some(lookup) => optimizations
                .iter()
                .filter_map(|r| r.citation_key.as_deref())
                .filter_map(|key| lookup.get(key).map(|c| (key.to_string(), c)))
                .collect(),
            None => BTreeMap::new(),
        };

        let warning_margin = self.pipeline.config().amt.warning_margin;
        let amt_warning = baseline.amt.is_near_trigger(warning_margin);
        if optimizations.len() > 1 {
            warnings.push(
                "Optimized tax assumes every recommendation is applied independently; \
                 combined effects are not verified."
                    .into(),
            );
        }

        let report = OptimizationReport {
            current_tax: baseline,
            optimizations,
            total_potential_savings,
            optimized_tax,
            summary,
            analyzer_runs,
            citations,
            amt_warning,
        };

        let elapsed = start.elapsed().as_micros() as u64;
        with_metadata(
            "Independent analyzers over one baseline; positive-savings recommendations \
             ranked by savings, then registration order, then id",
            &serde_json::json!({
                "analyzers": self.registry.analyzers().iter().map(|a| a.id()).collect::<Vec<_>>(),
                "parallel": self.options.parallel,
                "time_budget_ms": self.options.time_budget.map(|d| d.as_millis() as u64),
            }),
            warnings,
            elapsed,
            report,
        )
    }

    /// Recompute `profile` with the patches of `selected_ids` from `report`.
    pub fn what_if(
        &self,
        profile: &TaxProfile,
        report: &OptimizationReport,
        selected_ids: &[String],
    ) -> ComputationOutput<WhatIfResult> {
        evaluate_what_if(&self.pipeline, profile, &report.optimizations, selected_ids)
    }

    fn run_parallel(&self, ctx: &AnalyzerContext<'_>) -> Vec<Execution> {
        let budget = self.options.time_budget;
        std::thread::scope(|scope| {
            let handles: Vec<_> = self
                .registry
                .analyzers()
                .iter()
                .map(|analyzer| {
                    let analyzer = Arc::clone(analyzer);
                    let ctx = *ctx;
                    scope.spawn(move || execute(analyzer.as_ref(), &ctx, budget))
                })
                .collect();

            handles
                .into_iter()
                .zip(self.registry.analyzers())
                .map(|(handle, analyzer)| {
                    handle.join().unwrap_or_else(|payload| Execution {
                        run: AnalyzerRun {
                            analyzer_id: analyzer.id().to_string(),
                            analyzer_name: analyzer.name().to_string(),
                            outcome: AnalyzerOutcome::Failed {
                                diagnostic: panic_message(payload.as_ref()),
                            },
                            elapsed_us: 0,
                            over_budget: false,
                        },
                        recommendations: Vec::new(),
                    })
                })
                .collect()
        })
    }
}

fn execute(analyzer: &dyn Analyzer, ctx: &AnalyzerContext<'_>, budget: Option<Duration>) -> Execution {
    let start = Instant::now();
    let outcome = panic::catch_unwind(AssertUnwindSafe(|| analyzer.analyze(ctx)));
    let elapsed = start.elapsed();
    let over_budget = budget.is_some_and(|b| elapsed > b);

    let (outcome, recommendations) = match outcome {
        Ok(Ok(recommendations)) => {
            debug!(
                analyzer = analyzer.id(),
                count = recommendations.len(),
                "analyzer completed"
            );
            (
                AnalyzerOutcome::Completed {
                    recommendations: recommendations.len(),
                },
                recommendations,
            )
        }
        Ok(Err(e)) => {
            warn!(analyzer = analyzer.id(), error = %e, "analyzer failed");
            (
                AnalyzerOutcome::Failed {
                    diagnostic: e.to_string(),
                },
                Vec::new(),
            )
        }
        Err(payload) => {
            let diagnostic = panic_message(payload.as_ref());
            warn!(analyzer = analyzer.id(), panic = %diagnostic, "analyzer panicked");
            (AnalyzerOutcome::Failed { diagnostic }, Vec::new())
        }
    };

    if over_budget {
        warn!(
            analyzer = analyzer.id(),
            elapsed_ms = elapsed.as_millis() as u64,
            "analyzer exceeded time budget"
        );
    }

    Execution {
        run: AnalyzerRun {
            analyzer_id: analyzer.id().to_string(),
            analyzer_name: analyzer.name().to_string(),
            outcome,
            elapsed_us: elapsed.as_micros() as u64,
            over_budget,
        },
        recommendations,
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        format!("panicked: {s}")
    } else if let Some(s) = payload.downcast_ref::<String>() {
        format!("panicked: {s}")
    } else {
        "panicked".to_string()
    }
}

fn summarize(optimizations: &[Recommendation]) -> OptimizationSummary {
    let mut by_category: BTreeMap<Category, CategorySummary> = BTreeMap::new();
    for r in optimizations {
        let entry = by_category.entry(r.category).or_default();
        entry.count += 1;
        entry.savings += r.potential_savings;
    }
    OptimizationSummary {
        by_category,
        easy_wins: optimizations
            .iter()
            .filter(|r| r.difficulty == Difficulty::Easy)
            .count(),
        total_recommendations: optimizations.len(),
    }
}
