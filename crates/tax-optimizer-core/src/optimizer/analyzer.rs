use std::sync::Arc;

use rust_decimal::Decimal;

use crate::config::TaxYearConfig;
use crate::optimizer::citations::{Citation, CitationLookup};
use crate::optimizer::state_tables::{StateTaxSchedule, StateTaxTables};
use crate::optimizer::Recommendation;
use crate::profile::patch::ProfilePatch;
use crate::profile::TaxProfile;
use crate::tax::pipeline::{TaxPipeline, TaxResult};
use crate::types::Money;
use crate::TaxOptimizerResult;

/// A recommendation source. Implementations read the context and return
/// zero or more recommendations; they never mutate shared state and never
/// depend on another analyzer. An `Err` is contained by the orchestrator.
pub trait Analyzer: Send + Sync {
    /// Stable identifier used as the prefix of recommendation ids.
    fn id(&self) -> &str;

    fn name(&self) -> &str;

    fn analyze(&self, ctx: &AnalyzerContext<'_>) -> TaxOptimizerResult<Vec<Recommendation>>;
}

/// Everything an analyzer may read.
#[derive(Clone, Copy)]
pub struct AnalyzerContext<'a> {
    pub profile: &'a TaxProfile,
    pub baseline: &'a TaxResult,
    pipeline: &'a TaxPipeline,
    citations: Option<&'a dyn CitationLookup>,
    state_tables: Option<&'a dyn StateTaxTables>,
}

impl<'a> AnalyzerContext<'a> {
    pub fn new(profile: &'a TaxProfile, baseline: &'a TaxResult, pipeline: &'a TaxPipeline) -> Self {
        AnalyzerContext {
            profile,
            baseline,
            pipeline,
            citations: None,
            state_tables: None,
        }
    }

    pub fn with_citations(mut self, citations: Option<&'a dyn CitationLookup>) -> Self {
        self.citations = citations;
        self
    }

    pub fn with_state_tables(mut self, state_tables: Option<&'a dyn StateTaxTables>) -> Self {
        self.state_tables = state_tables;
        self
    }

    pub fn config(&self) -> &'a TaxYearConfig {
        self.pipeline.config()
    }

    pub fn pipeline(&self) -> &'a TaxPipeline {
        self.pipeline
    }

    /// Recompute the return with `patch` applied to a copy of the profile.
    pub fn evaluate(&self, patch: &ProfilePatch) -> TaxOptimizerResult<TaxResult> {
        let patched = self.profile.apply_patch(patch)?;
        Ok(self.pipeline.compute(&patched))
    }

    /// Baseline final tax minus final tax after `patch`.
    pub fn savings_from_patch(&self, patch: &ProfilePatch) -> TaxOptimizerResult<Money> {
        Ok(self.baseline.final_tax - self.evaluate(patch)?.final_tax)
    }

    /// Ordinary marginal rate at the baseline's ordinary taxable income.
    pub fn marginal_rate(&self) -> Decimal {
        self.baseline.marginal_rate
    }

    pub fn citation(&self, key: &str) -> Option<Citation> {
        self.citations.and_then(|c| c.get(key))
    }

    /// The taxpayer's state schedule, when a state code and tables are present.
    pub fn state_schedule(&self) -> Option<StateTaxSchedule> {
        let code = self.profile.state_code.as_deref()?;
        self.state_tables?.get(code, self.profile.filing_status)
    }
}

/// Analyzers in registration order. Order is the ranking tiebreak.
#[derive(Clone, Default)]
pub struct AnalyzerRegistry {
    analyzers: Vec<Arc<dyn Analyzer>>,
}

impl AnalyzerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, analyzer: Arc<dyn Analyzer>) -> &mut Self {
        self.analyzers.push(analyzer);
        self
    }

    pub fn with(mut self, analyzer: impl Analyzer + 'static) -> Self {
        self.analyzers.push(Arc::new(analyzer));
        self
    }

    pub fn analyzers(&self) -> &[Arc<dyn Analyzer>] {
        &self.analyzers
    }

    pub fn by_id(&self, id: &str) -> Option<Arc<dyn Analyzer>> {
        self.analyzers.iter().find(|a| a.id() == id).cloned()
    }

    pub fn len(&self) -> usize {
        self.analyzers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.analyzers.is_empty()
    }
}

impl std::fmt::Debug for AnalyzerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.analyzers.iter().map(|a| a.id()))
            .finish()
    }
}
