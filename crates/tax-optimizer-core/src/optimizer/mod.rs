//! Savings recommendations over a computed return.
//!
//! Analyzers are independent plugins that read the same profile and
//! baseline result and propose actions. The orchestrator runs them behind a
//! fault boundary and ranks what they return; the what-if evaluator
//! recomputes the return with selected recommendations' overrides applied.

pub mod analyzer;
pub mod citations;
pub mod orchestrator;
pub mod state_tables;
pub mod whatif;

use serde::{Deserialize, Serialize};

use crate::profile::patch::ProfilePatch;
use crate::types::Money;

pub use analyzer::{Analyzer, AnalyzerContext, AnalyzerRegistry};
pub use citations::{Citation, CitationLookup, CitationTable};
pub use orchestrator::{
    AnalyzerOutcome, AnalyzerRun, CategorySummary, OptimizationOrchestrator, OptimizationReport,
    OptimizationSummary, OrchestratorOptions,
};
pub use state_tables::{StateTableSet, StateTaxSchedule, StateTaxTables};
pub use whatif::{evaluate_what_if, WhatIfResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    FilingStatus,
    Deductions,
    Retirement,
    Credits,
    SelfEmployment,
    CapitalGains,
    PassThrough,
    State,
    Amt,
    Crypto,
    International,
    RealEstate,
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

/// One proposed action and its estimated effect on the baseline return.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recommendation {
    /// Stable identifier, `<analyzer>.<action>`.
    pub id: String,
    pub category: Category,
    pub difficulty: Difficulty,
    /// Reduction in final tax versus the baseline result.
    pub potential_savings: Money,
    pub title: String,
    pub description: String,
    pub details: Vec<String>,
    /// Partial profile describing the return after the action is taken.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub override_patch: Option<ProfilePatch>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub citation_key: Option<String>,
}

impl Recommendation {
    pub fn new(
        id: impl Into<String>,
        category: Category,
        difficulty: Difficulty,
        title: impl Into<String>,
        potential_savings: Money,
    ) -> Self {
        Recommendation {
            id: id.into(),
            category,
            difficulty,
            potential_savings,
            title: title.into(),
            description: String::new(),
            details: Vec::new(),
            override_patch: None,
            citation_key: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_detail(mut self, line: impl Into<String>) -> Self {
        self.details.push(line.into());
        self
    }

    pub fn with_patch(mut self, patch: ProfilePatch) -> Self {
        self.override_patch = Some(patch);
        self
    }

    pub fn with_citation(mut self, key: impl Into<String>) -> Self {
        self.citation_key = Some(key.into());
        self
    }
}
