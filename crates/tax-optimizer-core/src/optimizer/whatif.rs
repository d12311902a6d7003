use std::time::Instant;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::TaxOptimizerError;
use crate::optimizer::Recommendation;
use crate::profile::TaxProfile;
use crate::tax::pipeline::{TaxPipeline, TaxResult};
use crate::types::{with_metadata, ComputationOutput, Money};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WhatIfResult {
    pub original_result: TaxResult,
    pub new_result: TaxResult,
    /// `original final tax - new final tax`; positive means tax saved.
    pub delta: Money,
    /// Ids whose patch was merged, in selection order.
    pub applied_recommendations: Vec<String>,
    /// Unknown ids, ids without a patch, and ids whose patch was rejected.
    pub ignored_ids: Vec<String>,
}

/// Recompute the return with the patches of the selected recommendations
/// merged onto a copy of `profile` in selection order. Later patches win
/// on conflicting fields. Unresolvable ids are ignored.
pub fn evaluate_what_if(
    pipeline: &TaxPipeline,
    profile: &TaxProfile,
    recommendations: &[Recommendation],
    selected_ids: &[String],
) -> ComputationOutput<WhatIfResult> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let mut patched = profile.clone();
    let mut applied = Vec::new();
    let mut ignored = Vec::new();

    for id in selected_ids {
        let patch = recommendations
            .iter()
            .find(|r| &r.id == id)
            .and_then(|r| r.override_patch.as_ref());
        let Some(patch) = patch else {
            ignored.push(id.clone());
            continue;
        };
        match patched.apply_patch(patch) {
            Ok(next) => {
                patched = next;
                applied.push(id.clone());
            }
            Err(e) => {
                let rejected = TaxOptimizerError::PatchRejected {
                    id: id.clone(),
                    reason: e.to_string(),
                };
                warn!(error = %rejected, "what-if patch skipped");
                warnings.push(rejected.to_string());
                ignored.push(id.clone());
            }
        }
    }

    let original_result = pipeline.compute(profile);
    let new_result = if applied.is_empty() {
        original_result.clone()
    } else {
        pipeline.compute(&patched)
    };
    let delta = original_result.final_tax - new_result.final_tax;

    let assumptions = serde_json::json!({
        "selected": selected_ids,
        "merge": "json_merge_patch_last_write_wins",
    });
    let result = WhatIfResult {
        original_result,
        new_result,
        delta,
        applied_recommendations: applied,
        ignored_ids: ignored,
    };

    with_metadata(
        "Counterfactual recomputation with selected recommendation patches merged in order",
        &assumptions,
        warnings,
        start.elapsed().as_micros() as u64,
        result,
    )
}
