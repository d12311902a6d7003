//! Partial-profile overrides.
//!
//! A patch is a JSON merge patch over the camelCase profile document:
//! objects merge key by key, any other value replaces the target, and
//! `null` removes the key so the field falls back to its default.

use serde_json::{Map, Value};

use crate::error::TaxOptimizerError;
use crate::profile::TaxProfile;
use crate::TaxOptimizerResult;

/// Partial TaxProfile document.
pub type ProfilePatch = Value;

pub fn merge_patch(target: &mut Value, patch: &Value) {
    let Value::Object(patch_map) = patch else {
        *target = patch.clone();
        return;
    };
    if !target.is_object() {
        *target = Value::Object(Map::new());
    }
    if let Value::Object(target_map) = target {
        for (key, value) in patch_map {
            if value.is_null() {
                target_map.remove(key);
            } else {
                merge_patch(target_map.entry(key.clone()).or_insert(Value::Null), value);
            }
        }
    }
}

impl TaxProfile {
    /// A copy of this profile with `patch` merged in. `self` is untouched.
    pub fn apply_patch(&self, patch: &ProfilePatch) -> TaxOptimizerResult<TaxProfile> {
        if !patch.is_object() {
            return Err(TaxOptimizerError::InvalidInput {
                field: "patch".into(),
                reason: "Profile patch must be a JSON object".into(),
            });
        }
        let mut document = serde_json::to_value(self)?;
        merge_patch(&mut document, patch);
        Ok(serde_json::from_value(document)?)
    }

    /// Apply several patches in order; later patches win on conflicts.
    pub fn apply_patches<'a, I>(&self, patches: I) -> TaxOptimizerResult<TaxProfile>
    where
        I: IntoIterator<Item = &'a ProfilePatch>,
    {
        let mut document = serde_json::to_value(self)?;
        for patch in patches {
            merge_patch(&mut document, patch);
        }
        Ok(serde_json::from_value(document)?)
    }
}
