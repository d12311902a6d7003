use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::TaxOptimizerResult;

/// Authority behind a recommendation. Content is owned by the caller.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Citation {
    pub irc_section: Option<String>,
    pub publication: Option<String>,
    pub form: Option<String>,
    pub regulation: Option<String>,
    pub url: Option<String>,
    pub description: Option<String>,
}

/// Keyed lookup of citations.
pub trait CitationLookup: Send + Sync {
    fn get(&self, key: &str) -> Option<Citation>;
}

/// In-memory citation table, loadable from a JSON object of key -> citation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CitationTable {
    entries: BTreeMap<String, Citation>,
}

impl CitationTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_json_str(json: &str) -> TaxOptimizerResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn insert(&mut self, key: impl Into<String>, citation: Citation) {
        self.entries.insert(key.into(), citation);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl CitationLookup for CitationTable {
    fn get(&self, key: &str) -> Option<Citation> {
        self.entries.get(key).cloned()
    }
}
