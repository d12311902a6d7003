use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// All monetary values. Wraps Decimal to prevent accidental f64 usage.
pub type Money = Decimal;

/// Rates expressed as decimals (0.05 = 5%). Never as percentages.
pub type Rate = Decimal;

/// Filing status for one return.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FilingStatus {
    #[default]
    Single,
    Married,
    MarriedSeparate,
    Head,
    Widow,
}

impl FilingStatus {
    pub const ALL: [FilingStatus; 5] = [
        FilingStatus::Single,
        FilingStatus::Married,
        FilingStatus::MarriedSeparate,
        FilingStatus::Head,
        FilingStatus::Widow,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            FilingStatus::Single => "single",
            FilingStatus::Married => "married",
            FilingStatus::MarriedSeparate => "marriedSeparate",
            FilingStatus::Head => "head",
            FilingStatus::Widow => "widow",
        }
    }
}

/// One value per filing status, as published in a year's tables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ByFilingStatus<T> {
    pub single: T,
    pub married: T,
    pub married_separate: T,
    pub head: T,
    pub widow: T,
}

impl<T> ByFilingStatus<T> {
    pub fn get(&self, status: FilingStatus) -> &T {
        match status {
            FilingStatus::Single => &self.single,
            FilingStatus::Married => &self.married,
            FilingStatus::MarriedSeparate => &self.married_separate,
            FilingStatus::Head => &self.head,
            FilingStatus::Widow => &self.widow,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (FilingStatus, &T)> {
        FilingStatus::ALL.into_iter().map(move |s| (s, self.get(s)))
    }
}

impl<T: Clone> ByFilingStatus<T> {
    /// Single/separate/head share `other`; married and widow share `joint`.
    pub fn joint_split(other: T, joint: T) -> Self {
        ByFilingStatus {
            single: other.clone(),
            married: joint.clone(),
            married_separate: other.clone(),
            head: other,
            widow: joint,
        }
    }
}

/// Standard computation output envelope
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputationOutput<T: Serialize> {
    pub result: T,
    pub methodology: String,
    pub assumptions: serde_json::Value,
    pub warnings: Vec<String>,
    pub metadata: ComputationMetadata,
}

/// Metadata for every computation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputationMetadata {
    pub version: String,
    pub computation_time_us: u64,
    pub precision: String,
}

/// Helper to wrap computation results with metadata
pub fn with_metadata<T: Serialize>(
    methodology: &str,
    assumptions: &impl Serialize,
    warnings: Vec<String>,
    elapsed_us: u64,
    result: T,
) -> ComputationOutput<T> {
    ComputationOutput {
        result,
        methodology: methodology.to_string(),
        assumptions: serde_json::to_value(assumptions).unwrap_or_default(),
        warnings,
        metadata: ComputationMetadata {
            version: env!("CARGO_PKG_VERSION").to_string(),
            computation_time_us: elapsed_us,
            precision: "rust_decimal_128bit".to_string(),
        },
    }
}
