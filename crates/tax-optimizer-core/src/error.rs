use thiserror::Error;

#[derive(Debug, Error)]
pub enum TaxOptimizerError {
    #[error("Invalid input: {field} — {reason}")]
    InvalidInput { field: String, reason: String },

    #[error("Invalid tax-year configuration: {field} — {reason}")]
    InvalidConfig { field: String, reason: String },

    #[error("Analyzer '{analyzer}' failed: {reason}")]
    AnalyzerFailure { analyzer: String, reason: String },

    #[error("Override patch for recommendation '{id}' rejected: {reason}")]
    PatchRejected { id: String, reason: String },

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl From<serde_json::Error> for TaxOptimizerError {
    fn from(e: serde_json::Error) -> Self {
        TaxOptimizerError::SerializationError(e.to_string())
    }
}
