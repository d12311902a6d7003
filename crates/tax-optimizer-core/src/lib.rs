//! Federal income tax computation and savings analysis for one tax year.
//!
//! [`tax::TaxPipeline`] turns a [`profile::TaxProfile`] into a
//! [`tax::TaxResult`]. [`optimizer::OptimizationOrchestrator`] runs
//! registered analyzers over that result and ranks their recommendations;
//! [`optimizer::evaluate_what_if`] recomputes the return with selected
//! recommendations applied.

pub mod config;
pub mod error;
pub mod optimizer;
pub mod profile;
pub mod tax;
pub mod types;

#[cfg(feature = "analyzers")]
pub mod analyzers;

pub use error::TaxOptimizerError;
pub use types::*;

/// Standard result type for all tax-optimizer operations
pub type TaxOptimizerResult<T> = Result<T, TaxOptimizerError>;
