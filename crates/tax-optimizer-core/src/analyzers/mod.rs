//! Built-in analyzers.
//!
//! Each analyzer is a unit struct estimating savings by recomputing the
//! return with its proposed patch. Register them individually or take the
//! full set from [`default_registry`].

pub mod amt;
pub mod deductions;
pub mod ptet;
pub mod qbi;
pub mod retirement;
pub mod self_employment;

use crate::optimizer::AnalyzerRegistry;

pub use amt::AmtAnalyzer;
pub use deductions::DeductionsAnalyzer;
pub use ptet::PtetAnalyzer;
pub use qbi::QbiAnalyzer;
pub use retirement::RetirementAnalyzer;
pub use self_employment::SelfEmploymentAnalyzer;

/// Every built-in analyzer in a fixed registration order.
pub fn default_registry() -> AnalyzerRegistry {
    AnalyzerRegistry::new()
        .with(RetirementAnalyzer)
        .with(DeductionsAnalyzer)
        .with(SelfEmploymentAnalyzer)
        .with(QbiAnalyzer)
        .with(AmtAnalyzer)
        .with(PtetAnalyzer)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_registry_ids_unique() {
        let registry = default_registry();
        let mut ids: Vec<&str> = registry.analyzers().iter().map(|a| a.id()).collect();
        assert_eq!(ids.len(), 6);
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), 6);
    }
}
