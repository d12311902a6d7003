use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::tax::brackets::{bracket_tax, BracketTable};
use crate::types::{ByFilingStatus, FilingStatus, Money, Rate};
use crate::TaxOptimizerResult;

/// One state's schedule for one filing status.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StateTaxSchedule {
    pub brackets: BracketTable,
    #[serde(default)]
    pub standard_deduction: Money,
    /// Entity-level rate when the state offers a pass-through entity tax election.
    #[serde(default)]
    pub ptet_rate: Option<Rate>,
}

impl StateTaxSchedule {
    pub fn tax_on(&self, income: Money) -> Money {
        bracket_tax(income - self.standard_deduction, &self.brackets)
    }
}

/// State rate lookup consumed by state-aware analyzers.
pub trait StateTaxTables: Send + Sync {
    fn get(&self, state_code: &str, status: FilingStatus) -> Option<StateTaxSchedule>;
}

/// In-memory state tables keyed by upper-case state code.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StateTableSet {
    states: BTreeMap<String, ByFilingStatus<StateTaxSchedule>>,
}

impl StateTableSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_json_str(json: &str) -> TaxOptimizerResult<Self> {
        let parsed: BTreeMap<String, ByFilingStatus<StateTaxSchedule>> = serde_json::from_str(json)?;
        Ok(StateTableSet {
            states: parsed
                .into_iter()
                .map(|(code, tables)| (code.to_ascii_uppercase(), tables))
                .collect(),
        })
    }

    pub fn insert(&mut self, state_code: &str, schedules: ByFilingStatus<StateTaxSchedule>) {
        self.states.insert(state_code.to_ascii_uppercase(), schedules);
    }
}

impl StateTaxTables for StateTableSet {
    fn get(&self, state_code: &str, status: FilingStatus) -> Option<StateTaxSchedule> {
        self.states
            .get(&state_code.trim().to_ascii_uppercase())
            .map(|tables| tables.get(status).clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn flat(rate: Rate, ptet: Option<Rate>) -> StateTaxSchedule {
        StateTaxSchedule {
            brackets: BracketTable::from_pairs(&[(dec!(0), rate)]).unwrap(),
            standard_deduction: dec!(0),
            ptet_rate: ptet,
        }
    }

    #[test]
    fn test_lookup_is_case_insensitive() {
        let mut set = StateTableSet::new();
        let schedule = flat(dec!(0.05), Some(dec!(0.05)));
        set.insert("ca", ByFilingStatus::joint_split(schedule.clone(), schedule));
        let found = set.get(" CA ", FilingStatus::Married).unwrap();
        assert_eq!(found.ptet_rate, Some(dec!(0.05)));
        assert!(set.get("TX", FilingStatus::Single).is_none());
    }

    #[test]
    fn test_schedule_tax_applies_deduction() {
        let mut schedule = flat(dec!(0.05), None);
        schedule.standard_deduction = dec!(5_000);
        assert_eq!(schedule.tax_on(dec!(105_000)), dec!(5_000));
        assert_eq!(schedule.tax_on(dec!(1_000)), dec!(0));
    }

    #[test]
    fn test_from_json() {
        let one = r#"{"brackets": [{"floor": "0", "rate": "0.0495"}], "ptetRate": "0.0495"}"#;
        let json = format!(
            r#"{{"il": {{"single": {one}, "married": {one}, "marriedSeparate": {one}, "head": {one}, "widow": {one}}}}}"#
        );
        let set = StateTableSet::from_json_str(&json).unwrap();
        let s = set.get("IL", FilingStatus::Head).unwrap();
        assert_eq!(s.standard_deduction, dec!(0));
        assert_eq!(s.tax_on(dec!(100_000)), dec!(4_950));
    }
}
