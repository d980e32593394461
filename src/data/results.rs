//! Result tables and the lookup contract the engine reads them through

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

use crate::{NordicError, Outcome, Result, SubjectId};

/// Every athlete's outcome in one race. Iterates in athlete-code order so
/// collection runs are reproducible.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResultTable {
    outcomes: BTreeMap<SubjectId, Outcome>,
}

impl ResultTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, subject: SubjectId, outcome: Outcome) {
        self.outcomes.insert(subject, outcome);
    }

    pub fn get(&self, subject: &SubjectId) -> Option<&Outcome> {
        self.outcomes.get(subject)
    }

    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&SubjectId, &Outcome)> {
        self.outcomes.iter()
    }
}

impl FromIterator<(SubjectId, Outcome)> for ResultTable {
    fn from_iter<I: IntoIterator<Item = (SubjectId, Outcome)>>(iter: I) -> Self {
        ResultTable {
            outcomes: iter.into_iter().collect(),
        }
    }
}

/// Read-only access to result tables by a race's result reference
pub trait ResultSource {
    fn table(&self, result_ref: &str) -> Result<&ResultTable>;
}

/// Result tables held in memory for one collection run
#[derive(Debug, Clone, Default)]
pub struct MemoryResults {
    tables: HashMap<String, ResultTable>,
}

impl MemoryResults {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, result_ref: impl Into<String>, table: ResultTable) {
        self.tables.insert(result_ref.into(), table);
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }
}

impl ResultSource for MemoryResults {
    fn table(&self, result_ref: &str) -> Result<&ResultTable> {
        self.tables
            .get(result_ref)
            .ok_or_else(|| NordicError::UnknownResults(result_ref.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_iterates_in_subject_order() {
        let table: ResultTable = [
            (SubjectId::from("3422819"), Outcome::Rank(2)),
            (SubjectId::from("1345875"), Outcome::Rank(1)),
            (SubjectId::from("3500015"), Outcome::Rank(3)),
        ]
        .into_iter()
        .collect();
        let codes: Vec<&str> = table.iter().map(|(s, _)| s.0.as_str()).collect();
        assert_eq!(codes, vec!["1345875", "3422819", "3500015"]);
    }

    #[test]
    fn test_table_parses_mixed_outcomes() {
        let table: ResultTable =
            serde_json::from_str(r#"{"1345875": [1, 0.0], "3422819": 4}"#).unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(
            table.get(&"1345875".into()),
            Some(&Outcome::Timed(1, 0.0))
        );
        assert_eq!(table.get(&"3422819".into()), Some(&Outcome::Rank(4)));
    }

    #[test]
    fn test_unknown_reference_is_an_error() {
        let results = MemoryResults::new();
        assert!(matches!(
            results.table("race1"),
            Err(NordicError::UnknownResults(r)) if r == "race1"
        ));
    }
}
