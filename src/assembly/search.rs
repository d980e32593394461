//! Windowed search back through race history

use crate::data::{HistoryIndex, ResultSource};
use crate::features::{FeatureSelector, FeatureVector, SimilarityPredicate};
use crate::{Result, SubjectId};

/// Comparable races a search may find unusable before giving up
pub const DEFAULT_SCAN_BUDGET: usize = 20;

/// Outcome of one history search
#[derive(Debug, Clone, PartialEq)]
pub enum SearchResult {
    /// The nearest earlier comparable race with usable features
    Found {
        position: usize,
        features: FeatureVector,
    },
    /// No usable race; `position` is the last one examined
    Exhausted { position: usize },
}

/// Searches the index for an athlete's comparable past races
pub struct HistorySearch<'a> {
    index: &'a HistoryIndex,
    results: &'a dyn ResultSource,
    budget: usize,
}

impl<'a> HistorySearch<'a> {
    pub fn new(index: &'a HistoryIndex, results: &'a dyn ResultSource) -> Self {
        Self::with_budget(index, results, DEFAULT_SCAN_BUDGET)
    }

    /// `budget` must be at least 1; `collect` rejects a zero budget
    pub fn with_budget(
        index: &'a HistoryIndex,
        results: &'a dyn ResultSource,
        budget: usize,
    ) -> Self {
        HistorySearch {
            index,
            results,
            budget,
        }
    }

    /// Scan `from, from + 1, ...` for the first race that has the same gender
    /// as the race at `current`, passes `predicate`, and gives `subject` a
    /// feature vector. Each comparable race without a vector spends one unit
    /// of the scan budget.
    pub fn next_features(
        &self,
        current: usize,
        from: usize,
        subject: &SubjectId,
        predicate: &dyn SimilarityPredicate,
        selector: &dyn FeatureSelector,
    ) -> Result<SearchResult> {
        let current_entry = &self.index[current];
        let mut remaining = self.budget;

        for (position, candidate) in self.index.iter().enumerate().skip(from) {
            if candidate.gender != current_entry.gender
                || !predicate.similar(current_entry, candidate)
            {
                continue;
            }

            let table = self.results.table(&candidate.result_ref)?;
            let features = table
                .get(subject)
                .and_then(|outcome| selector.select(candidate, outcome));
            if let Some(features) = features {
                return Ok(SearchResult::Found { position, features });
            }

            remaining = remaining.saturating_sub(1);
            if remaining == 0 {
                return Ok(SearchResult::Exhausted { position });
            }
        }

        Ok(SearchResult::Exhausted {
            position: self.index.len().saturating_sub(1),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::HistoryIndex;
    use crate::features::{FeatureConfig, OutcomeFeature, Similarity};
    use crate::testing::{race, ranks, results_for, uniform_history};
    use crate::{EventType, Gender, Outcome};

    fn rank_selector() -> impl FeatureSelector {
        FeatureConfig::outcome(OutcomeFeature::Rank).selector()
    }

    #[test]
    fn test_finds_next_race_after_cursor() {
        let index = uniform_history(6);
        let results = results_for("A", &ranks(&[1, 2, 3, 4, 5, 6]));
        let search = HistorySearch::new(&index, &results);
        let subject = SubjectId::from("A");

        let found = search
            .next_features(0, 1, &subject, &Similarity::Any, &rank_selector())
            .unwrap();
        assert_eq!(
            found,
            SearchResult::Found {
                position: 1,
                features: vec![2.0]
            }
        );

        let found = search
            .next_features(0, 4, &subject, &Similarity::Any, &rank_selector())
            .unwrap();
        assert_eq!(
            found,
            SearchResult::Found {
                position: 4,
                features: vec![5.0]
            }
        );
    }

    #[test]
    fn test_skips_other_gender_and_dissimilar_races() {
        let mut entries = vec![race(0, 100), race(1, 99), race(2, 98), race(3, 97)];
        entries[1].gender = Gender::Female;
        entries[2].event_type = EventType::Mass;
        let index = HistoryIndex::new(entries).unwrap();
        let results = results_for("A", &ranks(&[1, 2, 3, 4]));
        let search = HistorySearch::new(&index, &results);

        let found = search
            .next_features(0, 1, &"A".into(), &Similarity::SameType, &rank_selector())
            .unwrap();
        assert_eq!(
            found,
            SearchResult::Found {
                position: 3,
                features: vec![4.0]
            }
        );
    }

    #[test]
    fn test_never_returns_before_cursor() {
        let index = uniform_history(8);
        let results = results_for("A", &ranks(&[1, 2, 3, 4, 5, 6, 7, 8]));
        let search = HistorySearch::new(&index, &results);

        let mut cursor = 1;
        let mut seen = Vec::new();
        while let SearchResult::Found { position, .. } = search
            .next_features(0, cursor, &"A".into(), &Similarity::Any, &rank_selector())
            .unwrap()
        {
            assert!(position >= cursor);
            seen.push(position);
            cursor = position + 1;
        }
        assert_eq!(seen, vec![1, 2, 3, 4, 5, 6, 7]);
    }

    #[test]
    fn test_budget_counts_comparable_races_without_features() {
        let index = uniform_history(6);
        // Athlete missing from races 1..=3, present again in 4
        let mut outcomes = vec![Some(Outcome::Rank(1)), None, None, None];
        outcomes.push(Some(Outcome::Rank(9)));
        outcomes.push(Some(Outcome::Rank(9)));
        let results = results_for("A", &outcomes);

        let tight = HistorySearch::with_budget(&index, &results, 3);
        assert_eq!(
            tight
                .next_features(0, 1, &"A".into(), &Similarity::Any, &rank_selector())
                .unwrap(),
            SearchResult::Exhausted { position: 3 }
        );

        let loose = HistorySearch::with_budget(&index, &results, 4);
        assert!(matches!(
            loose
                .next_features(0, 1, &"A".into(), &Similarity::Any, &rank_selector())
                .unwrap(),
            SearchResult::Found { position: 4, .. }
        ));
    }

    #[test]
    fn test_dissimilar_races_do_not_spend_budget() {
        let mut entries: Vec<_> = (0..7).map(|i| race(i, 100 - i)).collect();
        for i in [1, 2, 4] {
            entries[i].event_type = EventType::Mass;
        }
        entries[3].gender = Gender::Female;
        let index = HistoryIndex::new(entries).unwrap();
        // Athlete absent from races 1-5; only race 5 is comparable to race 0
        let mut outcomes = vec![Some(Outcome::Rank(1)), None, None, None, None, None];
        outcomes.push(Some(Outcome::Rank(7)));
        let results = results_for("A", &outcomes);
        let search = HistorySearch::with_budget(&index, &results, 2);

        assert_eq!(
            search
                .next_features(0, 1, &"A".into(), &Similarity::SameType, &rank_selector())
                .unwrap(),
            SearchResult::Found {
                position: 6,
                features: vec![7.0]
            }
        );

        // With a budget of one, race 5 alone exhausts the search
        let tight = HistorySearch::with_budget(&index, &results, 1);
        assert_eq!(
            tight
                .next_features(0, 1, &"A".into(), &Similarity::SameType, &rank_selector())
                .unwrap(),
            SearchResult::Exhausted { position: 5 }
        );
    }

    #[test]
    fn test_absent_feature_counts_against_budget() {
        let index = uniform_history(3);
        let results = results_for("A", &ranks(&[1, 2, 3]));
        let search = HistorySearch::with_budget(&index, &results, 1);
        let selector = FeatureConfig::outcome(OutcomeFeature::PercentBack).selector();

        assert_eq!(
            search
                .next_features(0, 1, &"A".into(), &Similarity::Any, &selector)
                .unwrap(),
            SearchResult::Exhausted { position: 1 }
        );
    }

    #[test]
    fn test_running_off_the_end() {
        let index = uniform_history(3);
        let results = results_for("A", &ranks(&[1, 2, 3]));
        let search = HistorySearch::new(&index, &results);

        assert_eq!(
            search
                .next_features(0, 3, &"A".into(), &Similarity::Any, &rank_selector())
                .unwrap(),
            SearchResult::Exhausted { position: 2 }
        );
        assert_eq!(
            search
                .next_features(0, 10, &"A".into(), &Similarity::Any, &rank_selector())
                .unwrap(),
            SearchResult::Exhausted { position: 2 }
        );
    }

    #[test]
    fn test_missing_result_table_is_an_error() {
        let index = uniform_history(3);
        let results = results_for("A", &ranks(&[1]));
        let search = HistorySearch::new(&index, &results);
        assert!(search
            .next_features(0, 1, &"A".into(), &Similarity::Any, &rank_selector())
            .is_err());
    }
}
