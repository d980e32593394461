//! Assembly of one training row for one athlete's result

use super::collector::CategoryCollector;
use super::scheme::Scheme;
use super::search::HistorySearch;
use crate::features::{Composite, Lift, OutcomeFeature, OutcomeSelector, StrengthSelection};
use crate::{Outcome, Result, SubjectId};

/// Features of one example followed by its response
#[derive(Debug, Clone, PartialEq)]
pub struct TrainingRow {
    pub features: Vec<f64>,
    pub response: Vec<f64>,
}

impl TrainingRow {
    /// Features then response, as one matrix row
    pub fn values(&self) -> impl Iterator<Item = f64> + '_ {
        self.features.iter().chain(&self.response).copied()
    }

    pub fn len(&self) -> usize {
        self.features.len() + self.response.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Why an example produced no row
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    /// The result failed the scheme's outcome filter
    Ineligible,
    /// The response selector had no value for the result
    MissingResponse,
    /// History ran out before the category (by index) converged
    Exhausted { category: usize },
}

/// Result of assembling one example
#[derive(Debug, Clone, PartialEq)]
pub enum Assembly {
    Row { row: TrainingRow, evicted: usize },
    Rejected(Rejection),
}

/// Builds rows for a validated scheme
pub struct RowAssembler<'a> {
    search: HistorySearch<'a>,
    scheme: &'a Scheme,
    selector: Composite<StrengthSelection, Lift<OutcomeFeature>>,
    response: Lift<OutcomeFeature>,
}

impl<'a> RowAssembler<'a> {
    /// The scheme must already have passed `Scheme::validate`
    pub fn new(search: HistorySearch<'a>, scheme: &'a Scheme) -> Self {
        RowAssembler {
            search,
            scheme,
            selector: scheme.features.selector(),
            response: Lift(scheme.response),
        }
    }

    /// Build the row for `subject`'s `outcome` in the race at `position`
    pub fn assemble(
        &self,
        position: usize,
        subject: &SubjectId,
        outcome: &Outcome,
    ) -> Result<Assembly> {
        if !self.scheme.outcomes.accepts(outcome) {
            return Ok(Assembly::Rejected(Rejection::Ineligible));
        }
        let Some(response) = self.response.select(outcome) else {
            return Ok(Assembly::Rejected(Rejection::MissingResponse));
        };

        let collector = CategoryCollector::new(&self.search, &self.selector);
        let mut features = Vec::with_capacity(self.scheme.feature_width());
        let mut evicted = 0;
        for (i, category) in self.scheme.categories.iter().enumerate() {
            match collector.collect(category, position, subject)? {
                Some(window) => {
                    evicted += window.evicted;
                    features.extend(window.flatten());
                }
                None => return Ok(Assembly::Rejected(Rejection::Exhausted { category: i })),
            }
        }
        debug_assert_eq!(features.len(), self.scheme.feature_width());

        Ok(Assembly::Row {
            row: TrainingRow { features, response },
            evicted,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assembly::collector::Category;
    use crate::features::{
        EventFilter, FeatureConfig, OutcomeFilter, Similarity, Threshold, Thresholds,
    };
    use crate::testing::{ranks, results_for, uniform_history};

    fn rank_scheme(categories: Vec<Category>, response: OutcomeFeature) -> Scheme {
        Scheme {
            description: String::new(),
            events: EventFilter::Any,
            outcomes: OutcomeFilter::Any,
            categories,
            features: FeatureConfig::outcome(OutcomeFeature::Rank),
            response,
        }
    }

    #[test]
    fn test_row_concatenates_categories_then_response() {
        let index = uniform_history(6);
        let results = results_for("A", &ranks(&[1, 2, 3, 4, 5, 6]));
        let scheme = rank_scheme(
            vec![
                Category::new(Similarity::Any, 3),
                Category::new(Similarity::SameType, 2),
            ],
            OutcomeFeature::RankCategory,
        );
        let assembler = RowAssembler::new(HistorySearch::new(&index, &results), &scheme);

        let assembly = assembler
            .assemble(0, &"A".into(), &Outcome::Rank(1))
            .unwrap();
        let Assembly::Row { row, evicted } = assembly else {
            panic!("expected a row, got {assembly:?}");
        };
        assert_eq!(row.features, vec![2.0, 3.0, 4.0, 2.0, 3.0]);
        assert_eq!(row.response, vec![0.0]);
        assert_eq!(row.values().count(), 6);
        assert_eq!(evicted, 0);
    }

    #[test]
    fn test_missing_response_rejects_regardless_of_categories() {
        let index = uniform_history(6);
        let results = results_for("A", &ranks(&[1, 2, 3, 4, 5, 6]));
        let scheme = rank_scheme(
            vec![Category::new(Similarity::Any, 1)],
            OutcomeFeature::PercentBack,
        );
        let assembler = RowAssembler::new(HistorySearch::new(&index, &results), &scheme);

        assert_eq!(
            assembler
                .assemble(0, &"A".into(), &Outcome::Rank(1))
                .unwrap(),
            Assembly::Rejected(Rejection::MissingResponse)
        );
    }

    #[test]
    fn test_outcome_filter_rejects_first() {
        let index = uniform_history(2);
        let results = results_for("A", &ranks(&[40, 2]));
        let mut scheme = rank_scheme(
            vec![Category::new(Similarity::Any, 1)],
            OutcomeFeature::Rank,
        );
        scheme.outcomes = OutcomeFilter::Top { places: 30 };
        let assembler = RowAssembler::new(HistorySearch::new(&index, &results), &scheme);

        assert_eq!(
            assembler
                .assemble(0, &"A".into(), &Outcome::Rank(40))
                .unwrap(),
            Assembly::Rejected(Rejection::Ineligible)
        );
    }

    #[test]
    fn test_failing_category_rejects_whole_example() {
        let index = uniform_history(4);
        let results = results_for("A", &ranks(&[1, 2, 3, 4]));
        let scheme = rank_scheme(
            vec![
                Category::new(Similarity::Any, 2),
                Category::new(Similarity::Any, 4),
            ],
            OutcomeFeature::Rank,
        );
        let assembler = RowAssembler::new(HistorySearch::new(&index, &results), &scheme);

        assert_eq!(
            assembler
                .assemble(0, &"A".into(), &Outcome::Rank(1))
                .unwrap(),
            Assembly::Rejected(Rejection::Exhausted { category: 1 })
        );
    }

    #[test]
    fn test_bounded_category_reports_evictions() {
        let index = uniform_history(7);
        let results = results_for("A", &ranks(&[1, 4, 30, 5, 4, 5, 4]));
        let scheme = rank_scheme(
            vec![Category::new(Similarity::Any, 3).with_thresholds(Thresholds::Uniform(
                Threshold::Linear {
                    intercept: 1.0,
                    slope: 0.0,
                },
            ))],
            OutcomeFeature::Rank,
        );
        let assembler = RowAssembler::new(HistorySearch::new(&index, &results), &scheme);

        match assembler
            .assemble(0, &"A".into(), &Outcome::Rank(1))
            .unwrap()
        {
            Assembly::Row { row, evicted } => {
                assert_eq!(row.features, vec![4.0, 5.0, 4.0]);
                assert_eq!(evicted, 1);
            }
            other => panic!("expected a row, got {other:?}"),
        }
    }
}
