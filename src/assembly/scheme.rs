//! Collection schemes: what to collect, from which races, against what target

use serde::{Deserialize, Serialize};

use super::collector::Category;
use crate::features::{
    EventFilter, FeatureConfig, FeatureSelector, OutcomeFeature, OutcomeFilter, Similarity,
    StrengthMetric, Threshold, Thresholds,
};
use crate::{NordicError, Result};

/// Full description of one way of turning race history into training rows
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scheme {
    #[serde(default)]
    pub description: String,
    /// Races whose results become examples
    #[serde(default)]
    pub events: EventFilter,
    /// Results within those races that become examples
    #[serde(default)]
    pub outcomes: OutcomeFilter,
    /// Feature blocks, in row order
    pub categories: Vec<Category>,
    /// Features taken from each past race
    pub features: FeatureConfig,
    /// Target value
    pub response: OutcomeFeature,
}

impl Scheme {
    /// Reject configurations that cannot produce well-formed rows
    pub fn validate(&self) -> Result<()> {
        if self.categories.is_empty() {
            return Err(NordicError::Config("scheme has no categories".to_string()));
        }
        let width = self.features.selector().width();
        if width == 0 {
            return Err(NordicError::Config(
                "scheme selects no features from past races".to_string(),
            ));
        }
        for category in &self.categories {
            category.validate(width)?;
        }
        Ok(())
    }

    /// Values per past race
    pub fn vector_width(&self) -> usize {
        self.features.selector().width()
    }

    /// Feature columns per row
    pub fn feature_width(&self) -> usize {
        self.vector_width() * self.categories.iter().map(|c| c.window).sum::<usize>()
    }

    /// Response columns per row
    pub fn response_width(&self) -> usize {
        1
    }
}

/// Names of the built-in schemes
pub const BUILTIN_SCHEMES: [&str; 6] = [
    "distance-top10",
    "individual-percent-back",
    "individual-percent-back-fis",
    "individual-percent-back-filtered",
    "all-rank-category",
    "distance-rank-category",
];

/// Look up a built-in scheme by name
pub fn builtin(name: &str) -> Option<Scheme> {
    let scheme = match name {
        "distance-top10" => {
            let thresholds = Thresholds::Uniform(Threshold::Linear {
                intercept: 12.0,
                slope: 0.1,
            });
            Scheme {
                description: "Top-10 finish of top-30 finishers from the last two ranks in \
                              the discipline and in the same format and technique"
                    .to_string(),
                events: EventFilter::Distance,
                outcomes: OutcomeFilter::Top { places: 30 },
                categories: vec![
                    Category::new(Similarity::SameDiscipline, 2).with_thresholds(thresholds.clone()),
                    Category::new(Similarity::SameTypeAndTechnique, 2).with_thresholds(thresholds),
                ],
                features: FeatureConfig::outcome(OutcomeFeature::Rank),
                response: OutcomeFeature::Top { places: 10 },
            }
        }
        "individual-percent-back" => Scheme {
            description: "Time behind the winner from the last five individual races and \
                          the last five of the same technique"
                .to_string(),
            events: EventFilter::Individual,
            outcomes: OutcomeFilter::Any,
            categories: percent_back_categories(Thresholds::Unbounded),
            features: FeatureConfig::outcome(OutcomeFeature::PercentBack),
            response: OutcomeFeature::PercentBack,
        },
        "individual-percent-back-fis" => Scheme {
            description: "Time behind the winner with the field's best-15 FIS points".to_string(),
            events: EventFilter::Individual,
            outcomes: OutcomeFilter::Any,
            categories: percent_back_categories(Thresholds::Unbounded),
            features: field_strength_and_percent_back(),
            response: OutcomeFeature::PercentBack,
        },
        "individual-percent-back-filtered" => Scheme {
            description: "Time behind the winner with field strength, outliers removed"
                .to_string(),
            events: EventFilter::Individual,
            outcomes: OutcomeFilter::Any,
            categories: percent_back_categories(Thresholds::PerColumn(vec![
                Threshold::Linear {
                    intercept: 5.0,
                    slope: 0.0,
                },
                Threshold::Linear {
                    intercept: 0.05,
                    slope: 0.5,
                },
            ])),
            features: field_strength_and_percent_back(),
            response: OutcomeFeature::PercentBack,
        },
        "all-rank-category" => Scheme {
            description: "Rank category from the last rank in the discipline, format, \
                          technique, and format with technique"
                .to_string(),
            events: EventFilter::Any,
            outcomes: OutcomeFilter::Any,
            categories: rank_categories([1, 1, 1, 1]),
            features: FeatureConfig::outcome(OutcomeFeature::Rank),
            response: OutcomeFeature::RankCategory,
        },
        "distance-rank-category" => Scheme {
            description: "Rank category of distance races from recent ranks".to_string(),
            events: EventFilter::Distance,
            outcomes: OutcomeFilter::Any,
            categories: rank_categories([2, 2, 2, 5]),
            features: FeatureConfig::outcome(OutcomeFeature::Rank),
            response: OutcomeFeature::RankCategory,
        },
        _ => return None,
    };
    Some(scheme)
}

fn percent_back_categories(thresholds: Thresholds) -> Vec<Category> {
    vec![
        Category::new(Similarity::SameType, 5).with_thresholds(thresholds.clone()),
        Category::new(Similarity::SameTypeAndTechnique, 5).with_thresholds(thresholds),
    ]
}

fn field_strength_and_percent_back() -> FeatureConfig {
    FeatureConfig {
        metrics: vec![StrengthMetric::Best15],
        outcome: Some(OutcomeFeature::PercentBack),
    }
}

fn rank_categories(windows: [usize; 4]) -> Vec<Category> {
    [
        Similarity::SameDiscipline,
        Similarity::SameType,
        Similarity::SameTechnique,
        Similarity::SameTypeAndTechnique,
    ]
    .into_iter()
    .zip(windows)
    .map(|(similarity, window)| Category::new(similarity, window))
    .collect()
}
