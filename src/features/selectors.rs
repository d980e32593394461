//! Feature and response selectors
//!
//! Pure functions from one race/result pair to a fixed-width numeric vector.
//! A selector answers `None` when the athlete has no usable value, which the
//! caller treats as a rejection rather than a default.

use serde::{Deserialize, Serialize};

use crate::{HistoryEntry, Outcome, STRENGTH_METRICS};

/// Numeric features taken from one race
pub type FeatureVector = Vec<f64>;

/// Upper rank bounds of the rank categories 0..=3; anything worse is 4
pub const RANK_CATEGORY_BOUNDS: [u32; 4] = [3, 8, 15, 30];

/// Map a rank onto its ordinal category
pub fn rank_category(rank: u32) -> u32 {
    RANK_CATEGORY_BOUNDS
        .iter()
        .position(|&bound| rank <= bound)
        .unwrap_or(RANK_CATEGORY_BOUNDS.len()) as u32
}

/// A single number derived from an outcome
pub trait ScalarSelector {
    fn value(&self, outcome: &Outcome) -> Option<f64>;
}

/// A vector derived from an outcome alone
pub trait OutcomeSelector {
    fn select(&self, outcome: &Outcome) -> Option<FeatureVector>;
    fn width(&self) -> usize;
}

/// A vector derived from the race itself, independent of any athlete
pub trait EntrySelector {
    fn select(&self, entry: &HistoryEntry) -> Option<FeatureVector>;
    fn width(&self) -> usize;
}

/// A vector for one athlete at one race
pub trait FeatureSelector {
    fn select(&self, entry: &HistoryEntry, outcome: &Outcome) -> Option<FeatureVector>;
    fn width(&self) -> usize;
}

/// Named outcome values usable as features or responses
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum OutcomeFeature {
    /// Finishing position
    Rank,
    /// Relative time behind the winner (absent for placing-only results)
    PercentBack,
    /// Rank bucketed by `RANK_CATEGORY_BOUNDS`
    RankCategory,
    /// 1.0 when the athlete finished within the first `places`
    Top { places: u32 },
}

impl ScalarSelector for OutcomeFeature {
    fn value(&self, outcome: &Outcome) -> Option<f64> {
        match *self {
            OutcomeFeature::Rank => Some(outcome.rank() as f64),
            OutcomeFeature::PercentBack => outcome.gap(),
            OutcomeFeature::RankCategory => Some(rank_category(outcome.rank()) as f64),
            OutcomeFeature::Top { places } => {
                Some(if outcome.rank() <= places { 1.0 } else { 0.0 })
            }
        }
    }
}

/// Lifts a scalar selector into a one-element vector selector
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Lift<S>(pub S);

impl<S: ScalarSelector> OutcomeSelector for Lift<S> {
    fn select(&self, outcome: &Outcome) -> Option<FeatureVector> {
        self.0.value(outcome).map(|v| vec![v])
    }

    fn width(&self) -> usize {
        1
    }
}

/// One of the precomputed field-strength averages of a race
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrengthMetric {
    Best1,
    Best5,
    Best15,
    Best30,
}

impl StrengthMetric {
    pub fn index(&self) -> usize {
        match self {
            StrengthMetric::Best1 => 0,
            StrengthMetric::Best5 => 1,
            StrengthMetric::Best15 => 2,
            StrengthMetric::Best30 => 3,
        }
    }
}

/// Picks strength metrics of a race, in the listed order
#[derive(Debug, Clone, PartialEq)]
pub struct StrengthSelection(pub Vec<StrengthMetric>);

impl EntrySelector for StrengthSelection {
    fn select(&self, entry: &HistoryEntry) -> Option<FeatureVector> {
        debug_assert!(self.0.iter().all(|m| m.index() < STRENGTH_METRICS));
        Some(self.0.iter().map(|m| entry.strength[m.index()]).collect())
    }

    fn width(&self) -> usize {
        self.0.len()
    }
}

/// Race-level features followed by outcome-level features. Either half may
/// be missing; if any present half is absent the whole vector is absent.
#[derive(Debug, Clone, PartialEq)]
pub struct Composite<E, O> {
    pub entry: Option<E>,
    pub outcome: Option<O>,
}

impl<E: EntrySelector, O: OutcomeSelector> FeatureSelector for Composite<E, O> {
    fn select(&self, entry: &HistoryEntry, outcome: &Outcome) -> Option<FeatureVector> {
        let mut features = Vec::with_capacity(self.width());
        if let Some(selector) = &self.entry {
            features.extend(selector.select(entry)?);
        }
        if let Some(selector) = &self.outcome {
            features.extend(selector.select(outcome)?);
        }
        Some(features)
    }

    fn width(&self) -> usize {
        self.entry.as_ref().map_or(0, |e| e.width()) + self.outcome.as_ref().map_or(0, |o| o.width())
    }
}

/// Serializable description of a feature selector
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureConfig {
    /// Race strength metrics to include
    #[serde(default)]
    pub metrics: Vec<StrengthMetric>,
    /// Outcome value to include
    pub outcome: Option<OutcomeFeature>,
}

impl FeatureConfig {
    /// Just one outcome value
    pub fn outcome(feature: OutcomeFeature) -> Self {
        FeatureConfig {
            metrics: Vec::new(),
            outcome: Some(feature),
        }
    }

    pub fn selector(&self) -> Composite<StrengthSelection, Lift<OutcomeFeature>> {
        Composite {
            entry: (!self.metrics.is_empty()).then(|| StrengthSelection(self.metrics.clone())),
            outcome: self.outcome.map(Lift),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::race;

    #[test]
    fn test_rank_category_boundaries() {
        assert_eq!(rank_category(1), 0);
        assert_eq!(rank_category(3), 0);
        assert_eq!(rank_category(4), 1);
        assert_eq!(rank_category(8), 1);
        assert_eq!(rank_category(15), 2);
        assert_eq!(rank_category(16), 3);
        assert_eq!(rank_category(30), 3);
        assert_eq!(rank_category(31), 4);
        assert_eq!(rank_category(120), 4);
    }

    #[test]
    fn test_outcome_features() {
        let timed = Outcome::Timed(12, 0.034);
        let placed = Outcome::Rank(2);

        assert_eq!(OutcomeFeature::Rank.value(&timed), Some(12.0));
        assert_eq!(OutcomeFeature::PercentBack.value(&timed), Some(0.034));
        assert_eq!(OutcomeFeature::PercentBack.value(&placed), None);
        assert_eq!(OutcomeFeature::RankCategory.value(&timed), Some(2.0));
        assert_eq!(OutcomeFeature::Top { places: 10 }.value(&timed), Some(0.0));
        assert_eq!(OutcomeFeature::Top { places: 10 }.value(&placed), Some(1.0));
    }

    #[test]
    fn test_lift_wraps_and_preserves_absence() {
        let lifted = Lift(OutcomeFeature::PercentBack);
        assert_eq!(lifted.width(), 1);
        assert_eq!(lifted.select(&Outcome::Timed(1, 0.0)), Some(vec![0.0]));
        assert_eq!(lifted.select(&Outcome::Rank(1)), None);
    }

    #[test]
    fn test_composite_concatenates_entry_then_outcome() {
        let config = FeatureConfig {
            metrics: vec![StrengthMetric::Best15, StrengthMetric::Best1],
            outcome: Some(OutcomeFeature::PercentBack),
        };
        let selector = config.selector();
        assert_eq!(selector.width(), 3);

        let entry = race(1, 100);
        assert_eq!(
            selector.select(&entry, &Outcome::Timed(5, 0.02)),
            Some(vec![12.0, 0.0, 0.02])
        );
        // The outcome half is absent, so the whole vector is
        assert_eq!(selector.select(&entry, &Outcome::Rank(5)), None);
    }

    #[test]
    fn test_composite_outcome_only() {
        let selector = FeatureConfig::outcome(OutcomeFeature::Rank).selector();
        assert!(selector.entry.is_none());
        assert_eq!(selector.width(), 1);
        assert_eq!(
            selector.select(&race(1, 100), &Outcome::Rank(7)),
            Some(vec![7.0])
        );
    }

    #[test]
    fn test_feature_config_from_toml() {
        let config: FeatureConfig =
            toml::from_str("metrics = [\"best15\"]\noutcome = { kind = \"top\", places = 30 }\n")
                .unwrap();
        assert_eq!(config.metrics, vec![StrengthMetric::Best15]);
        assert_eq!(config.outcome, Some(OutcomeFeature::Top { places: 30 }));
    }
}
