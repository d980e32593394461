//! Feature extraction units
//!
//! Selectors, similarity predicates, eligibility filters and dispersion
//! thresholds. Each is a small named unit behind a narrow trait, composed into
//! collection schemes.

pub mod eligibility;
pub mod selectors;
pub mod similarity;
pub mod thresholds;

pub use eligibility::{EventFilter, OutcomeFilter};
pub use selectors::{
    rank_category, Composite, EntrySelector, FeatureConfig, FeatureSelector, FeatureVector, Lift,
    OutcomeFeature, OutcomeSelector, ScalarSelector, StrengthMetric, StrengthSelection,
};
pub use similarity::{Similarity, SimilarityPredicate};
pub use thresholds::{DispersionThreshold, Threshold, Thresholds};
