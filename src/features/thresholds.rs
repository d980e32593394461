//! Dispersion tolerances for feature windows
//!
//! A threshold maps a column's mean to the largest standard deviation the
//! column may show before its most extreme value is evicted.

use serde::{Deserialize, Serialize};

use crate::{NordicError, Result};

pub trait DispersionThreshold {
    /// Largest tolerated standard deviation for a column with this mean.
    /// `f64::INFINITY` never flags the column.
    fn max_std(&self, mean: f64) -> f64;
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Threshold {
    Unbounded,
    /// `intercept + slope * mean`
    Linear { intercept: f64, slope: f64 },
}

impl DispersionThreshold for Threshold {
    fn max_std(&self, mean: f64) -> f64 {
        match *self {
            Threshold::Unbounded => f64::INFINITY,
            Threshold::Linear { intercept, slope } => intercept + slope * mean,
        }
    }
}

/// Tolerances for every column of a category's feature vectors
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Thresholds {
    #[default]
    Unbounded,
    /// One threshold applied to every column
    Uniform(Threshold),
    /// One threshold per column, in feature order
    PerColumn(Vec<Threshold>),
}

impl Thresholds {
    /// Check the thresholds fit vectors of `width` columns
    pub fn validate(&self, width: usize) -> Result<()> {
        match self {
            Thresholds::PerColumn(columns) if columns.len() != width => {
                Err(NordicError::Config(format!(
                    "{} column thresholds given for {} feature columns",
                    columns.len(),
                    width
                )))
            }
            _ => Ok(()),
        }
    }

    /// Whether no column can ever fail
    pub fn is_unbounded(&self) -> bool {
        match self {
            Thresholds::Unbounded => true,
            Thresholds::Uniform(t) => *t == Threshold::Unbounded,
            Thresholds::PerColumn(columns) => columns.iter().all(|t| *t == Threshold::Unbounded),
        }
    }

    /// Tolerated standard deviation for `column` given its mean
    pub fn limit(&self, column: usize, mean: f64) -> f64 {
        match self {
            Thresholds::Unbounded => f64::INFINITY,
            Thresholds::Uniform(t) => t.max_std(mean),
            Thresholds::PerColumn(columns) => columns
                .get(column)
                .map_or(f64::INFINITY, |t| t.max_std(mean)),
        }
    }
}
