//! Outlier-robust collection of a category's feature window
//!
//! Fills a window of N comparable past races, then repeatedly evicts the most
//! extreme vector of every column whose spread exceeds its tolerance and
//! refills from older history, until the window is stable or history runs out.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use super::search::{HistorySearch, SearchResult};
use crate::features::{FeatureSelector, FeatureVector, Similarity, Thresholds};
use crate::{NordicError, Result, SubjectId};

/// A comparison category contributing one block of a training row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    pub similarity: Similarity,
    /// Number of past races in the window
    pub window: usize,
    #[serde(default)]
    pub thresholds: Thresholds,
}

impl Category {
    pub fn new(similarity: Similarity, window: usize) -> Self {
        Category {
            similarity,
            window,
            thresholds: Thresholds::Unbounded,
        }
    }

    pub fn with_thresholds(mut self, thresholds: Thresholds) -> Self {
        self.thresholds = thresholds;
        self
    }

    pub fn validate(&self, width: usize) -> Result<()> {
        if self.window == 0 {
            return Err(NordicError::Config(format!(
                "{:?} category needs a window of at least one race",
                self.similarity
            )));
        }
        self.thresholds.validate(width)
    }
}

/// Per-column mean and population standard deviation of a window
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnStats {
    pub mean: Vec<f64>,
    pub std: Vec<f64>,
}

impl ColumnStats {
    pub fn of(vectors: &[FeatureVector]) -> Self {
        let width = vectors.first().map_or(0, |v| v.len());
        let n = vectors.len().max(1) as f64;

        let mut mean = vec![0.0; width];
        for v in vectors {
            for (m, x) in mean.iter_mut().zip(v) {
                *m += x;
            }
        }
        mean.iter_mut().for_each(|m| *m /= n);

        let mut std = vec![0.0; width];
        for v in vectors {
            for ((s, x), m) in std.iter_mut().zip(v).zip(&mean) {
                *s += (x - m).powi(2);
            }
        }
        std.iter_mut().for_each(|s| *s = (*s / n).sqrt());

        ColumnStats { mean, std }
    }

    /// Columns whose spread exceeds their tolerance. Windows of fewer than two
    /// vectors and columns with no spread always pass.
    pub fn failing_columns(&self, thresholds: &Thresholds, count: usize) -> Vec<usize> {
        if count < 2 {
            return Vec::new();
        }
        self.std
            .iter()
            .zip(&self.mean)
            .enumerate()
            .filter(|&(column, (&std, &mean))| std > 0.0 && std > thresholds.limit(column, mean))
            .map(|(column, _)| column)
            .collect()
    }
}

/// Rows to evict: for each failing column, the vector furthest from that
/// column's mean (the first one on ties). A vector nominated by several
/// columns is evicted once.
pub fn eviction_set(vectors: &[FeatureVector], stats: &ColumnStats, failing: &[usize]) -> BTreeSet<usize> {
    failing
        .iter()
        .filter_map(|&column| {
            let mean = stats.mean[column];
            vectors
                .iter()
                .enumerate()
                .fold(None, |best: Option<(usize, f64)>, (row, v)| {
                    let deviation = (v[column] - mean).abs();
                    match best {
                        Some((_, d)) if d >= deviation => best,
                        _ => Some((row, deviation)),
                    }
                })
                .map(|(row, _)| row)
        })
        .collect()
}

/// A converged window
#[derive(Debug, Clone, PartialEq)]
pub struct Window {
    /// Feature vectors, oldest refills last
    pub vectors: Vec<FeatureVector>,
    /// Vectors evicted on the way
    pub evicted: usize,
}

impl Window {
    pub fn flatten(&self) -> impl Iterator<Item = f64> + '_ {
        self.vectors.iter().flatten().copied()
    }
}

/// Fills category windows for one athlete
pub struct CategoryCollector<'a> {
    search: &'a HistorySearch<'a>,
    selector: &'a dyn FeatureSelector,
}

impl<'a> CategoryCollector<'a> {
    pub fn new(search: &'a HistorySearch<'a>, selector: &'a dyn FeatureSelector) -> Self {
        CategoryCollector { search, selector }
    }

    /// Collect `category.window` mutually consistent vectors from races
    /// before `current`, or `None` when history runs out first
    pub fn collect(
        &self,
        category: &Category,
        current: usize,
        subject: &SubjectId,
    ) -> Result<Option<Window>> {
        let mut vectors: Vec<FeatureVector> = Vec::with_capacity(category.window);
        let mut cursor = current + 1;
        let mut evicted = 0;

        loop {
            while vectors.len() < category.window {
                match self.search.next_features(
                    current,
                    cursor,
                    subject,
                    &category.similarity,
                    self.selector,
                )? {
                    SearchResult::Found { position, features } => {
                        vectors.push(features);
                        cursor = position + 1;
                    }
                    SearchResult::Exhausted { .. } => return Ok(None),
                }
            }

            if category.thresholds.is_unbounded() {
                return Ok(Some(Window { vectors, evicted }));
            }

            let stats = ColumnStats::of(&vectors);
            let failing = stats.failing_columns(&category.thresholds, vectors.len());
            if failing.is_empty() {
                return Ok(Some(Window { vectors, evicted }));
            }

            let evict = eviction_set(&vectors, &stats, &failing);
            log::debug!(
                "{}: evicting {} of {} vectors (columns {:?} too spread)",
                subject,
                evict.len(),
                vectors.len(),
                failing
            );
            evicted += evict.len();
            for &row in evict.iter().rev() {
                vectors.remove(row);
            }
        }
    }
}
