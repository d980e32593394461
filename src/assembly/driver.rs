//! Collection over a whole history index

use super::row::{Assembly, Rejection, RowAssembler, TrainingRow};
use super::scheme::Scheme;
use super::search::{HistorySearch, DEFAULT_SCAN_BUDGET};
use crate::data::{HistoryIndex, ResultSource};
use crate::matrix::Matrix;
use crate::{CollectionConfig, NordicError, Result};

/// Run-level knobs that are not part of a scheme
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CollectionOptions {
    /// Must be at least 1
    pub scan_budget: usize,
    /// Stop once this many rows have been emitted. `Some(0)` means no limit.
    pub limit: Option<usize>,
}

impl Default for CollectionOptions {
    fn default() -> Self {
        CollectionOptions {
            scan_budget: DEFAULT_SCAN_BUDGET,
            limit: None,
        }
    }
}

impl From<&CollectionConfig> for CollectionOptions {
    fn from(config: &CollectionConfig) -> Self {
        CollectionOptions {
            scan_budget: config.scan_budget,
            limit: config.limit,
        }
    }
}

/// Examples rejected, by reason
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RejectionCounts {
    pub ineligible: usize,
    pub missing_response: usize,
    /// Exhausted examples, indexed by the category that ran out
    pub exhausted: Vec<usize>,
}

impl RejectionCounts {
    fn for_categories(count: usize) -> Self {
        RejectionCounts {
            exhausted: vec![0; count],
            ..Default::default()
        }
    }

    fn record(&mut self, rejection: Rejection) {
        match rejection {
            Rejection::Ineligible => self.ineligible += 1,
            Rejection::MissingResponse => self.missing_response += 1,
            Rejection::Exhausted { category } => self.exhausted[category] += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.ineligible + self.missing_response + self.exhausted.iter().sum::<usize>()
    }
}

/// Rows collected by one run, with the statistics of how they were found
#[derive(Debug, Clone, PartialEq)]
pub struct CollectionReport {
    pub rows: Vec<TrainingRow>,
    pub feature_width: usize,
    pub response_width: usize,
    /// Results looked at
    pub examined: usize,
    pub rejections: RejectionCounts,
    /// Vectors evicted across all emitted rows
    pub evictions: usize,
}

impl CollectionReport {
    pub fn row_width(&self) -> usize {
        self.feature_width + self.response_width
    }

    /// Training matrix: features then response, one row per example
    pub fn to_matrix(&self) -> Result<Matrix> {
        let data = self.rows.iter().flat_map(TrainingRow::values).collect();
        Matrix::from_vec(self.rows.len(), self.row_width(), data)
    }
}

/// Assemble a training row for every eligible result in the index
pub fn collect(
    index: &HistoryIndex,
    results: &dyn ResultSource,
    scheme: &Scheme,
    options: CollectionOptions,
) -> Result<CollectionReport> {
    scheme.validate()?;
    if options.scan_budget == 0 {
        return Err(NordicError::Config(
            "scan budget must be at least 1".to_string(),
        ));
    }
    let limit = options.limit.filter(|&limit| limit > 0);

    let search = HistorySearch::with_budget(index, results, options.scan_budget);
    let assembler = RowAssembler::new(search, scheme);
    let mut report = CollectionReport {
        rows: Vec::new(),
        feature_width: scheme.feature_width(),
        response_width: scheme.response_width(),
        examined: 0,
        rejections: RejectionCounts::for_categories(scheme.categories.len()),
        evictions: 0,
    };

    log::info!(
        "Collecting over {} races ({} features + {} response per row)",
        index.len(),
        report.feature_width,
        report.response_width
    );

    'races: for (position, entry) in index.iter().enumerate() {
        if !scheme.events.accepts(entry) {
            continue;
        }
        let table = results.table(&entry.result_ref)?;
        let before = report.rows.len();

        for (subject, outcome) in table.iter() {
            if limit.is_some_and(|limit| report.rows.len() >= limit) {
                log::info!("Row limit reached at race {}", entry.id);
                break 'races;
            }
            report.examined += 1;
            match assembler.assemble(position, subject, outcome)? {
                Assembly::Row { row, evicted } => {
                    report.evictions += evicted;
                    report.rows.push(row);
                }
                Assembly::Rejected(rejection) => report.rejections.record(rejection),
            }
        }

        log::debug!(
            "{} ({} {}): {} rows from {} results",
            entry.id,
            entry.event_type.code(),
            entry.technique.code(),
            report.rows.len() - before,
            table.len()
        );
    }

    log::info!(
        "Collected {} rows from {} results ({} rejected, {} vectors evicted)",
        report.rows.len(),
        report.examined,
        report.rejections.total(),
        report.evictions
    );

    Ok(report)
}
