//! Import of JSON race indices and result files
//!
//! The index file is a JSON array of races, most recent first:
//! `[id, resultFile, category, day, location, type, technique, gender,
//! distance | null, [fis1, fis5, fis15, fis30]]`, with category, type,
//! technique and gender given as positions in their enum lists. Each result
//! file maps an athlete's FIS code to `rank`, `[rank]` or `[rank, gap]`.

use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::data::{Database, HistoryIndex, ResultTable};
use crate::{
    EventCategory, EventId, EventType, Gender, HistoryEntry, NordicError, Outcome, Result,
    SubjectId, Technique, DEFAULT_FIS_POINTS, STRENGTH_METRICS,
};

#[derive(Debug, Deserialize)]
struct IndexRow(
    i64,
    String,
    u8,
    i64,
    String,
    u8,
    u8,
    u8,
    Option<f64>,
    #[serde(default)] Option<Vec<f64>>,
);

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawOutcome {
    Rank(u32),
    Listed(Vec<f64>),
}

impl RawOutcome {
    /// Ranks start at 1 and gaps are never negative
    fn into_outcome(self) -> Option<Outcome> {
        match self {
            RawOutcome::Rank(rank) => (rank >= 1).then_some(Outcome::Rank(rank)),
            RawOutcome::Listed(values) => match values[..] {
                [rank] => listed_rank(rank).map(Outcome::Rank),
                [rank, gap] if gap.is_finite() && gap >= 0.0 => {
                    listed_rank(rank).map(|rank| Outcome::Timed(rank, gap))
                }
                _ => None,
            },
        }
    }
}

fn listed_rank(value: f64) -> Option<u32> {
    let whole = value.fract() == 0.0 && value >= 1.0 && value <= f64::from(u32::MAX);
    whole.then_some(value as u32)
}

/// Counts from one import run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportSummary {
    pub events: usize,
    pub results: usize,
    /// Index rows not imported (unknown codes or unreadable result files)
    pub skipped: usize,
}

impl IndexRow {
    fn into_entry(self, result_ref: String) -> Result<HistoryEntry> {
        let IndexRow(id, _, category, day, location, event_type, technique, gender, distance, fis) =
            self;
        let unknown = |what: &str, index: u8| {
            NordicError::Parse(format!("race {}: unknown {} index {}", id, what, index))
        };

        let mut strength = [DEFAULT_FIS_POINTS; STRENGTH_METRICS];
        for (slot, points) in strength.iter_mut().zip(fis.unwrap_or_default()) {
            *slot = points;
        }

        Ok(HistoryEntry {
            id: EventId(id),
            result_ref,
            category: EventCategory::from_index(category)
                .ok_or_else(|| unknown("category", category))?,
            day,
            location,
            event_type: EventType::from_index(event_type)
                .ok_or_else(|| unknown("race type", event_type))?,
            technique: Technique::from_index(technique)
                .ok_or_else(|| unknown("technique", technique))?,
            gender: Gender::from_index(gender).ok_or_else(|| unknown("gender", gender))?,
            // Whole kilometres; sprint distances are not used for comparison
            distance: distance.map(|km| km.round() as u32),
            strength,
        })
    }
}

/// Read a result file
pub fn read_results<P: AsRef<Path>>(path: P) -> Result<ResultTable> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path)?;
    let raw: BTreeMap<String, RawOutcome> = serde_json::from_str(&content)?;

    raw.into_iter()
        .map(|(code, raw)| {
            raw.into_outcome()
                .map(|outcome| (SubjectId(code.clone()), outcome))
                .ok_or_else(|| {
                    NordicError::Parse(format!("{}: malformed result for {}", path.display(), code))
                })
        })
        .collect()
}

/// Result reference for a result file: its file stem
fn result_ref_for(file: &str) -> String {
    Path::new(file)
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| file.to_string())
}

/// Read an index file and its result files, resolving result paths against
/// `base_dir`. Rows that cannot be read are skipped with a warning.
pub fn read_index<P: AsRef<Path>, B: AsRef<Path>>(
    index_path: P,
    base_dir: B,
) -> Result<(HistoryIndex, Vec<(String, ResultTable)>, usize)> {
    let content = std::fs::read_to_string(index_path.as_ref())?;
    let rows: Vec<IndexRow> = serde_json::from_str(&content)?;
    log::info!(
        "Read {} races from {}",
        rows.len(),
        index_path.as_ref().display()
    );

    let mut index = HistoryIndex::default();
    let mut tables = Vec::with_capacity(rows.len());
    let mut skipped = 0;

    for row in rows {
        let file: PathBuf = base_dir.as_ref().join(&row.1);
        let result_ref = result_ref_for(&row.1);
        let id = row.0;

        let entry = match row.into_entry(result_ref.clone()) {
            Ok(entry) => entry,
            Err(e) => {
                log::warn!("Skipping race {}: {}", id, e);
                skipped += 1;
                continue;
            }
        };
        let table = match read_results(&file) {
            Ok(table) => table,
            Err(e) => {
                log::warn!("Skipping race {} ({}): {}", id, file.display(), e);
                skipped += 1;
                continue;
            }
        };

        log::debug!("{}: {} results", entry.id, table.len());
        index.upsert(entry);
        tables.push((result_ref, table));
    }

    Ok((index, tables, skipped))
}

/// Import an index file and its result files into the database. New races
/// are merged into the stored history, which is then rewritten in index order.
pub fn import_index<P: AsRef<Path>, B: AsRef<Path>>(
    db: &Database,
    index_path: P,
    base_dir: B,
) -> Result<ImportSummary> {
    let (incoming, tables, skipped) = read_index(index_path, base_dir)?;

    let mut summary = ImportSummary {
        events: incoming.len(),
        skipped,
        ..Default::default()
    };
    let mut index = db.load_history()?;
    for entry in incoming.iter() {
        index.upsert(entry.clone());
    }
    for (ordinal, entry) in index.iter().enumerate() {
        db.upsert_event(entry, ordinal)?;
    }
    for (result_ref, table) in &tables {
        summary.results += db.upsert_results(result_ref, table)?;
    }

    log::info!(
        "Imported {} races with {} results ({} skipped)",
        summary.events,
        summary.results,
        summary.skipped
    );
    Ok(summary)
}
