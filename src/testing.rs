//! Fixtures shared by unit tests

use crate::data::{HistoryIndex, MemoryResults, ResultTable};
use crate::{EventCategory, EventId, EventType, Gender, HistoryEntry, Outcome, Technique};

/// A men's classic individual World Cup race on the given day
pub fn race(id: i64, day: i64) -> HistoryEntry {
    HistoryEntry {
        id: EventId(id),
        result_ref: format!("race{}", id),
        category: EventCategory::WorldCup,
        day,
        location: "Lahti, FIN".to_string(),
        event_type: EventType::Individual,
        technique: Technique::Classic,
        gender: Gender::Male,
        distance: Some(15),
        strength: [0.0, 4.5, 12.0, 20.5],
    }
}

/// `n` identical races, most recent first, one day apart
pub fn uniform_history(n: usize) -> HistoryIndex {
    let entries = (0..n)
        .map(|i| race(i as i64, 40_000 - i as i64))
        .collect::<Vec<_>>();
    HistoryIndex::new(entries).unwrap()
}

/// Result tables where `subject` finished with the given outcome in race `i`
/// (`None` leaves the athlete out of that race)
pub fn results_for(subject: &str, outcomes: &[Option<Outcome>]) -> MemoryResults {
    let mut results = MemoryResults::new();
    for (i, outcome) in outcomes.iter().enumerate() {
        let mut table = ResultTable::new();
        if let Some(outcome) = outcome {
            table.insert(subject.into(), *outcome);
        }
        results.insert(format!("race{}", i), table);
    }
    results
}

/// Shorthand for a list of plain ranks
pub fn ranks(values: &[u32]) -> Vec<Option<Outcome>> {
    values.iter().map(|&r| Some(Outcome::Rank(r))).collect()
}
