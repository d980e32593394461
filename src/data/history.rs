//! Chronological race index
//!
//! Races are kept most-recent-first, so walking forward through the index
//! walks back in time. Searching "from position p + 1" therefore searches the
//! past of the race at p.

use std::cmp::Ordering;

use crate::{HistoryEntry, NordicError, Result};

/// Index ordering relation: `Less` when `a` belongs before `b`, i.e. `a` is
/// more recent. Same-day races compare `Equal` and keep the order they were
/// added in, so positions after a race are its same-day or earlier past.
pub fn compare_past(a: &HistoryEntry, b: &HistoryEntry) -> Ordering {
    b.day.cmp(&a.day)
}

/// Races ordered most-recent-first
#[derive(Debug, Clone, Default)]
pub struct HistoryIndex {
    entries: Vec<HistoryEntry>,
}

impl HistoryIndex {
    /// Wrap entries that are already in index order
    pub fn new(entries: Vec<HistoryEntry>) -> Result<Self> {
        for (position, pair) in entries.windows(2).enumerate() {
            if compare_past(&pair[0], &pair[1]) == Ordering::Greater {
                return Err(NordicError::UnorderedHistory {
                    position: position + 1,
                    previous: pair[0].day,
                    day: pair[1].day,
                });
            }
        }
        Ok(HistoryIndex { entries })
    }

    /// Build an index from entries in any order. Same-day races keep their
    /// relative order.
    pub fn from_unordered(mut entries: Vec<HistoryEntry>) -> Self {
        entries.sort_by(compare_past);
        HistoryIndex { entries }
    }

    /// Add a race, replacing any race with the same id. A new race goes in
    /// front of the first strictly older race.
    pub fn upsert(&mut self, entry: HistoryEntry) {
        if let Some(existing) = self.entries.iter().position(|e| e.id == entry.id) {
            if self.entries[existing].day == entry.day {
                self.entries[existing] = entry;
                return;
            }
            self.entries.remove(existing);
        }
        let position = self
            .entries
            .iter()
            .position(|e| compare_past(&entry, e) == Ordering::Less)
            .unwrap_or(self.entries.len());
        self.entries.insert(position, entry);
    }

    pub fn get(&self, position: usize) -> Option<&HistoryEntry> {
        self.entries.get(position)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, HistoryEntry> {
        self.entries.iter()
    }

    pub fn entries(&self) -> &[HistoryEntry] {
        &self.entries
    }
}

impl std::ops::Index<usize> for HistoryIndex {
    type Output = HistoryEntry;

    fn index(&self, position: usize) -> &HistoryEntry {
        &self.entries[position]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::race;

    #[test]
    fn test_compare_past_orders_most_recent_first() {
        let newer = race(1, 100);
        let older = race(2, 50);
        assert_eq!(compare_past(&newer, &older), Ordering::Less);
        assert_eq!(compare_past(&older, &newer), Ordering::Greater);
        assert_eq!(compare_past(&newer, &race(3, 100)), Ordering::Equal);
    }

    #[test]
    fn test_new_rejects_oldest_first() {
        let err = HistoryIndex::new(vec![race(1, 10), race(2, 20)]).unwrap_err();
        match err {
            NordicError::UnorderedHistory {
                position,
                previous,
                day,
            } => {
                assert_eq!(position, 1);
                assert_eq!(previous, 10);
                assert_eq!(day, 20);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_from_unordered_sorts_and_keeps_ties_stable() {
        let index = HistoryIndex::from_unordered(vec![
            race(1, 10),
            race(2, 30),
            race(3, 20),
            race(4, 30),
        ]);
        let ids: Vec<i64> = index.iter().map(|e| e.id.0).collect();
        assert_eq!(ids, vec![2, 4, 3, 1]);
        assert!(HistoryIndex::new(index.entries().to_vec()).is_ok());
    }

    #[test]
    fn test_upsert_inserts_before_first_older_race() {
        let mut index = HistoryIndex::new(vec![race(1, 30), race(2, 20), race(3, 10)]).unwrap();
        index.upsert(race(4, 20));
        index.upsert(race(5, 40));
        index.upsert(race(6, 5));
        let ids: Vec<i64> = index.iter().map(|e| e.id.0).collect();
        assert_eq!(ids, vec![5, 1, 2, 4, 3, 6]);
    }

    #[test]
    fn test_upsert_replaces_duplicate() {
        let mut index = HistoryIndex::new(vec![race(1, 30), race(2, 20)]).unwrap();
        let mut updated = race(2, 20);
        updated.location = "Davos, SUI".to_string();
        index.upsert(updated);
        assert_eq!(index.len(), 2);
        assert_eq!(index[1].location, "Davos, SUI");

        // A corrected date moves the race
        index.upsert(race(2, 35));
        let ids: Vec<i64> = index.iter().map(|e| e.id.0).collect();
        assert_eq!(ids, vec![2, 1]);
    }
}
