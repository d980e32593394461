//! Filters choosing which races and results become training examples

use serde::{Deserialize, Serialize};

use crate::{EventType, HistoryEntry, Outcome};

/// Which races the collection driver builds examples for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventFilter {
    #[default]
    Any,
    /// Interval-start individual races
    Individual,
    /// Any distance format
    Distance,
}

impl EventFilter {
    pub fn accepts(&self, entry: &HistoryEntry) -> bool {
        match self {
            EventFilter::Any => true,
            EventFilter::Individual => entry.event_type == EventType::Individual,
            EventFilter::Distance => entry.is_distance(),
        }
    }
}

/// Which results within an accepted race become examples
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum OutcomeFilter {
    #[default]
    Any,
    /// Only athletes who finished within the first `places`
    Top { places: u32 },
}

impl OutcomeFilter {
    pub fn accepts(&self, outcome: &Outcome) -> bool {
        match *self {
            OutcomeFilter::Any => true,
            OutcomeFilter::Top { places } => outcome.rank() <= places,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::race;

    #[test]
    fn test_event_filters() {
        let individual = race(1, 100);
        let mut pursuit = race(2, 100);
        pursuit.event_type = EventType::Pursuit;
        let mut sprint = race(3, 100);
        sprint.event_type = EventType::SprintFinal;

        assert!(EventFilter::Any.accepts(&sprint));
        assert!(EventFilter::Individual.accepts(&individual));
        assert!(!EventFilter::Individual.accepts(&pursuit));
        assert!(EventFilter::Distance.accepts(&pursuit));
        assert!(!EventFilter::Distance.accepts(&sprint));
    }

    #[test]
    fn test_outcome_filters() {
        let filter = OutcomeFilter::Top { places: 30 };
        assert!(filter.accepts(&Outcome::Rank(30)));
        assert!(!filter.accepts(&Outcome::Timed(31, 0.1)));
        assert!(OutcomeFilter::Any.accepts(&Outcome::Rank(99)));
    }
}
