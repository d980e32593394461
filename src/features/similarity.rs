//! Similarity predicates deciding which past races are comparable

use serde::{Deserialize, Serialize};

use crate::HistoryEntry;

/// Whether a past race belongs to the same comparison category as the race
/// a training example is being built for
pub trait SimilarityPredicate {
    fn similar(&self, current: &HistoryEntry, candidate: &HistoryEntry) -> bool;
}

/// Named comparison rules
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Similarity {
    /// Every race of the same gender
    Any,
    /// Same race format (individual, mass start, ...)
    SameType,
    SameTechnique,
    SameTypeAndTechnique,
    /// Both distance races or both sprints
    SameDiscipline,
}

impl SimilarityPredicate for Similarity {
    fn similar(&self, current: &HistoryEntry, candidate: &HistoryEntry) -> bool {
        match self {
            Similarity::Any => true,
            Similarity::SameType => current.event_type == candidate.event_type,
            Similarity::SameTechnique => current.technique == candidate.technique,
            Similarity::SameTypeAndTechnique => {
                current.event_type == candidate.event_type
                    && current.technique == candidate.technique
            }
            Similarity::SameDiscipline => current.is_distance() == candidate.is_distance(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::race;
    use crate::{EventType, Technique};

    #[test]
    fn test_similarity_rules() {
        let current = race(1, 100);

        let mut mass_skate = race(2, 90);
        mass_skate.event_type = EventType::Mass;
        mass_skate.technique = Technique::Freestyle;

        let mut sprint_classic = race(3, 80);
        sprint_classic.event_type = EventType::SprintFinal;

        let same = race(4, 70);

        assert!(Similarity::Any.similar(&current, &mass_skate));

        assert!(!Similarity::SameType.similar(&current, &mass_skate));
        assert!(Similarity::SameType.similar(&current, &same));

        assert!(Similarity::SameTechnique.similar(&current, &sprint_classic));
        assert!(!Similarity::SameTechnique.similar(&current, &mass_skate));

        assert!(Similarity::SameTypeAndTechnique.similar(&current, &same));
        assert!(!Similarity::SameTypeAndTechnique.similar(&current, &sprint_classic));

        assert!(Similarity::SameDiscipline.similar(&current, &mass_skate));
        assert!(!Similarity::SameDiscipline.similar(&current, &sprint_classic));
    }
}
