//! Training data assembly for cross-country race history
//!
//! Turns a most-recent-first index of race results into labeled training rows
//! and lifts them into polynomial feature bases for regression.

pub mod assembly;
pub mod data;
pub mod features;
pub mod matrix;

#[cfg(test)]
pub(crate) mod testing;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

use crate::assembly::Scheme;

/// Number of strength metrics precomputed for every race
pub const STRENGTH_METRICS: usize = 4;

/// FIS points assumed for athletes missing from a points list
pub const DEFAULT_FIS_POINTS: f64 = 200.0;

/// Unique identifier for a race
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventId(pub i64);

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Race({})", self.0)
    }
}

/// Athlete identifier (FIS code)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SubjectId(pub String);

impl From<&str> for SubjectId {
    fn from(code: &str) -> Self {
        SubjectId(code.to_string())
    }
}

impl fmt::Display for SubjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Competition level of a race
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventCategory {
    StageWorldCup,
    WorldCup,
    Championship,
    JuniorChampionship,
    U23Championship,
    Other,
}

impl EventCategory {
    const ALL: [EventCategory; 6] = [
        EventCategory::StageWorldCup,
        EventCategory::WorldCup,
        EventCategory::Championship,
        EventCategory::JuniorChampionship,
        EventCategory::U23Championship,
        EventCategory::Other,
    ];

    pub fn code(&self) -> &'static str {
        match self {
            EventCategory::StageWorldCup => "SWC",
            EventCategory::WorldCup => "WC",
            EventCategory::Championship => "CH",
            EventCategory::JuniorChampionship => "JCH",
            EventCategory::U23Championship => "U23",
            EventCategory::Other => "OTH",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.code() == code)
    }

    /// Position in the legacy category list used by the JSON index files
    pub fn from_index(index: u8) -> Option<Self> {
        Self::ALL.get(index as usize).copied()
    }
}

/// Race format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventType {
    Individual,
    Mass,
    Skiathlon,
    Pursuit,
    SprintQualification,
    SprintFinal,
    TeamSprint,
    Relay,
}

impl EventType {
    const ALL: [EventType; 8] = [
        EventType::Individual,
        EventType::Mass,
        EventType::Skiathlon,
        EventType::Pursuit,
        EventType::SprintQualification,
        EventType::SprintFinal,
        EventType::TeamSprint,
        EventType::Relay,
    ];

    /// Distance races, as opposed to sprint formats
    pub fn is_distance(&self) -> bool {
        matches!(
            self,
            EventType::Individual | EventType::Mass | EventType::Skiathlon | EventType::Pursuit
        )
    }

    pub fn code(&self) -> &'static str {
        match self {
            EventType::Individual => "IND",
            EventType::Mass => "MST",
            EventType::Skiathlon => "SKI",
            EventType::Pursuit => "PUR",
            EventType::SprintQualification => "SPQ",
            EventType::SprintFinal => "SPF",
            EventType::TeamSprint => "TSP",
            EventType::Relay => "REL",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.code() == code)
    }

    pub fn from_index(index: u8) -> Option<Self> {
        Self::ALL.get(index as usize).copied()
    }
}

/// Skiing technique
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Technique {
    Classic,
    Freestyle,
    /// Classic and freestyle legs in one race
    Combined,
}

impl Technique {
    const ALL: [Technique; 3] = [Technique::Classic, Technique::Freestyle, Technique::Combined];

    pub fn code(&self) -> &'static str {
        match self {
            Technique::Classic => "C",
            Technique::Freestyle => "F",
            Technique::Combined => "C/F",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.code() == code)
    }

    pub fn from_index(index: u8) -> Option<Self> {
        Self::ALL.get(index as usize).copied()
    }
}

/// Gender of the field; races are only ever compared within one gender
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Gender {
    Male,
    Female,
}

impl Gender {
    pub fn code(&self) -> &'static str {
        match self {
            Gender::Male => "M",
            Gender::Female => "L",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "M" => Some(Gender::Male),
            "L" | "F" => Some(Gender::Female),
            _ => None,
        }
    }

    pub fn from_index(index: u8) -> Option<Self> {
        match index {
            0 => Some(Gender::Male),
            1 => Some(Gender::Female),
            _ => None,
        }
    }
}

/// One recorded race in the history index
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub id: EventId,
    /// Key of this race's result table in the result source
    pub result_ref: String,
    pub category: EventCategory,
    /// Days since 1900-01-01
    pub day: i64,
    pub location: String,
    pub event_type: EventType,
    pub technique: Technique,
    pub gender: Gender,
    /// Distance in km (sprints and some formats have none)
    pub distance: Option<u32>,
    /// Average of the best 1, 5, 15 and 30 FIS points in the field
    pub strength: [f64; STRENGTH_METRICS],
}

impl HistoryEntry {
    pub fn is_distance(&self) -> bool {
        self.event_type.is_distance()
    }
}

fn epoch() -> NaiveDate {
    NaiveDate::from_ymd_opt(1900, 1, 1).expect("1900-01-01 is a valid date")
}

/// Convert a date to its day number (days since 1900-01-01)
pub fn day_number(date: NaiveDate) -> i64 {
    (date - epoch()).num_days()
}

/// Convert a day number back to a date
pub fn date_from_day(day: i64) -> Option<NaiveDate> {
    epoch().checked_add_signed(chrono::Duration::try_days(day)?)
}

/// An athlete's result in one race
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Outcome {
    /// Placing only (sprint finals)
    Rank(u32),
    /// Placing and relative time behind the winner
    Timed(u32, f64),
}

impl Outcome {
    pub fn rank(&self) -> u32 {
        match *self {
            Outcome::Rank(rank) | Outcome::Timed(rank, _) => rank,
        }
    }

    /// Fraction of the winning time the athlete finished behind
    pub fn gap(&self) -> Option<f64> {
        match *self {
            Outcome::Rank(_) => None,
            Outcome::Timed(_, gap) => Some(gap),
        }
    }
}

/// Application-wide errors
#[derive(Debug, Error)]
pub enum NordicError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("No result table for reference {0}")]
    UnknownResults(String),

    #[error("History index out of order at position {position}: day {day} follows day {previous}")]
    UnorderedHistory {
        position: usize,
        previous: i64,
        day: i64,
    },

    #[error("Unknown scheme: {0}")]
    UnknownScheme(String),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(String),
}

pub type Result<T> = std::result::Result<T, NordicError>;

/// Application configuration loaded from config.toml
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub data: DataConfig,
    pub collection: CollectionConfig,
    pub expansion: ExpansionConfig,
    /// Custom collection schemes, by name
    #[serde(default)]
    pub schemes: BTreeMap<String, Scheme>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataConfig {
    pub database_path: String,
    pub output_dir: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectionConfig {
    /// Candidate races a history search may skip before giving up
    pub scan_budget: usize,
    /// Stop after this many rows
    pub limit: Option<usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExpansionConfig {
    pub degree: u32,
    /// Z-score feature columns before expanding
    pub normalize: bool,
    /// Trailing response columns carried through unexpanded
    pub response_width: usize,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            data: DataConfig {
                database_path: "data/nordic.db".to_string(),
                output_dir: "output".to_string(),
            },
            collection: CollectionConfig {
                scan_budget: assembly::DEFAULT_SCAN_BUDGET,
                limit: None,
            },
            expansion: ExpansionConfig {
                degree: 2,
                normalize: true,
                response_width: 1,
            },
            schemes: BTreeMap::new(),
        }
    }
}

impl Config {
    pub fn load(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            NordicError::Config(format!("Failed to read config file {}: {}", path, e))
        })?;
        toml::from_str(&content)
            .map_err(|e| NordicError::Config(format!("Failed to parse config: {}", e)))
    }

    pub fn save(&self, path: &str) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| NordicError::Config(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Resolve a scheme by name: custom schemes shadow the built-in ones
    pub fn scheme(&self, name: &str) -> Result<Scheme> {
        if let Some(scheme) = self.schemes.get(name) {
            return Ok(scheme.clone());
        }
        assembly::scheme::builtin(name).ok_or_else(|| NordicError::UnknownScheme(name.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_day_number_round_trip() {
        let date = NaiveDate::from_ymd_opt(2017, 2, 18).unwrap();
        let day = day_number(date);
        assert_eq!(date_from_day(day), Some(date));
        assert_eq!(day_number(epoch()), 0);
        assert_eq!(day_number(NaiveDate::from_ymd_opt(1900, 1, 31).unwrap()), 30);
    }

    #[test]
    fn test_event_type_discipline() {
        assert!(EventType::Individual.is_distance());
        assert!(EventType::Pursuit.is_distance());
        assert!(!EventType::SprintFinal.is_distance());
        assert!(!EventType::Relay.is_distance());
    }

    #[test]
    fn test_legacy_indices() {
        assert_eq!(EventType::from_index(5), Some(EventType::SprintFinal));
        assert_eq!(EventType::from_index(8), None);
        assert_eq!(Technique::from_index(2), Some(Technique::Combined));
        assert_eq!(Gender::from_index(1), Some(Gender::Female));
        assert_eq!(EventCategory::from_index(1), Some(EventCategory::WorldCup));
    }

    #[test]
    fn test_codes_round_trip() {
        for t in EventType::ALL {
            assert_eq!(EventType::from_code(t.code()), Some(t));
        }
        for c in EventCategory::ALL {
            assert_eq!(EventCategory::from_code(c.code()), Some(c));
        }
        assert_eq!(Gender::from_code("L"), Some(Gender::Female));
    }

    #[test]
    fn test_outcome_json_forms() {
        let rank: Outcome = serde_json::from_str("7").unwrap();
        assert_eq!(rank, Outcome::Rank(7));
        assert_eq!(rank.gap(), None);

        let timed: Outcome = serde_json::from_str("[3, 0.021]").unwrap();
        assert_eq!(timed.rank(), 3);
        assert_eq!(timed.gap(), Some(0.021));
    }

    #[test]
    fn test_config_round_trip() {
        let config = Config::default();
        let text = toml::to_string_pretty(&config).unwrap();
        let parsed: Config = toml::from_str(&text).unwrap();
        assert_eq!(parsed.collection.scan_budget, 20);
        assert_eq!(parsed.expansion.degree, 2);
        assert!(parsed.schemes.is_empty());
    }

    #[test]
    fn test_config_resolves_builtin_and_custom_schemes() {
        let mut config = Config::default();
        assert!(config.scheme("individual-percent-back").is_ok());
        assert!(matches!(
            config.scheme("nope"),
            Err(NordicError::UnknownScheme(_))
        ));

        let mut custom = config.scheme("all-rank-category").unwrap();
        custom.categories.truncate(1);
        config.schemes.insert("mine".to_string(), custom);
        assert_eq!(config.scheme("mine").unwrap().categories.len(), 1);
    }
}
