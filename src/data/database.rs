//! SQLite storage for race history and results

use crate::data::{HistoryIndex, MemoryResults, ResultTable};
use crate::{
    date_from_day, EventCategory, EventId, EventType, Gender, HistoryEntry, NordicError, Outcome,
    Result, SubjectId, Technique,
};
use chrono::NaiveDate;
use rusqlite::types::Type;
use rusqlite::{params, Connection};
use std::collections::HashMap;
use std::path::Path;

/// Database connection and operations
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open or create database at the given path
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)?;
        let db = Database { conn };
        db.init_schema()?;
        Ok(db)
    }

    /// Create an in-memory database (for testing)
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let db = Database { conn };
        db.init_schema()?;
        Ok(db)
    }

    fn init_schema(&self) -> Result<()> {
        self.conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS events (
                id INTEGER PRIMARY KEY,
                result_ref TEXT NOT NULL UNIQUE,
                category TEXT NOT NULL,
                day INTEGER NOT NULL,
                location TEXT NOT NULL,
                event_type TEXT NOT NULL,
                technique TEXT NOT NULL,
                gender TEXT NOT NULL,
                distance INTEGER,
                best1 REAL NOT NULL,
                best5 REAL NOT NULL,
                best15 REAL NOT NULL,
                best30 REAL NOT NULL,
                ordinal INTEGER NOT NULL
            );

            CREATE TABLE IF NOT EXISTS results (
                result_ref TEXT NOT NULL,
                subject TEXT NOT NULL,
                rank INTEGER NOT NULL,
                gap REAL,
                PRIMARY KEY (result_ref, subject)
            );

            CREATE INDEX IF NOT EXISTS idx_events_day ON events(day);
            CREATE INDEX IF NOT EXISTS idx_results_subject ON results(subject);
            "#,
        )?;
        Ok(())
    }

    // ==================== Event Operations ====================

    /// Insert or replace a race. `ordinal` is the race's position in the
    /// history index and orders races that share a day.
    pub fn upsert_event(&self, entry: &HistoryEntry, ordinal: usize) -> Result<()> {
        self.conn.execute(
            r#"
            INSERT INTO events (id, result_ref, category, day, location, event_type,
                                technique, gender, distance, best1, best5, best15, best30, ordinal)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)
            ON CONFLICT(id) DO UPDATE SET
                result_ref = excluded.result_ref,
                category = excluded.category,
                day = excluded.day,
                location = excluded.location,
                event_type = excluded.event_type,
                technique = excluded.technique,
                gender = excluded.gender,
                distance = excluded.distance,
                best1 = excluded.best1,
                best5 = excluded.best5,
                best15 = excluded.best15,
                best30 = excluded.best30,
                ordinal = excluded.ordinal
            "#,
            params![
                entry.id.0,
                entry.result_ref,
                entry.category.code(),
                entry.day,
                entry.location,
                entry.event_type.code(),
                entry.technique.code(),
                entry.gender.code(),
                entry.distance,
                entry.strength[0],
                entry.strength[1],
                entry.strength[2],
                entry.strength[3],
                ordinal as i64,
            ],
        )?;
        Ok(())
    }

    /// Load every race in index order: most recent first, same-day races in
    /// the order they were stored
    pub fn load_history(&self) -> Result<HistoryIndex> {
        let mut stmt = self.conn.prepare(
            "SELECT id, result_ref, category, day, location, event_type, technique, gender,
                    distance, best1, best5, best15, best30
             FROM events
             ORDER BY day DESC, ordinal",
        )?;

        let entries = stmt
            .query_map([], Self::row_to_entry)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        HistoryIndex::new(entries)
    }

    fn row_to_entry(row: &rusqlite::Row) -> rusqlite::Result<HistoryEntry> {
        Ok(HistoryEntry {
            id: EventId(row.get(0)?),
            result_ref: row.get(1)?,
            category: decode(row, 2, EventCategory::from_code)?,
            day: row.get(3)?,
            location: row.get(4)?,
            event_type: decode(row, 5, EventType::from_code)?,
            technique: decode(row, 6, Technique::from_code)?,
            gender: decode(row, 7, Gender::from_code)?,
            distance: row.get(8)?,
            strength: [row.get(9)?, row.get(10)?, row.get(11)?, row.get(12)?],
        })
    }

    // ==================== Result Operations ====================

    /// Replace the result table stored under `result_ref`
    pub fn upsert_results(&self, result_ref: &str, table: &ResultTable) -> Result<usize> {
        let tx = self.conn.unchecked_transaction()?;
        tx.execute("DELETE FROM results WHERE result_ref = ?1", params![result_ref])?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO results (result_ref, subject, rank, gap) VALUES (?1, ?2, ?3, ?4)",
            )?;
            for (subject, outcome) in table.iter() {
                stmt.execute(params![result_ref, subject.0, outcome.rank(), outcome.gap()])?;
            }
        }
        tx.commit()?;
        Ok(table.len())
    }

    /// Load every result table. Races without stored results get an empty table.
    pub fn load_results(&self) -> Result<MemoryResults> {
        let mut tables: HashMap<String, ResultTable> = HashMap::new();

        let mut stmt = self.conn.prepare("SELECT result_ref FROM events")?;
        for result_ref in stmt.query_map([], |row| row.get::<_, String>(0))? {
            tables.insert(result_ref?, ResultTable::new());
        }

        let mut stmt = self
            .conn
            .prepare("SELECT result_ref, subject, rank, gap FROM results")?;
        let rows = stmt.query_map([], |row| {
            let result_ref: String = row.get(0)?;
            let subject: String = row.get(1)?;
            let rank: u32 = row.get(2)?;
            let gap: Option<f64> = row.get(3)?;
            let outcome = match gap {
                Some(gap) => Outcome::Timed(rank, gap),
                None => Outcome::Rank(rank),
            };
            Ok((result_ref, SubjectId(subject), outcome))
        })?;
        for row in rows {
            let (result_ref, subject, outcome) = row?;
            tables.entry(result_ref).or_default().insert(subject, outcome);
        }

        let mut results = MemoryResults::new();
        for (result_ref, table) in tables {
            results.insert(result_ref, table);
        }
        Ok(results)
    }

    // ==================== Statistics ====================

    /// Get database statistics
    pub fn get_stats(&self) -> Result<DatabaseStats> {
        let event_count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM events", [], |row| row.get(0))?;

        let result_count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM results", [], |row| row.get(0))?;

        let athlete_count: i64 = self.conn.query_row(
            "SELECT COUNT(DISTINCT subject) FROM results",
            [],
            |row| row.get(0),
        )?;

        let (min_day, max_day): (Option<i64>, Option<i64>) =
            self.conn
                .query_row("SELECT MIN(day), MAX(day) FROM events", [], |row| {
                    Ok((row.get(0)?, row.get(1)?))
                })?;

        Ok(DatabaseStats {
            event_count: event_count as usize,
            result_count: result_count as usize,
            athlete_count: athlete_count as usize,
            earliest_event: min_day.and_then(date_from_day),
            latest_event: max_day.and_then(date_from_day),
        })
    }
}

fn decode<T>(row: &rusqlite::Row, idx: usize, parse: fn(&str) -> Option<T>) -> rusqlite::Result<T> {
    let code: String = row.get(idx)?;
    parse(&code).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            idx,
            Type::Text,
            Box::new(NordicError::Parse(format!("unknown code {:?}", code))),
        )
    })
}

/// Database statistics
#[derive(Debug, Clone)]
pub struct DatabaseStats {
    pub event_count: usize,
    pub result_count: usize,
    pub athlete_count: usize,
    pub earliest_event: Option<NaiveDate>,
    pub latest_event: Option<NaiveDate>,
}
