//! Race history and result storage
//!
//! The in-memory history index and result tables the assembly engine reads,
//! plus SQLite persistence, JSON import and CSV export.

pub mod database;
pub mod export;
pub mod history;
pub mod import;
pub mod results;

pub use database::Database;
pub use history::{compare_past, HistoryIndex};
pub use results::{MemoryResults, ResultSource, ResultTable};
