//! Training example assembly
//!
//! Searches an athlete's history for comparable past races, collects stable
//! per-category feature windows and turns every eligible result into a
//! training row.

pub mod collector;
pub mod driver;
pub mod row;
pub mod scheme;
pub mod search;

pub use collector::{Category, CategoryCollector, Window};
pub use driver::{collect, CollectionOptions, CollectionReport, RejectionCounts};
pub use row::{Assembly, Rejection, RowAssembler, TrainingRow};
pub use scheme::{builtin, Scheme, BUILTIN_SCHEMES};
pub use search::{HistorySearch, SearchResult, DEFAULT_SCAN_BUDGET};
