//! Typed in-memory columnar tables.
//!
//! A [`Table`] is an ordered set of named, single-typed [`Column`]s of equal
//! length. Tables are read from CSV with caller-supplied column types, filtered
//! with [`Predicate`]s, sorted, grouped with [`Aggregation`]s, exported back to
//! CSV, and saved to or loaded from a compact binary directory format.
//!
//! ```no_run
//! use lightning_table::{column, Aggregation, ColumnType, Table};
//!
//! # fn main() -> lightning_table::Result<()> {
//! let types = [ColumnType::LocalDate, ColumnType::Category, ColumnType::Integer];
//! let tornadoes = Table::read_csv(&types, "tornadoes.csv")?;
//!
//! let deadly = tornadoes.select_where(&column("Fatalities").is_greater_than(0))?;
//! let by_state = deadly.reduce("Fatalities", "State", Aggregation::Sum)?;
//! let path = by_state.sort_descending_on("Sum [Fatalities]")?.save("/tmp/db")?;
//! assert_eq!(Table::read_table(path)?.row_count(), by_state.row_count());
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]

pub mod column;
pub mod error;
pub mod ingest;
pub mod logging;
pub mod query;
pub mod store;
pub mod table;
pub mod types;

pub use column::{CategoryDictionary, Column, ColumnData, Stats, TemporalField};
pub use error::{Error, Result};
pub use ingest::{CsvConfig, CsvIngester};
pub use logging::init_logging;
pub use query::{
    column, Aggregation, ColumnRef, Comparison, Predicate, SelectionMask, SortColumn,
    SortDirection, SortKey,
};
pub use store::{load, load_with_config, save, save_with_config, StoreConfig};
pub use table::Table;
pub use types::{ColumnType, Value};
