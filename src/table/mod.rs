//! Tables: ordered collections of equal-length, uniquely named columns.
//!
//! Derivations (`select_where`, `sort_*`, `reduce`, `first`, `select_columns`)
//! build a new table and leave the source untouched. Columns that a derivation
//! does not recompute are shared by `Arc`; a published column is never mutated
//! in place, so sharing is invisible to callers. Structural edits
//! (`add_column`, `remove_columns`, `rename_column`, `replace_column`,
//! `set_name`) mutate the table itself, and only after every check has passed.

mod structure;

use crate::column::Column;
use crate::ingest::{csv_writer, CsvConfig, CsvIngester};
use crate::query::predicate::{Predicate, SelectionMask};
use crate::query::reduce::{self, Aggregation};
use crate::query::sort::{self, SortKey};
use crate::store;
use crate::types::{ColumnType, Value};
use crate::{Error, Result};
use std::collections::HashSet;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

#[derive(Debug, Clone, Default)]
pub struct Table {
    name: String,
    columns: Vec<Arc<Column>>,
}

impl Table {
    /// Create an empty table with no columns
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            columns: Vec::new(),
        }
    }

    /// Build a table from columns, checking lengths and name uniqueness
    pub fn from_columns(name: impl Into<String>, columns: Vec<Column>) -> Result<Self> {
        let mut table = Self::new(name);
        for column in columns {
            table.push_column(column)?;
        }
        Ok(table)
    }

    /// Read a CSV file whose columns have the given types, in order
    pub fn read_csv(column_types: &[ColumnType], path: impl AsRef<Path>) -> Result<Self> {
        CsvIngester::new(column_types).read_path(path)
    }

    /// Load a table previously written by [`Table::save`]
    pub fn read_table(path: impl AsRef<Path>) -> Result<Self> {
        store::load(path)
    }

    /// Persist the table under `dir`, returning the path to pass to [`Table::read_table`]
    pub fn save(&self, dir: impl AsRef<Path>) -> Result<PathBuf> {
        store::save(self, dir)
    }

    /// Export with the default dialect, readable by [`Table::read_csv`]
    pub fn export_to_csv(&self, path: impl AsRef<Path>) -> Result<()> {
        csv_writer::export_csv(self, path.as_ref(), &CsvConfig::default())
    }

    /// Export in the dialect of `config`; ingest with the same config reads it back
    pub fn export_to_csv_with_config(&self, path: impl AsRef<Path>, config: &CsvConfig) -> Result<()> {
        csv_writer::export_csv(self, path.as_ref(), config)
    }

    pub fn write_csv<W: Write>(&self, writer: W) -> Result<()> {
        csv_writer::write_csv(self, writer, &CsvConfig::default())
    }

    pub fn write_csv_with_config<W: Write>(&self, writer: W, config: &CsvConfig) -> Result<()> {
        csv_writer::write_csv(self, writer, config)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    /// Row count; a table without columns has zero rows
    pub fn row_count(&self) -> usize {
        self.columns.first().map_or(0, |c| c.len())
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// `(rows, columns)`
    pub fn shape(&self) -> (usize, usize) {
        (self.row_count(), self.column_count())
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name()).collect()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name() == name)
    }

    pub fn column(&self, name: &str) -> Result<&Column> {
        self.column_index(name)
            .map(|i| self.columns[i].as_ref())
            .ok_or_else(|| Error::ColumnNotFound(name.to_string()))
    }

    pub fn column_at(&self, index: usize) -> Result<&Column> {
        self.columns
            .get(index)
            .map(Arc::as_ref)
            .ok_or(Error::IndexOutOfRange {
                index,
                len: self.columns.len(),
            })
    }

    pub fn columns(&self) -> impl Iterator<Item = &Column> {
        self.columns.iter().map(Arc::as_ref)
    }

    /// All cells of row `index`, in column order
    pub fn row(&self, index: usize) -> Result<Vec<Value>> {
        if index >= self.row_count() {
            return Err(Error::IndexOutOfRange {
                index,
                len: self.row_count(),
            });
        }
        Ok(self.columns.iter().map(|c| c.value_at(index)).collect())
    }

    fn check_insertable(&self, column: &Column) -> Result<()> {
        if !self.columns.is_empty() && column.len() != self.row_count() {
            return Err(Error::LengthMismatch {
                column: column.name().to_string(),
                expected: self.row_count(),
                actual: column.len(),
            });
        }
        if self.column_index(column.name()).is_some() {
            return Err(Error::DuplicateName(column.name().to_string()));
        }
        Ok(())
    }

    /// Insert `column` at `position`, clamped to `[0, column_count]`
    pub fn add_column(&mut self, position: usize, column: Column) -> Result<()> {
        self.check_insertable(&column)?;
        let position = position.min(self.columns.len());
        self.columns.insert(position, Arc::new(column));
        Ok(())
    }

    /// Append `column` after the last column
    pub fn push_column(&mut self, column: Column) -> Result<()> {
        self.check_insertable(&column)?;
        self.columns.push(Arc::new(column));
        Ok(())
    }

    /// Drop the named columns. Nothing is removed unless every name exists.
    pub fn remove_columns<S: AsRef<str>>(&mut self, names: &[S]) -> Result<()> {
        if let Some(unknown) = names.iter().find(|n| self.column_index(n.as_ref()).is_none()) {
            return Err(Error::ColumnNotFound(unknown.as_ref().to_string()));
        }

        let doomed: HashSet<&str> = names.iter().map(AsRef::as_ref).collect();
        self.columns.retain(|c| !doomed.contains(c.name()));
        Ok(())
    }

    pub fn rename_column(&mut self, old: &str, new: &str) -> Result<()> {
        let index = self
            .column_index(old)
            .ok_or_else(|| Error::ColumnNotFound(old.to_string()))?;
        if old == new {
            return Ok(());
        }
        if self.column_index(new).is_some() {
            return Err(Error::DuplicateName(new.to_string()));
        }

        // copy-on-write: a column shared with another table is cloned first
        Arc::make_mut(&mut self.columns[index]).set_name(new);
        Ok(())
    }

    /// Swap the named column for `column`, which keeps its own name
    pub fn replace_column(&mut self, name: &str, column: Column) -> Result<()> {
        let index = self
            .column_index(name)
            .ok_or_else(|| Error::ColumnNotFound(name.to_string()))?;
        if column.len() != self.row_count() {
            return Err(Error::LengthMismatch {
                column: column.name().to_string(),
                expected: self.row_count(),
                actual: column.len(),
            });
        }
        if let Some(other) = self.column_index(column.name()) {
            if other != index {
                return Err(Error::DuplicateName(column.name().to_string()));
            }
        }

        self.columns[index] = Arc::new(column);
        Ok(())
    }

    /// A new table with the named columns, in the given order, sharing their storage
    pub fn select_columns<S: AsRef<str>>(&self, names: &[S]) -> Result<Table> {
        let mut columns = Vec::with_capacity(names.len());
        let mut seen = HashSet::new();
        for name in names {
            let name = name.as_ref();
            let index = self
                .column_index(name)
                .ok_or_else(|| Error::ColumnNotFound(name.to_string()))?;
            if !seen.insert(index) {
                return Err(Error::DuplicateName(name.to_string()));
            }
            columns.push(Arc::clone(&self.columns[index]));
        }

        Ok(Table {
            name: self.name.clone(),
            columns,
        })
    }

    /// Rows matching `predicate`, with every column, in their original order
    pub fn select_where(&self, predicate: &Predicate) -> Result<Table> {
        let mask = predicate.evaluate(self)?;
        let selected = self.select_rows(&mask)?;
        debug!(
            table = %self.name,
            rows_in = self.row_count(),
            rows_out = selected.row_count(),
            "select_where"
        );
        Ok(selected)
    }

    /// Rows flagged in `mask`, which must have been evaluated against this row count
    pub fn select_rows(&self, mask: &SelectionMask) -> Result<Table> {
        if mask.len() != self.row_count() {
            return Err(Error::LengthMismatch {
                column: "selection mask".to_string(),
                expected: self.row_count(),
                actual: mask.len(),
            });
        }
        Ok(self.take_rows(&mask.selected_indices()))
    }

    /// The first `min(n, row_count)` rows
    pub fn first(&self, n: usize) -> Table {
        if n >= self.row_count() {
            return self.clone();
        }
        let indices: Vec<usize> = (0..n).collect();
        self.take_rows(&indices)
    }

    /// The last `min(n, row_count)` rows
    pub fn last(&self, n: usize) -> Table {
        let rows = self.row_count();
        if n >= rows {
            return self.clone();
        }
        let indices: Vec<usize> = (rows - n..rows).collect();
        self.take_rows(&indices)
    }

    pub fn sort_ascending_on(&self, name: &str) -> Result<Table> {
        self.sort_on(&SortKey::ascending(name))
    }

    pub fn sort_descending_on(&self, name: &str) -> Result<Table> {
        self.sort_on(&SortKey::descending(name))
    }

    /// Stable sort by every column of `key`, in order
    pub fn sort_on(&self, key: &SortKey) -> Result<Table> {
        let permutation = sort::sort_permutation(self, key)?;
        Ok(self.take_rows(&permutation))
    }

    /// One row per distinct value of `group_column`, with `aggregation` applied to `value_column`
    pub fn reduce(&self, value_column: &str, group_column: &str, aggregation: Aggregation) -> Result<Table> {
        reduce::reduce(self, value_column, group_column, aggregation)
    }

    /// Like [`Table::reduce`], with one result column per aggregation
    pub fn summarize(
        &self,
        value_column: &str,
        group_column: &str,
        aggregations: &[Aggregation],
    ) -> Result<Table> {
        reduce::reduce_many(self, value_column, group_column, aggregations)
    }

    /// Apply a row permutation or selection uniformly to every column
    pub(crate) fn take_rows(&self, indices: &[usize]) -> Table {
        Table {
            name: self.name.clone(),
            columns: self
                .columns
                .iter()
                .map(|c| Arc::new(c.take(indices)))
                .collect(),
        }
    }
}

impl PartialEq for Table {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
            && self.columns.len() == other.columns.len()
            && self
                .columns
                .iter()
                .zip(&other.columns)
                .all(|(a, b)| Arc::ptr_eq(a, b) || a == b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::predicate::column;

    fn scores() -> Table {
        Table::from_columns(
            "scores",
            vec![
                Column::categories("name", vec![Some("a"), Some("b"), Some("c")]),
                Column::integers("score", vec![Some(5), Some(-2), Some(5)]),
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_shape_and_names() {
        let table = scores();
        assert_eq!(table.shape(), (3, 2));
        assert_eq!(table.column_names(), vec!["name", "score"]);
        assert_eq!(Table::new("empty").shape(), (0, 0));
    }

    #[test]
    fn test_from_columns_validates() {
        let result = Table::from_columns(
            "bad",
            vec![
                Column::integers("a", vec![Some(1)]),
                Column::integers("b", vec![Some(1), Some(2)]),
            ],
        );
        assert!(matches!(result, Err(Error::LengthMismatch { .. })));

        let result = Table::from_columns(
            "bad",
            vec![
                Column::integers("a", vec![Some(1)]),
                Column::integers("a", vec![Some(2)]),
            ],
        );
        assert!(matches!(result, Err(Error::DuplicateName(_))));
    }

    #[test]
    fn test_remove_columns_is_all_or_nothing() {
        let mut table = scores();
        let err = table.remove_columns(&["score", "missing", "other"]).unwrap_err();
        assert!(matches!(err, Error::ColumnNotFound(ref n) if n == "missing"));
        assert_eq!(table.column_count(), 2);

        table.remove_columns(&["score"]).unwrap();
        assert_eq!(table.column_names(), vec!["name"]);
    }

    #[test]
    fn test_add_column_clamps_position() {
        let mut table = scores();
        table
            .add_column(99, Column::booleans("flag", vec![Some(true), None, Some(false)]))
            .unwrap();
        table
            .add_column(0, Column::floats("w", vec![Some(1.0), Some(2.0), Some(3.0)]))
            .unwrap();
        assert_eq!(table.column_names(), vec!["w", "name", "score", "flag"]);

        let err = table
            .add_column(1, Column::integers("short", vec![Some(1)]))
            .unwrap_err();
        assert!(matches!(err, Error::LengthMismatch { expected: 3, actual: 1, .. }));

        let err = table
            .add_column(1, Column::integers("score", vec![Some(1), Some(2), Some(3)]))
            .unwrap_err();
        assert!(matches!(err, Error::DuplicateName(_)));
        assert_eq!(table.column_count(), 4);
    }

    #[test]
    fn test_rename_column_copy_on_write() {
        let original = scores();
        let mut renamed = original.clone();
        renamed.rename_column("score", "points").unwrap();

        assert_eq!(original.column_names(), vec!["name", "score"]);
        assert_eq!(renamed.column_names(), vec!["name", "points"]);
        assert!(matches!(
            renamed.rename_column("points", "name"),
            Err(Error::DuplicateName(_))
        ));
        assert!(matches!(
            renamed.rename_column("nope", "x"),
            Err(Error::ColumnNotFound(_))
        ));
    }

    #[test]
    fn test_replace_column() {
        let mut table = scores();
        table
            .replace_column("score", Column::integers("score", vec![Some(1), Some(2), Some(3)]))
            .unwrap();
        assert_eq!(table.column("score").unwrap().get(2).unwrap(), Value::Integer(3));

        let err = table
            .replace_column("score", Column::integers("name", vec![Some(1), Some(2), Some(3)]))
            .unwrap_err();
        assert!(matches!(err, Error::DuplicateName(_)));
    }

    #[test]
    fn test_first_last_and_row() {
        let table = scores();
        assert_eq!(table.first(2).row_count(), 2);
        assert_eq!(table.first(10), table);
        assert_eq!(table.last(1).row(0).unwrap(), vec![Value::from("c"), Value::Integer(5)]);
        assert!(matches!(table.row(3), Err(Error::IndexOutOfRange { .. })));
    }

    #[test]
    fn test_select_columns_shares_storage() {
        let table = scores();
        let projected = table.select_columns(&["score"]).unwrap();
        assert!(Arc::ptr_eq(&table.columns[1], &projected.columns[0]));
        assert!(matches!(
            table.select_columns(&["score", "score"]),
            Err(Error::DuplicateName(_))
        ));
    }

    #[test]
    fn test_select_where_leaves_source_untouched() {
        let table = scores();
        let snapshot = table.clone();
        let positive = table.select_where(&column("score").is_greater_than(0)).unwrap();

        assert_eq!(positive.row_count(), 2);
        assert_eq!(table, snapshot);
        assert!(table.select_where(&column("nope").is_equal_to(1)).is_err());
        assert_eq!(table, snapshot);
    }

    #[test]
    fn test_select_rows_checks_mask_length() {
        let table = scores();
        let mask = SelectionMask::from(vec![true, false]);
        assert!(matches!(
            table.select_rows(&mask),
            Err(Error::LengthMismatch { expected: 3, actual: 2, .. })
        ));
    }

    #[test]
    fn test_table_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Table>();
    }
}
