//! Stable multi-column sorting.
//!
//! Sorting computes a row permutation once and the table applies it to every
//! column. Missing cells sort last in both directions.

use crate::column::{
    ColumnData, MISSING_BOOLEAN, MISSING_CATEGORY, MISSING_DATE, MISSING_DATE_TIME,
    MISSING_INTEGER, MISSING_TIME,
};
use crate::table::Table;
use crate::Result;
use smallvec::SmallVec;
use std::cmp::Ordering;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SortDirection {
    Ascending,
    Descending,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortColumn {
    pub column: String,
    pub direction: SortDirection,
}

/// Ordered list of sort columns; later columns break ties in earlier ones
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SortKey {
    columns: SmallVec<[SortColumn; 4]>,
}

impl SortKey {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ascending(column: impl Into<String>) -> Self {
        Self::new().then_ascending(column)
    }

    pub fn descending(column: impl Into<String>) -> Self {
        Self::new().then_descending(column)
    }

    pub fn then_ascending(self, column: impl Into<String>) -> Self {
        self.then(column, SortDirection::Ascending)
    }

    pub fn then_descending(self, column: impl Into<String>) -> Self {
        self.then(column, SortDirection::Descending)
    }

    pub fn then(mut self, column: impl Into<String>, direction: SortDirection) -> Self {
        self.columns.push(SortColumn {
            column: column.into(),
            direction,
        });
        self
    }

    pub fn columns(&self) -> &[SortColumn] {
        &self.columns
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

/// Storage of one key column, with category codes mapped to lexicographic ranks
enum KeyData<'t> {
    Integer(&'t [i64]),
    Float(&'t [f64]),
    Boolean(&'t [i8]),
    Category { codes: &'t [u32], ranks: Vec<u32> },
    LocalDate(&'t [i32]),
    LocalTime(&'t [i32]),
    LocalDateTime(&'t [i64]),
}

impl<'t> KeyData<'t> {
    fn new(data: &'t ColumnData) -> Self {
        match data {
            ColumnData::Integer(v) => KeyData::Integer(v),
            ColumnData::Float(v) => KeyData::Float(v),
            ColumnData::Boolean(v) => KeyData::Boolean(v),
            ColumnData::Category { dictionary, codes } => KeyData::Category {
                codes,
                ranks: dictionary.lexicographic_ranks(),
            },
            ColumnData::LocalDate(v) => KeyData::LocalDate(v),
            ColumnData::LocalTime(v) => KeyData::LocalTime(v),
            ColumnData::LocalDateTime(v) => KeyData::LocalDateTime(v),
        }
    }

    fn is_missing(&self, row: usize) -> bool {
        match self {
            KeyData::Integer(v) => v[row] == MISSING_INTEGER,
            KeyData::Float(v) => v[row].is_nan(),
            KeyData::Boolean(v) => v[row] == MISSING_BOOLEAN,
            KeyData::Category { codes, .. } => codes[row] == MISSING_CATEGORY,
            KeyData::LocalDate(v) => v[row] == MISSING_DATE,
            KeyData::LocalTime(v) => v[row] == MISSING_TIME,
            KeyData::LocalDateTime(v) => v[row] == MISSING_DATE_TIME,
        }
    }

    /// Order two present cells
    fn compare_present(&self, a: usize, b: usize) -> Ordering {
        match self {
            KeyData::Integer(v) => v[a].cmp(&v[b]),
            KeyData::Float(v) => v[a].total_cmp(&v[b]),
            KeyData::Boolean(v) => v[a].cmp(&v[b]),
            KeyData::Category { codes, ranks } => {
                ranks[codes[a] as usize].cmp(&ranks[codes[b] as usize])
            }
            KeyData::LocalDate(v) => v[a].cmp(&v[b]),
            KeyData::LocalTime(v) => v[a].cmp(&v[b]),
            KeyData::LocalDateTime(v) => v[a].cmp(&v[b]),
        }
    }

    fn compare(&self, a: usize, b: usize, direction: SortDirection) -> Ordering {
        match (self.is_missing(a), self.is_missing(b)) {
            (true, true) => Ordering::Equal,
            (true, false) => Ordering::Greater,
            (false, true) => Ordering::Less,
            (false, false) => match direction {
                SortDirection::Ascending => self.compare_present(a, b),
                SortDirection::Descending => self.compare_present(a, b).reverse(),
            },
        }
    }
}

/// Row order that sorts `table` by `key`.
///
/// The sort is stable, so rows with equal keys keep their relative order. An
/// empty key yields the identity permutation.
pub fn sort_permutation(table: &Table, key: &SortKey) -> Result<Vec<usize>> {
    let keys: Vec<(KeyData<'_>, SortDirection)> = key
        .columns()
        .iter()
        .map(|sc| Ok((KeyData::new(table.column(&sc.column)?.data()), sc.direction)))
        .collect::<Result<_>>()?;

    let mut permutation: Vec<usize> = (0..table.row_count()).collect();
    if !keys.is_empty() {
        permutation.sort_by(|&a, &b| {
            keys.iter()
                .map(|(data, direction)| data.compare(a, b, *direction))
                .find(|ordering| ordering.is_ne())
                .unwrap_or(Ordering::Equal)
        });
    }

    debug!(
        table = %table.name(),
        rows = permutation.len(),
        keys = keys.len(),
        "sort permutation computed"
    );
    Ok(permutation)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::column::Column;
    use crate::types::Value;
    use crate::Error;

    fn table() -> Table {
        Table::from_columns(
            "t",
            vec![
                Column::categories("name", vec![Some("pear"), Some("apple"), None, Some("fig"), Some("apple")]),
                Column::integers("score", vec![Some(5), None, Some(-2), Some(5), Some(1)]),
                Column::floats("width", vec![Some(0.5), Some(2.0), None, Some(-1.0), Some(2.0)]),
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_ascending_puts_missing_last() {
        let perm = sort_permutation(&table(), &SortKey::ascending("score")).unwrap();
        assert_eq!(perm, vec![2, 4, 0, 3, 1]);
    }

    #[test]
    fn test_descending_keeps_missing_last_and_is_stable() {
        let perm = sort_permutation(&table(), &SortKey::descending("score")).unwrap();
        // rows 0 and 3 tie on 5 and keep their order
        assert_eq!(perm, vec![0, 3, 4, 2, 1]);
    }

    #[test]
    fn test_category_sorts_by_string() {
        let perm = sort_permutation(&table(), &SortKey::ascending("name")).unwrap();
        assert_eq!(perm, vec![1, 4, 3, 0, 2]);
    }

    #[test]
    fn test_multi_column_key() {
        let key = SortKey::ascending("name").then_descending("width");
        let perm = sort_permutation(&table(), &key).unwrap();
        assert_eq!(perm, vec![1, 4, 3, 0, 2]);

        let key = SortKey::descending("width").then_ascending("score");
        let perm = sort_permutation(&table(), &key).unwrap();
        assert_eq!(perm, vec![4, 1, 0, 3, 2]);
    }

    #[test]
    fn test_empty_key_is_identity() {
        let perm = sort_permutation(&table(), &SortKey::new()).unwrap();
        assert_eq!(perm, vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn test_unknown_column() {
        let key = SortKey::ascending("score").then_ascending("nope");
        assert!(matches!(
            sort_permutation(&table(), &key),
            Err(Error::ColumnNotFound(_))
        ));
    }

    #[test]
    fn test_table_sort_moves_rows_together() {
        let sorted = table().sort_descending_on("width").unwrap();
        assert_eq!(
            sorted.row(0).unwrap(),
            vec![Value::from("apple"), Value::Missing, Value::Float(2.0)]
        );
        assert_eq!(
            sorted.row(4).unwrap(),
            vec![Value::Missing, Value::Integer(-2), Value::Missing]
        );
    }
}
