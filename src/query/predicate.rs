//! Row predicates and selection masks.
//!
//! A [`Predicate`] is a pure description of a row filter. Evaluating it against
//! a table happens in two steps: every referenced column is bound and every
//! literal is type-checked, then the bound tree is tested row by row. A missing
//! cell satisfies no comparison, including `!=`; only `is_missing` matches it.

use crate::column::{
    encode_date, encode_date_time, encode_time, Column, ColumnData, MISSING_BOOLEAN,
    MISSING_CATEGORY, MISSING_DATE, MISSING_DATE_TIME, MISSING_INTEGER, MISSING_TIME,
};
use crate::table::Table;
use crate::types::Value;
use crate::{Error, Result};
use std::cmp::Ordering;
use std::ops::Not;
use tracing::debug;

/// Comparison operator of a [`Predicate::Compare`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Comparison {
    Equal,
    NotEqual,
    LessThan,
    LessThanOrEqual,
    GreaterThan,
    GreaterThanOrEqual,
}

impl Comparison {
    /// Whether `cell <op> literal` holds, given `cell.cmp(literal)`
    pub fn matches(&self, ordering: Ordering) -> bool {
        match self {
            Comparison::Equal => ordering == Ordering::Equal,
            Comparison::NotEqual => ordering != Ordering::Equal,
            Comparison::LessThan => ordering == Ordering::Less,
            Comparison::LessThanOrEqual => ordering != Ordering::Greater,
            Comparison::GreaterThan => ordering == Ordering::Greater,
            Comparison::GreaterThanOrEqual => ordering != Ordering::Less,
        }
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            Comparison::Equal => "==",
            Comparison::NotEqual => "!=",
            Comparison::LessThan => "<",
            Comparison::LessThanOrEqual => "<=",
            Comparison::GreaterThan => ">",
            Comparison::GreaterThanOrEqual => ">=",
        }
    }
}

/// Row filter expression
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    Compare {
        column: String,
        op: Comparison,
        value: Value,
    },
    IsMissing(String),
    IsNotMissing(String),
    And(Box<Predicate>, Box<Predicate>),
    Or(Box<Predicate>, Box<Predicate>),
    Not(Box<Predicate>),
}

/// Start a predicate on the named column
pub fn column(name: impl Into<String>) -> ColumnRef {
    ColumnRef { name: name.into() }
}

/// A column name waiting for a comparison, see [`column`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnRef {
    name: String,
}

impl ColumnRef {
    fn compare(self, op: Comparison, value: impl Into<Value>) -> Predicate {
        Predicate::Compare {
            column: self.name,
            op,
            value: value.into(),
        }
    }

    pub fn is_equal_to(self, value: impl Into<Value>) -> Predicate {
        self.compare(Comparison::Equal, value)
    }

    pub fn is_not_equal_to(self, value: impl Into<Value>) -> Predicate {
        self.compare(Comparison::NotEqual, value)
    }

    pub fn is_greater_than(self, value: impl Into<Value>) -> Predicate {
        self.compare(Comparison::GreaterThan, value)
    }

    pub fn is_greater_than_or_equal_to(self, value: impl Into<Value>) -> Predicate {
        self.compare(Comparison::GreaterThanOrEqual, value)
    }

    pub fn is_less_than(self, value: impl Into<Value>) -> Predicate {
        self.compare(Comparison::LessThan, value)
    }

    pub fn is_less_than_or_equal_to(self, value: impl Into<Value>) -> Predicate {
        self.compare(Comparison::LessThanOrEqual, value)
    }

    pub fn is_missing(self) -> Predicate {
        Predicate::IsMissing(self.name)
    }

    pub fn is_not_missing(self) -> Predicate {
        Predicate::IsNotMissing(self.name)
    }
}

impl Predicate {
    pub fn and(self, other: Predicate) -> Predicate {
        Predicate::And(Box::new(self), Box::new(other))
    }

    pub fn or(self, other: Predicate) -> Predicate {
        Predicate::Or(Box::new(self), Box::new(other))
    }

    /// Row-wise negation. A missing cell fails `x > 0` and therefore passes its negation.
    pub fn negate(self) -> Predicate {
        Predicate::Not(Box::new(self))
    }

    /// Test every row of `table`.
    ///
    /// Fails with `ColumnNotFound` or `TypeMismatch` before any row is tested.
    pub fn evaluate(&self, table: &Table) -> Result<SelectionMask> {
        let bound = self.bind(table)?;
        let bits: Vec<bool> = (0..table.row_count()).map(|row| bound.test(row)).collect();
        let mask = SelectionMask { bits };

        debug!(
            table = %table.name(),
            rows = mask.len(),
            selected = mask.count_selected(),
            "predicate evaluated"
        );
        Ok(mask)
    }

    fn bind<'t>(&self, table: &'t Table) -> Result<Bound<'t>> {
        Ok(match self {
            Predicate::Compare { column, op, value } => {
                let column = table.column(column)?;
                Bound::Compare {
                    column,
                    test: CellTest::bind(column, *op, value)?,
                }
            }
            Predicate::IsMissing(name) => Bound::Missing {
                column: table.column(name)?,
                expected: true,
            },
            Predicate::IsNotMissing(name) => Bound::Missing {
                column: table.column(name)?,
                expected: false,
            },
            Predicate::And(a, b) => Bound::And(Box::new(a.bind(table)?), Box::new(b.bind(table)?)),
            Predicate::Or(a, b) => Bound::Or(Box::new(a.bind(table)?), Box::new(b.bind(table)?)),
            Predicate::Not(p) => Bound::Not(Box::new(p.bind(table)?)),
        })
    }
}

impl Not for Predicate {
    type Output = Predicate;

    fn not(self) -> Predicate {
        self.negate()
    }
}

/// A predicate with its columns resolved and literals encoded
enum Bound<'t> {
    Compare { column: &'t Column, test: CellTest },
    Missing { column: &'t Column, expected: bool },
    And(Box<Bound<'t>>, Box<Bound<'t>>),
    Or(Box<Bound<'t>>, Box<Bound<'t>>),
    Not(Box<Bound<'t>>),
}

impl Bound<'_> {
    fn test(&self, row: usize) -> bool {
        match self {
            Bound::Compare { column, test } => test.test(column.data(), row),
            Bound::Missing { column, expected } => column.is_missing(row) == *expected,
            Bound::And(a, b) => a.test(row) && b.test(row),
            Bound::Or(a, b) => a.test(row) || b.test(row),
            Bound::Not(p) => !p.test(row),
        }
    }
}

/// A literal encoded in the storage form of the column it is compared to
enum CellTest {
    Integer(Comparison, i64),
    /// Integer cells against a fractional literal
    IntegerAsFloat(Comparison, f64),
    Float(Comparison, f64),
    Boolean(Comparison, i8),
    /// Outcome per dictionary code, resolved once against the dictionary strings
    Category(Vec<bool>),
    LocalDate(Comparison, i32),
    LocalTime(Comparison, i32),
    LocalDateTime(Comparison, i64),
}

impl CellTest {
    fn bind(column: &Column, op: Comparison, value: &Value) -> Result<CellTest> {
        let test = match (column.data(), value) {
            (ColumnData::Integer(_), Value::Integer(v)) => CellTest::Integer(op, *v),
            (ColumnData::Integer(_), Value::Float(v)) if !v.is_nan() => CellTest::IntegerAsFloat(op, *v),
            (ColumnData::Float(_), Value::Float(v)) if !v.is_nan() => CellTest::Float(op, *v),
            (ColumnData::Float(_), Value::Integer(v)) => CellTest::Float(op, *v as f64),
            (ColumnData::Boolean(_), Value::Boolean(v)) => CellTest::Boolean(op, *v as i8),
            (ColumnData::Category { dictionary, .. }, Value::Category(literal)) => {
                CellTest::Category(
                    dictionary
                        .values()
                        .iter()
                        .map(|entry| op.matches(entry.as_str().cmp(literal.as_str())))
                        .collect(),
                )
            }
            (ColumnData::LocalDate(_), Value::LocalDate(d)) => CellTest::LocalDate(op, encode_date(*d)),
            (ColumnData::LocalTime(_), Value::LocalTime(t)) => CellTest::LocalTime(op, encode_time(*t)),
            (ColumnData::LocalDateTime(_), Value::LocalDateTime(dt)) => {
                CellTest::LocalDateTime(op, encode_date_time(*dt))
            }
            (_, Value::Missing) => {
                return Err(Error::TypeMismatch(format!(
                    "Cannot compare column '{}' {} a missing value, use is_missing",
                    column.name(),
                    op.symbol()
                )))
            }
            (data, value) => {
                return Err(Error::TypeMismatch(format!(
                    "Cannot compare {} column '{}' {} {:?}",
                    data.column_type(),
                    column.name(),
                    op.symbol(),
                    value
                )))
            }
        };
        Ok(test)
    }

    fn test(&self, data: &ColumnData, row: usize) -> bool {
        match (self, data) {
            (CellTest::Integer(op, lit), ColumnData::Integer(v)) => {
                v[row] != MISSING_INTEGER && op.matches(v[row].cmp(lit))
            }
            (CellTest::IntegerAsFloat(op, lit), ColumnData::Integer(v)) => {
                v[row] != MISSING_INTEGER && compare_f64(*op, v[row] as f64, *lit)
            }
            (CellTest::Float(op, lit), ColumnData::Float(v)) => compare_f64(*op, v[row], *lit),
            (CellTest::Boolean(op, lit), ColumnData::Boolean(v)) => {
                v[row] != MISSING_BOOLEAN && op.matches(v[row].cmp(lit))
            }
            (CellTest::Category(outcomes), ColumnData::Category { codes, .. }) => {
                codes[row] != MISSING_CATEGORY && outcomes[codes[row] as usize]
            }
            (CellTest::LocalDate(op, lit), ColumnData::LocalDate(v)) => {
                v[row] != MISSING_DATE && op.matches(v[row].cmp(lit))
            }
            (CellTest::LocalTime(op, lit), ColumnData::LocalTime(v)) => {
                v[row] != MISSING_TIME && op.matches(v[row].cmp(lit))
            }
            (CellTest::LocalDateTime(op, lit), ColumnData::LocalDateTime(v)) => {
                v[row] != MISSING_DATE_TIME && op.matches(v[row].cmp(lit))
            }
            // binding guarantees the storage matches the test
            _ => false,
        }
    }
}

/// NaN cells are missing and fail every comparison
fn compare_f64(op: Comparison, cell: f64, literal: f64) -> bool {
    cell.partial_cmp(&literal).is_some_and(|ordering| op.matches(ordering))
}

/// One flag per row of the table a predicate was evaluated against
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SelectionMask {
    bits: Vec<bool>,
}

impl SelectionMask {
    pub fn all(len: usize) -> Self {
        Self { bits: vec![true; len] }
    }

    pub fn none(len: usize) -> Self {
        Self { bits: vec![false; len] }
    }

    pub fn len(&self) -> usize {
        self.bits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bits.is_empty()
    }

    /// Whether `row` is selected; rows past the end are not
    pub fn get(&self, row: usize) -> bool {
        self.bits.get(row).copied().unwrap_or(false)
    }

    pub fn count_selected(&self) -> usize {
        self.bits.iter().filter(|&&b| b).count()
    }

    /// Selected row indices in ascending order
    pub fn selected_indices(&self) -> Vec<usize> {
        self.bits
            .iter()
            .enumerate()
            .filter_map(|(i, &b)| b.then_some(i))
            .collect()
    }

    pub fn and(&self, other: &SelectionMask) -> Result<SelectionMask> {
        self.combine(other, |a, b| a && b)
    }

    pub fn or(&self, other: &SelectionMask) -> Result<SelectionMask> {
        self.combine(other, |a, b| a || b)
    }

    pub fn negate(&self) -> SelectionMask {
        SelectionMask {
            bits: self.bits.iter().map(|b| !b).collect(),
        }
    }

    fn combine(&self, other: &SelectionMask, f: impl Fn(bool, bool) -> bool) -> Result<SelectionMask> {
        if self.len() != other.len() {
            return Err(Error::LengthMismatch {
                column: "selection mask".to_string(),
                expected: self.len(),
                actual: other.len(),
            });
        }
        Ok(SelectionMask {
            bits: self.bits.iter().zip(&other.bits).map(|(&a, &b)| f(a, b)).collect(),
        })
    }
}

impl From<Vec<bool>> for SelectionMask {
    fn from(bits: Vec<bool>) -> Self {
        Self { bits }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn table() -> Table {
        Table::from_columns(
            "t",
            vec![
                Column::categories("name", vec![Some("b"), Some("a"), None, Some("c")]),
                Column::integers("score", vec![Some(5), Some(-2), Some(5), None]),
                Column::floats("width", vec![Some(1.5), None, Some(-0.5), Some(3.0)]),
                Column::booleans("flag", vec![Some(true), Some(false), None, Some(true)]),
                Column::dates(
                    "Date",
                    vec![
                        NaiveDate::from_ymd_opt(1950, 1, 3),
                        NaiveDate::from_ymd_opt(1951, 5, 1),
                        None,
                        NaiveDate::from_ymd_opt(2014, 6, 15),
                    ],
                ),
            ],
        )
        .unwrap()
    }

    fn selected(predicate: Predicate) -> Vec<usize> {
        predicate.evaluate(&table()).unwrap().selected_indices()
    }

    #[test]
    fn test_integer_comparisons() {
        assert_eq!(selected(column("score").is_greater_than(0)), vec![0, 2]);
        assert_eq!(selected(column("score").is_equal_to(-2)), vec![1]);
        assert_eq!(selected(column("score").is_less_than_or_equal_to(5)), vec![0, 1, 2]);
        assert_eq!(selected(column("score").is_greater_than(4.5)), vec![0, 2]);
    }

    #[test]
    fn test_missing_fails_every_comparison() {
        // row 3 has a missing score
        assert_eq!(selected(column("score").is_not_equal_to(5)), vec![1]);
        assert_eq!(selected(column("score").is_missing()), vec![3]);
        assert_eq!(selected(column("score").is_not_missing()), vec![0, 1, 2]);
        assert_eq!(selected(!column("score").is_equal_to(5)), vec![1, 3]);
    }

    #[test]
    fn test_float_and_boolean() {
        assert_eq!(selected(column("width").is_greater_than(0)), vec![0, 3]);
        assert_eq!(selected(column("width").is_less_than(0.0)), vec![2]);
        assert_eq!(selected(column("flag").is_equal_to(true)), vec![0, 3]);
        assert_eq!(selected(column("flag").is_less_than(true)), vec![1]);
    }

    #[test]
    fn test_category_is_lexicographic() {
        // dictionary order is b, a, c
        assert_eq!(selected(column("name").is_less_than("b")), vec![1]);
        assert_eq!(selected(column("name").is_greater_than_or_equal_to("b")), vec![0, 3]);
        assert_eq!(selected(column("name").is_equal_to("zzz")), Vec::<usize>::new());
    }

    #[test]
    fn test_dates_are_chronological() {
        let cutoff = NaiveDate::from_ymd_opt(1951, 1, 1).unwrap();
        assert_eq!(selected(column("Date").is_greater_than(cutoff)), vec![1, 3]);
    }

    #[test]
    fn test_composition() {
        let p = column("score")
            .is_equal_to(5)
            .and(column("flag").is_equal_to(true))
            .or(column("name").is_equal_to("a"));
        assert_eq!(selected(p), vec![0, 1]);
    }

    #[test]
    fn test_binding_errors() {
        let t = table();
        assert!(matches!(
            column("nope").is_equal_to(1).evaluate(&t),
            Err(Error::ColumnNotFound(_))
        ));
        assert!(matches!(
            column("score").is_equal_to("five").evaluate(&t),
            Err(Error::TypeMismatch(_))
        ));
        assert!(matches!(
            column("score").is_equal_to(None::<i64>).evaluate(&t),
            Err(Error::TypeMismatch(_))
        ));
        // binding fails even when the bad branch would never be reached
        let p = column("score").is_greater_than(0).or(column("missing").is_missing());
        assert!(matches!(p.evaluate(&t), Err(Error::ColumnNotFound(_))));
    }

    #[test]
    fn test_mask_algebra() {
        let a = SelectionMask::from(vec![true, false, true]);
        let b = SelectionMask::from(vec![true, true, false]);

        assert_eq!(a.and(&b).unwrap().selected_indices(), vec![0]);
        assert_eq!(a.or(&b).unwrap().count_selected(), 3);
        assert_eq!(a.negate().selected_indices(), vec![1]);
        assert!(a.and(&SelectionMask::all(2)).is_err());
        assert!(!a.get(10));
    }
}
