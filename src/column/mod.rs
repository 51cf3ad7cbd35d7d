//! Typed column storage.
//!
//! A [`Column`] is a named, single-typed sequence of cells. Storage is a closed
//! variant over primitive vectors ([`ColumnData`]); a missing cell is encoded as
//! a reserved per-type sentinel rather than wrapped in `Option`, which keeps
//! every column a flat homogeneous buffer:
//!
//! | type            | storage                      | missing             |
//! |-----------------|------------------------------|---------------------|
//! | INTEGER         | `i64`                        | [`MISSING_INTEGER`] |
//! | FLOAT           | `f64`                        | NaN                 |
//! | BOOLEAN         | `i8`                         | [`MISSING_BOOLEAN`] |
//! | CATEGORY        | `u32` dictionary code        | [`MISSING_CATEGORY`]|
//! | LOCAL_DATE      | `i32` days from CE           | [`MISSING_DATE`]    |
//! | LOCAL_TIME      | `i32` millis from midnight   | [`MISSING_TIME`]    |
//! | LOCAL_DATE_TIME | `i64` millis from Unix epoch | [`MISSING_DATE_TIME`]|
//!
//! Columns are mutable only until they are published into a
//! [`Table`](crate::Table); after that they sit behind an `Arc` and are replaced
//! wholesale, never edited in place.

pub mod category;
mod stats;
mod temporal;

pub use category::CategoryDictionary;
pub use stats::Stats;
pub use temporal::TemporalField;

pub(crate) use stats::{mean, median, variance};

use crate::types::{ColumnType, Value};
use crate::{Error, Result};
use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use std::collections::HashSet;
use std::sync::Arc;

pub const MISSING_INTEGER: i64 = i64::MIN;
pub const MISSING_BOOLEAN: i8 = i8::MIN;
pub const MISSING_CATEGORY: u32 = u32::MAX;
pub const MISSING_DATE: i32 = i32::MIN;
pub const MISSING_TIME: i32 = i32::MIN;
pub const MISSING_DATE_TIME: i64 = i64::MIN;

/// Raw column storage
#[derive(Debug, Clone)]
pub enum ColumnData {
    Integer(Vec<i64>),
    Float(Vec<f64>),
    Boolean(Vec<i8>),
    Category {
        dictionary: Arc<CategoryDictionary>,
        codes: Vec<u32>,
    },
    LocalDate(Vec<i32>),
    LocalTime(Vec<i32>),
    LocalDateTime(Vec<i64>),
}

impl ColumnData {
    fn empty(column_type: ColumnType, capacity: usize) -> Self {
        match column_type {
            ColumnType::Integer => ColumnData::Integer(Vec::with_capacity(capacity)),
            ColumnType::Float => ColumnData::Float(Vec::with_capacity(capacity)),
            ColumnType::Boolean => ColumnData::Boolean(Vec::with_capacity(capacity)),
            ColumnType::Category => ColumnData::Category {
                dictionary: Arc::new(CategoryDictionary::new()),
                codes: Vec::with_capacity(capacity),
            },
            ColumnType::LocalDate => ColumnData::LocalDate(Vec::with_capacity(capacity)),
            ColumnType::LocalTime => ColumnData::LocalTime(Vec::with_capacity(capacity)),
            ColumnType::LocalDateTime => ColumnData::LocalDateTime(Vec::with_capacity(capacity)),
        }
    }

    pub fn column_type(&self) -> ColumnType {
        match self {
            ColumnData::Integer(_) => ColumnType::Integer,
            ColumnData::Float(_) => ColumnType::Float,
            ColumnData::Boolean(_) => ColumnType::Boolean,
            ColumnData::Category { .. } => ColumnType::Category,
            ColumnData::LocalDate(_) => ColumnType::LocalDate,
            ColumnData::LocalTime(_) => ColumnType::LocalTime,
            ColumnData::LocalDateTime(_) => ColumnType::LocalDateTime,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            ColumnData::Integer(v) => v.len(),
            ColumnData::Float(v) => v.len(),
            ColumnData::Boolean(v) => v.len(),
            ColumnData::Category { codes, .. } => codes.len(),
            ColumnData::LocalDate(v) => v.len(),
            ColumnData::LocalTime(v) => v.len(),
            ColumnData::LocalDateTime(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A named, single-typed column
#[derive(Debug, Clone)]
pub struct Column {
    name: String,
    data: ColumnData,
}

impl Column {
    /// Create an empty column
    pub fn new(name: impl Into<String>, column_type: ColumnType) -> Self {
        Self::with_capacity(name, column_type, 0)
    }

    pub fn with_capacity(name: impl Into<String>, column_type: ColumnType, capacity: usize) -> Self {
        Self {
            name: name.into(),
            data: ColumnData::empty(column_type, capacity),
        }
    }

    /// Build a column from decoded values, type-checking each one
    pub fn from_values<I>(name: impl Into<String>, column_type: ColumnType, values: I) -> Result<Self>
    where
        I: IntoIterator<Item = Value>,
    {
        let values = values.into_iter();
        let mut column = Self::with_capacity(name, column_type, values.size_hint().0);
        for value in values {
            column.append(&value)?;
        }
        Ok(column)
    }

    /// `Some(i64::MIN)` is stored as the missing sentinel, the same as `None`.
    /// Use [`Column::from_values`] to reject it instead.
    pub fn integers<I: IntoIterator<Item = Option<i64>>>(name: impl Into<String>, values: I) -> Self {
        let data = values
            .into_iter()
            .map(|v| v.unwrap_or(MISSING_INTEGER))
            .collect();
        Self::from_data(name, ColumnData::Integer(data))
    }

    pub fn floats<I: IntoIterator<Item = Option<f64>>>(name: impl Into<String>, values: I) -> Self {
        let data = values.into_iter().map(|v| v.unwrap_or(f64::NAN)).collect();
        Self::from_data(name, ColumnData::Float(data))
    }

    pub fn booleans<I: IntoIterator<Item = Option<bool>>>(name: impl Into<String>, values: I) -> Self {
        let data = values.into_iter().map(encode_boolean).collect();
        Self::from_data(name, ColumnData::Boolean(data))
    }

    pub fn categories<I, S>(name: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = Option<S>>,
        S: AsRef<str>,
    {
        let mut dictionary = CategoryDictionary::new();
        let codes = values
            .into_iter()
            .map(|v| match v {
                Some(s) => dictionary.intern(s.as_ref()),
                None => MISSING_CATEGORY,
            })
            .collect();
        Self::from_data(
            name,
            ColumnData::Category {
                dictionary: Arc::new(dictionary),
                codes,
            },
        )
    }

    pub fn dates<I: IntoIterator<Item = Option<NaiveDate>>>(name: impl Into<String>, values: I) -> Self {
        let data = values
            .into_iter()
            .map(|v| v.map_or(MISSING_DATE, encode_date))
            .collect();
        Self::from_data(name, ColumnData::LocalDate(data))
    }

    pub fn times<I: IntoIterator<Item = Option<NaiveTime>>>(name: impl Into<String>, values: I) -> Self {
        let data = values
            .into_iter()
            .map(|v| v.map_or(MISSING_TIME, encode_time))
            .collect();
        Self::from_data(name, ColumnData::LocalTime(data))
    }

    pub fn date_times<I: IntoIterator<Item = Option<NaiveDateTime>>>(
        name: impl Into<String>,
        values: I,
    ) -> Self {
        let data = values
            .into_iter()
            .map(|v| v.map_or(MISSING_DATE_TIME, encode_date_time))
            .collect();
        Self::from_data(name, ColumnData::LocalDateTime(data))
    }

    pub(crate) fn from_data(name: impl Into<String>, data: ColumnData) -> Self {
        Self {
            name: name.into(),
            data,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Consume the column and return it under a new name
    pub fn renamed(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub(crate) fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    pub fn column_type(&self) -> ColumnType {
        self.data.column_type()
    }

    pub fn data(&self) -> &ColumnData {
        &self.data
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Value at `index`, or [`Value::Missing`] for a missing cell.
    pub fn get(&self, index: usize) -> Result<Value> {
        if index >= self.len() {
            return Err(Error::IndexOutOfRange {
                index,
                len: self.len(),
            });
        }
        Ok(self.value_at(index))
    }

    /// Whether the cell at `index` holds the missing sentinel.
    ///
    /// Panics if `index >= len()`, like slice indexing.
    pub fn is_missing(&self, index: usize) -> bool {
        match &self.data {
            ColumnData::Integer(v) => v[index] == MISSING_INTEGER,
            ColumnData::Float(v) => v[index].is_nan(),
            ColumnData::Boolean(v) => v[index] == MISSING_BOOLEAN,
            ColumnData::Category { codes, .. } => codes[index] == MISSING_CATEGORY,
            ColumnData::LocalDate(v) => v[index] == MISSING_DATE,
            ColumnData::LocalTime(v) => v[index] == MISSING_TIME,
            ColumnData::LocalDateTime(v) => v[index] == MISSING_DATE_TIME,
        }
    }

    pub fn missing_count(&self) -> usize {
        (0..self.len()).filter(|&i| self.is_missing(i)).count()
    }

    /// Number of distinct present values
    pub fn unique_count(&self) -> usize {
        match &self.data {
            ColumnData::Integer(v) => distinct(v.iter().filter(|&&x| x != MISSING_INTEGER)),
            ColumnData::Float(v) => distinct(v.iter().filter(|x| !x.is_nan()).map(|x| x.to_bits())),
            ColumnData::Boolean(v) => distinct(v.iter().filter(|&&x| x != MISSING_BOOLEAN)),
            ColumnData::Category { codes, .. } => {
                distinct(codes.iter().filter(|&&c| c != MISSING_CATEGORY))
            }
            ColumnData::LocalDate(v) => distinct(v.iter().filter(|&&x| x != MISSING_DATE)),
            ColumnData::LocalTime(v) => distinct(v.iter().filter(|&&x| x != MISSING_TIME)),
            ColumnData::LocalDateTime(v) => {
                distinct(v.iter().filter(|&&x| x != MISSING_DATE_TIME))
            }
        }
    }

    /// Append a value, checking it against the column type.
    ///
    /// Integers widen into `FLOAT` columns; [`Value::Missing`] appends the sentinel.
    /// `i64::MIN` is reserved as the `INTEGER` sentinel and is rejected.
    pub fn append(&mut self, value: &Value) -> Result<()> {
        if value.is_missing() {
            self.append_missing();
            return Ok(());
        }

        match (&mut self.data, value) {
            (ColumnData::Integer(_), Value::Integer(MISSING_INTEGER)) => {
                return Err(Error::TypeMismatch(format!(
                    "{} is reserved for missing cells in INTEGER column '{}'",
                    MISSING_INTEGER, self.name
                )))
            }
            (ColumnData::Integer(v), Value::Integer(x)) => v.push(*x),
            (ColumnData::Float(v), Value::Float(x)) => v.push(*x),
            (ColumnData::Float(v), Value::Integer(x)) => v.push(*x as f64),
            (ColumnData::Boolean(v), Value::Boolean(x)) => v.push(encode_boolean(Some(*x))),
            (ColumnData::Category { dictionary, codes }, Value::Category(s)) => {
                let code = Arc::make_mut(dictionary).intern(s);
                codes.push(code);
            }
            (ColumnData::LocalDate(v), Value::LocalDate(d)) => v.push(encode_date(*d)),
            (ColumnData::LocalTime(v), Value::LocalTime(t)) => v.push(encode_time(*t)),
            (ColumnData::LocalDateTime(v), Value::LocalDateTime(dt)) => {
                v.push(encode_date_time(*dt))
            }
            (data, value) => {
                return Err(Error::TypeMismatch(format!(
                    "Cannot append {:?} to {} column '{}'",
                    value,
                    data.column_type(),
                    self.name
                )))
            }
        }
        Ok(())
    }

    pub fn append_missing(&mut self) {
        match &mut self.data {
            ColumnData::Integer(v) => v.push(MISSING_INTEGER),
            ColumnData::Float(v) => v.push(f64::NAN),
            ColumnData::Boolean(v) => v.push(MISSING_BOOLEAN),
            ColumnData::Category { codes, .. } => codes.push(MISSING_CATEGORY),
            ColumnData::LocalDate(v) => v.push(MISSING_DATE),
            ColumnData::LocalTime(v) => v.push(MISSING_TIME),
            ColumnData::LocalDateTime(v) => v.push(MISSING_DATE_TIME),
        }
    }

    /// All cells as decoded values
    pub fn values(&self) -> impl Iterator<Item = Value> + '_ {
        (0..self.len()).map(move |i| self.value_at(i))
    }

    /// Decode the cell at `index`; the caller guarantees `index < len()`.
    pub(crate) fn value_at(&self, index: usize) -> Value {
        match &self.data {
            ColumnData::Integer(v) => match v[index] {
                MISSING_INTEGER => Value::Missing,
                x => Value::Integer(x),
            },
            ColumnData::Float(v) => Value::from(v[index]),
            ColumnData::Boolean(v) => match v[index] {
                MISSING_BOOLEAN => Value::Missing,
                x => Value::Boolean(x != 0),
            },
            ColumnData::Category { dictionary, codes } => dictionary
                .get(codes[index])
                .map_or(Value::Missing, |s| Value::Category(s.to_string())),
            ColumnData::LocalDate(v) => decode_date(v[index]).map_or(Value::Missing, Value::LocalDate),
            ColumnData::LocalTime(v) => decode_time(v[index]).map_or(Value::Missing, Value::LocalTime),
            ColumnData::LocalDateTime(v) => {
                decode_date_time(v[index]).map_or(Value::Missing, Value::LocalDateTime)
            }
        }
    }

    /// Gather the rows at `indices` into a new column of the same name and type.
    ///
    /// Category columns share their dictionary with the result.
    pub(crate) fn take(&self, indices: &[usize]) -> Column {
        let data = match &self.data {
            ColumnData::Integer(v) => ColumnData::Integer(gather(v, indices)),
            ColumnData::Float(v) => ColumnData::Float(gather(v, indices)),
            ColumnData::Boolean(v) => ColumnData::Boolean(gather(v, indices)),
            ColumnData::Category { dictionary, codes } => ColumnData::Category {
                dictionary: Arc::clone(dictionary),
                codes: gather(codes, indices),
            },
            ColumnData::LocalDate(v) => ColumnData::LocalDate(gather(v, indices)),
            ColumnData::LocalTime(v) => ColumnData::LocalTime(gather(v, indices)),
            ColumnData::LocalDateTime(v) => ColumnData::LocalDateTime(gather(v, indices)),
        };
        Column::from_data(self.name.clone(), data)
    }
}

impl PartialEq for Column {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
            && self.column_type() == other.column_type()
            && self.len() == other.len()
            && (0..self.len()).all(|i| self.value_at(i) == other.value_at(i))
    }
}

fn gather<T: Copy>(values: &[T], indices: &[usize]) -> Vec<T> {
    indices.iter().map(|&i| values[i]).collect()
}

fn distinct<T: Eq + std::hash::Hash, I: Iterator<Item = T>>(values: I) -> usize {
    values.collect::<HashSet<T>>().len()
}

fn encode_boolean(value: Option<bool>) -> i8 {
    match value {
        Some(true) => 1,
        Some(false) => 0,
        None => MISSING_BOOLEAN,
    }
}

pub(crate) fn encode_date(date: NaiveDate) -> i32 {
    date.num_days_from_ce()
}

pub(crate) fn decode_date(days: i32) -> Option<NaiveDate> {
    if days == MISSING_DATE {
        return None;
    }
    NaiveDate::from_num_days_from_ce_opt(days)
}

/// Milliseconds from midnight; sub-millisecond precision is truncated.
pub(crate) fn encode_time(time: NaiveTime) -> i32 {
    let millis = (time.nanosecond() / 1_000_000).min(999);
    (time.num_seconds_from_midnight() * 1000 + millis) as i32
}

pub(crate) fn decode_time(millis: i32) -> Option<NaiveTime> {
    if millis < 0 {
        return None;
    }
    let secs = (millis / 1000) as u32;
    let nanos = (millis % 1000) as u32 * 1_000_000;
    NaiveTime::from_num_seconds_from_midnight_opt(secs, nanos)
}

/// Milliseconds from the Unix epoch; sub-millisecond precision is truncated.
pub(crate) fn encode_date_time(date_time: NaiveDateTime) -> i64 {
    date_time.and_utc().timestamp_millis()
}

pub(crate) fn decode_date_time(millis: i64) -> Option<NaiveDateTime> {
    if millis == MISSING_DATE_TIME {
        return None;
    }
    DateTime::from_timestamp_millis(millis).map(|dt| dt.naive_utc())
}
