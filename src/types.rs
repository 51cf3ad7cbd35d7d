//! Column types and cell values.
//!
//! Every column carries exactly one [`ColumnType`] for its whole life. Cells are
//! surfaced to callers as [`Value`]s; the columns themselves store primitive
//! encodings with a per-type missing sentinel (see [`crate::column`]).

use crate::{Error, Result};
use bincode::{Decode, Encode};
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

/// Default literal format for `LOCAL_DATE` cells.
pub const DEFAULT_DATE_FORMAT: &str = "%Y-%m-%d";
/// Default literal format for `LOCAL_TIME` cells. Fractional seconds are optional.
pub const DEFAULT_TIME_FORMAT: &str = "%H:%M:%S%.f";
/// Default literal format for `LOCAL_DATE_TIME` cells. Fractional seconds are optional.
pub const DEFAULT_DATE_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f";

/// Logical type of a column
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Encode, Decode,
)]
pub enum ColumnType {
    Integer,
    Float,
    Boolean,
    Category,
    LocalDate,
    LocalTime,
    LocalDateTime,
}

impl ColumnType {
    pub const ALL: [ColumnType; 7] = [
        ColumnType::Integer,
        ColumnType::Float,
        ColumnType::Boolean,
        ColumnType::Category,
        ColumnType::LocalDate,
        ColumnType::LocalTime,
        ColumnType::LocalDateTime,
    ];

    /// Upper-case name used in structure tables and config files
    pub fn name(&self) -> &'static str {
        match self {
            ColumnType::Integer => "INTEGER",
            ColumnType::Float => "FLOAT",
            ColumnType::Boolean => "BOOLEAN",
            ColumnType::Category => "CATEGORY",
            ColumnType::LocalDate => "LOCAL_DATE",
            ColumnType::LocalTime => "LOCAL_TIME",
            ColumnType::LocalDateTime => "LOCAL_DATE_TIME",
        }
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, ColumnType::Integer | ColumnType::Float)
    }

    pub fn is_temporal(&self) -> bool {
        matches!(
            self,
            ColumnType::LocalDate | ColumnType::LocalTime | ColumnType::LocalDateTime
        )
    }

    /// Stable one-byte tag used by the binary store
    pub(crate) fn tag(&self) -> u8 {
        match self {
            ColumnType::Integer => 1,
            ColumnType::Float => 2,
            ColumnType::Boolean => 3,
            ColumnType::Category => 4,
            ColumnType::LocalDate => 5,
            ColumnType::LocalTime => 6,
            ColumnType::LocalDateTime => 7,
        }
    }

    pub(crate) fn from_tag(tag: u8) -> Option<Self> {
        ColumnType::ALL.into_iter().find(|t| t.tag() == tag)
    }

    /// Parse a comma separated list of type names, e.g. `"LOCAL_DATE, INTEGER"`.
    pub fn parse_list(text: &str) -> Result<Vec<ColumnType>> {
        text.split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(ColumnType::from_str)
            .collect()
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ColumnType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let normalized = s.trim().to_ascii_uppercase();
        ColumnType::ALL
            .into_iter()
            .find(|t| t.name() == normalized)
            .ok_or_else(|| Error::Config(format!("Unknown column type '{}'", s)))
    }
}

/// A single cell, decoded from its column storage
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Missing,
    Integer(i64),
    Float(f64),
    Boolean(bool),
    Category(String),
    LocalDate(NaiveDate),
    LocalTime(NaiveTime),
    LocalDateTime(NaiveDateTime),
}

impl Value {
    pub fn is_missing(&self) -> bool {
        matches!(self, Value::Missing)
    }

    /// The column type this value naturally belongs to; `None` for missing.
    pub fn column_type(&self) -> Option<ColumnType> {
        match self {
            Value::Missing => None,
            Value::Integer(_) => Some(ColumnType::Integer),
            Value::Float(_) => Some(ColumnType::Float),
            Value::Boolean(_) => Some(ColumnType::Boolean),
            Value::Category(_) => Some(ColumnType::Category),
            Value::LocalDate(_) => Some(ColumnType::LocalDate),
            Value::LocalTime(_) => Some(ColumnType::LocalTime),
            Value::LocalDateTime(_) => Some(ColumnType::LocalDateTime),
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Integer(v) => Some(*v as f64),
            Value::Float(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Category(s) => Some(s),
            _ => None,
        }
    }

    /// Order two present values of compatible types.
    ///
    /// Integers and floats compare numerically with each other. Returns `None`
    /// when either side is missing or the types are unrelated.
    pub fn compare(&self, other: &Value) -> Option<Ordering> {
        match (self, other) {
            (Value::Integer(a), Value::Integer(b)) => Some(a.cmp(b)),
            (Value::Float(a), Value::Float(b)) => Some(a.total_cmp(b)),
            (Value::Integer(a), Value::Float(b)) => Some((*a as f64).total_cmp(b)),
            (Value::Float(a), Value::Integer(b)) => Some(a.total_cmp(&(*b as f64))),
            (Value::Boolean(a), Value::Boolean(b)) => Some(a.cmp(b)),
            (Value::Category(a), Value::Category(b)) => Some(a.cmp(b)),
            (Value::LocalDate(a), Value::LocalDate(b)) => Some(a.cmp(b)),
            (Value::LocalTime(a), Value::LocalTime(b)) => Some(a.cmp(b)),
            (Value::LocalDateTime(a), Value::LocalDateTime(b)) => Some(a.cmp(b)),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Missing => Ok(()),
            Value::Integer(v) => write!(f, "{}", v),
            Value::Float(v) => write!(f, "{}", v),
            Value::Boolean(v) => write!(f, "{}", v),
            Value::Category(v) => f.write_str(v),
            Value::LocalDate(v) => write!(f, "{}", v.format(DEFAULT_DATE_FORMAT)),
            Value::LocalTime(v) => write!(f, "{}", v.format(DEFAULT_TIME_FORMAT)),
            Value::LocalDateTime(v) => write!(f, "{}", v.format(DEFAULT_DATE_TIME_FORMAT)),
        }
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Integer(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Integer(v as i64)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        if v.is_nan() {
            Value::Missing
        } else {
            Value::Float(v)
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Boolean(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Category(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Category(v)
    }
}

impl From<NaiveDate> for Value {
    fn from(v: NaiveDate) -> Self {
        Value::LocalDate(v)
    }
}

impl From<NaiveTime> for Value {
    fn from(v: NaiveTime) -> Self {
        Value::LocalTime(v)
    }
}

impl From<NaiveDateTime> for Value {
    fn from(v: NaiveDateTime) -> Self {
        Value::LocalDateTime(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Missing, Into::into)
    }
}
