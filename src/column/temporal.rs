//! Fields derived from date, time and date-time columns.

use super::Column;
use crate::types::{ColumnType, Value};
use crate::{Error, Result};
use chrono::{Datelike, NaiveDate, NaiveTime, Timelike};

const MONTH_NAMES: [&str; 12] = [
    "JANUARY",
    "FEBRUARY",
    "MARCH",
    "APRIL",
    "MAY",
    "JUNE",
    "JULY",
    "AUGUST",
    "SEPTEMBER",
    "OCTOBER",
    "NOVEMBER",
    "DECEMBER",
];

const DAY_NAMES: [&str; 7] = [
    "MONDAY",
    "TUESDAY",
    "WEDNESDAY",
    "THURSDAY",
    "FRIDAY",
    "SATURDAY",
    "SUNDAY",
];

/// A calendar or clock field extracted from a temporal column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TemporalField {
    Year,
    /// Upper-case month name, as a category
    Month,
    /// Month number, 1-12
    MonthValue,
    DayOfMonth,
    DayOfYear,
    /// Upper-case day name, as a category
    DayOfWeek,
    /// ISO day number, Monday = 1
    DayOfWeekValue,
    Hour,
    Minute,
    Second,
    MinuteOfDay,
}

impl TemporalField {
    pub fn label(&self) -> &'static str {
        match self {
            TemporalField::Year => "year",
            TemporalField::Month => "month",
            TemporalField::MonthValue => "month value",
            TemporalField::DayOfMonth => "day of month",
            TemporalField::DayOfYear => "day of year",
            TemporalField::DayOfWeek => "day of week",
            TemporalField::DayOfWeekValue => "day of week value",
            TemporalField::Hour => "hour",
            TemporalField::Minute => "minute",
            TemporalField::Second => "second",
            TemporalField::MinuteOfDay => "minute of day",
        }
    }

    pub fn output_type(&self) -> ColumnType {
        match self {
            TemporalField::Month | TemporalField::DayOfWeek => ColumnType::Category,
            _ => ColumnType::Integer,
        }
    }

    fn is_date_field(&self) -> bool {
        !matches!(
            self,
            TemporalField::Hour
                | TemporalField::Minute
                | TemporalField::Second
                | TemporalField::MinuteOfDay
        )
    }

    /// Whether the field can be extracted from a column of `column_type`
    pub fn supports(&self, column_type: ColumnType) -> bool {
        match column_type {
            ColumnType::LocalDate => self.is_date_field(),
            ColumnType::LocalTime => !self.is_date_field(),
            ColumnType::LocalDateTime => true,
            _ => false,
        }
    }

    fn from_date(&self, date: NaiveDate) -> Value {
        match self {
            TemporalField::Year => Value::Integer(date.year() as i64),
            TemporalField::Month => Value::from(MONTH_NAMES[date.month0() as usize]),
            TemporalField::MonthValue => Value::Integer(date.month() as i64),
            TemporalField::DayOfMonth => Value::Integer(date.day() as i64),
            TemporalField::DayOfYear => Value::Integer(date.ordinal() as i64),
            TemporalField::DayOfWeek => {
                Value::from(DAY_NAMES[date.weekday().num_days_from_monday() as usize])
            }
            TemporalField::DayOfWeekValue => {
                Value::Integer(date.weekday().number_from_monday() as i64)
            }
            _ => Value::Missing,
        }
    }

    fn from_time(&self, time: NaiveTime) -> Value {
        match self {
            TemporalField::Hour => Value::Integer(time.hour() as i64),
            TemporalField::Minute => Value::Integer(time.minute() as i64),
            TemporalField::Second => Value::Integer(time.second() as i64),
            TemporalField::MinuteOfDay => Value::Integer((time.hour() * 60 + time.minute()) as i64),
            _ => Value::Missing,
        }
    }
}

impl Column {
    /// Derive a new column holding `field` for every row.
    ///
    /// The result is named `"<source> <field label>"`, has the same length, and
    /// carries missing wherever the source is missing.
    pub fn derive_field(&self, field: TemporalField) -> Result<Column> {
        if !field.supports(self.column_type()) {
            return Err(Error::TypeMismatch(format!(
                "Cannot derive {} from {} column '{}'",
                field.label(),
                self.column_type(),
                self.name()
            )));
        }

        let mut derived = Column::with_capacity(
            format!("{} {}", self.name(), field.label()),
            field.output_type(),
            self.len(),
        );
        for value in self.values() {
            let out = match value {
                Value::LocalDate(date) => field.from_date(date),
                Value::LocalTime(time) => field.from_time(time),
                Value::LocalDateTime(dt) if field.is_date_field() => field.from_date(dt.date()),
                Value::LocalDateTime(dt) => field.from_time(dt.time()),
                _ => Value::Missing,
            };
            derived.append(&out)?;
        }
        Ok(derived)
    }

    pub fn month(&self) -> Result<Column> {
        self.derive_field(TemporalField::Month)
    }

    pub fn day_of_week(&self) -> Result<Column> {
        self.derive_field(TemporalField::DayOfWeek)
    }

    pub fn year(&self) -> Result<Column> {
        self.derive_field(TemporalField::Year)
    }
}
