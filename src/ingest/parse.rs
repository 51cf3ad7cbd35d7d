use super::CsvConfig;
use crate::column::MISSING_INTEGER;
use crate::types::{ColumnType, Value, DEFAULT_DATE_TIME_FORMAT};
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};

const TRUE_TOKENS: [&str; 11] = ["true", "True", "TRUE", "t", "T", "yes", "Yes", "YES", "y", "Y", "1"];
const FALSE_TOKENS: [&str; 11] = ["false", "False", "FALSE", "f", "F", "no", "No", "NO", "n", "N", "0"];

/// Space-separated fallback accepted alongside the default date-time format
const SPACED_DATE_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f";

/// Parses raw CSV fields into typed values
pub(crate) struct FieldParser<'a> {
    config: &'a CsvConfig,
}

impl<'a> FieldParser<'a> {
    pub(crate) fn new(config: &'a CsvConfig) -> Self {
        Self { config }
    }

    /// Parse one field.
    ///
    /// Returns `Some(Value::Missing)` for an empty field or missing token and
    /// `None` when the text is not a valid literal of `column_type`.
    pub(crate) fn parse(&self, column_type: ColumnType, text: &str) -> Option<Value> {
        if self.config.is_missing_token(text) {
            return Some(Value::Missing);
        }

        match column_type {
            ColumnType::Integer => match text.parse::<i64>() {
                // reserved as the missing sentinel
                Ok(MISSING_INTEGER) | Err(_) => None,
                Ok(v) => Some(Value::Integer(v)),
            },
            ColumnType::Float => text.parse::<f64>().ok().map(Value::from),
            ColumnType::Boolean => parse_boolean(text).map(Value::Boolean),
            ColumnType::Category => Some(Value::Category(text.to_string())),
            ColumnType::LocalDate => NaiveDate::parse_from_str(text, &self.config.date_format)
                .ok()
                .map(Value::LocalDate),
            ColumnType::LocalTime => NaiveTime::parse_from_str(text, &self.config.time_format)
                .ok()
                .map(Value::LocalTime),
            ColumnType::LocalDateTime => self.parse_date_time(text).map(Value::LocalDateTime),
        }
    }

    fn parse_date_time(&self, text: &str) -> Option<NaiveDateTime> {
        let format = self.config.date_time_format.as_str();
        match NaiveDateTime::parse_from_str(text, format) {
            Ok(dt) => Some(dt),
            Err(_) if format == DEFAULT_DATE_TIME_FORMAT => {
                NaiveDateTime::parse_from_str(text, SPACED_DATE_TIME_FORMAT).ok()
            }
            Err(_) => None,
        }
    }
}

fn parse_boolean(text: &str) -> Option<bool> {
    if TRUE_TOKENS.contains(&text) {
        Some(true)
    } else if FALSE_TOKENS.contains(&text) {
        Some(false)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(column_type: ColumnType, text: &str) -> Option<Value> {
        let config = CsvConfig::default();
        FieldParser::new(&config).parse(column_type, text)
    }

    #[test]
    fn test_integers() {
        assert_eq!(parse(ColumnType::Integer, "-42"), Some(Value::Integer(-42)));
        assert_eq!(parse(ColumnType::Integer, "+7"), Some(Value::Integer(7)));
        assert_eq!(parse(ColumnType::Integer, ""), Some(Value::Missing));
        assert_eq!(parse(ColumnType::Integer, "NA"), Some(Value::Missing));
        assert_eq!(parse(ColumnType::Integer, "4.5"), None);
        assert_eq!(parse(ColumnType::Integer, "-9223372036854775808"), None);
    }

    #[test]
    fn test_floats() {
        assert_eq!(parse(ColumnType::Float, "2.5"), Some(Value::Float(2.5)));
        assert_eq!(parse(ColumnType::Float, "1e3"), Some(Value::Float(1000.0)));
        assert_eq!(parse(ColumnType::Float, "NaN"), Some(Value::Missing));
        assert_eq!(parse(ColumnType::Float, "wide"), None);
    }

    #[test]
    fn test_booleans() {
        for token in TRUE_TOKENS {
            assert_eq!(parse(ColumnType::Boolean, token), Some(Value::Boolean(true)));
        }
        for token in FALSE_TOKENS {
            assert_eq!(parse(ColumnType::Boolean, token), Some(Value::Boolean(false)));
        }
        assert_eq!(parse(ColumnType::Boolean, "maybe"), None);
    }

    #[test]
    fn test_temporal_formats() {
        let date = NaiveDate::from_ymd_opt(1950, 1, 3).unwrap();
        assert_eq!(parse(ColumnType::LocalDate, "1950-01-03"), Some(Value::LocalDate(date)));
        assert_eq!(parse(ColumnType::LocalDate, "01/03/1950"), None);

        let time = NaiveTime::from_hms_milli_opt(11, 0, 0, 250).unwrap();
        assert_eq!(parse(ColumnType::LocalTime, "11:00:00.250"), Some(Value::LocalTime(time)));
        assert_eq!(
            parse(ColumnType::LocalTime, "11:00:00"),
            Some(Value::LocalTime(NaiveTime::from_hms_opt(11, 0, 0).unwrap()))
        );

        let stamp = date.and_hms_opt(11, 0, 0).unwrap();
        assert_eq!(
            parse(ColumnType::LocalDateTime, "1950-01-03T11:00:00"),
            Some(Value::LocalDateTime(stamp))
        );
        assert_eq!(
            parse(ColumnType::LocalDateTime, "1950-01-03 11:00:00"),
            Some(Value::LocalDateTime(stamp))
        );
    }

    #[test]
    fn test_custom_date_format() {
        let config = CsvConfig {
            date_format: "%m/%d/%Y".to_string(),
            ..CsvConfig::default()
        };
        let parser = FieldParser::new(&config);
        assert_eq!(
            parser.parse(ColumnType::LocalDate, "01/03/1950"),
            Some(Value::LocalDate(NaiveDate::from_ymd_opt(1950, 1, 3).unwrap()))
        );
    }

    #[test]
    fn test_categories_keep_text() {
        assert_eq!(parse(ColumnType::Category, "TX"), Some(Value::from("TX")));
        assert_eq!(parse(ColumnType::Category, "*"), Some(Value::Missing));
    }
}
