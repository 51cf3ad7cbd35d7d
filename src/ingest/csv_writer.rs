use crate::ingest::{dialect_byte, CsvConfig};
use crate::table::Table;
use crate::types::Value;
use crate::{Error, Result};
use csv::WriterBuilder;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use tracing::info;

/// Write `table` as CSV with a header row, in the dialect and literal formats
/// of `config`. Missing cells become empty fields.
///
/// Fails with `TypeMismatch` on a present category value that ingest under
/// the same config would not read back unchanged: the empty string, a missing
/// token, or text with surrounding whitespace when `trim` is on.
pub(crate) fn write_csv<W: Write>(table: &Table, writer: W, config: &CsvConfig) -> Result<()> {
    let mut writer = WriterBuilder::new()
        .delimiter(dialect_byte(config.delimiter, "delimiter")?)
        .quote(dialect_byte(config.quote, "quote")?)
        .from_writer(writer);
    writer.write_record(table.column_names())?;

    let mut record: Vec<String> = Vec::with_capacity(table.column_count());
    for row in 0..table.row_count() {
        record.clear();
        for column in table.columns() {
            let value = column.value_at(row);
            if let Value::Category(text) = &value {
                check_category(text, config).map_err(|reason| {
                    Error::TypeMismatch(format!(
                        "Category '{}' in column '{}' at row {} {}",
                        text,
                        column.name(),
                        row,
                        reason
                    ))
                })?;
            }
            record.push(format_field(&value, config));
        }
        writer.write_record(&record)?;
    }

    writer.flush()?;
    Ok(())
}

fn check_category(text: &str, config: &CsvConfig) -> std::result::Result<(), &'static str> {
    if config.is_missing_token(text) {
        Err("would read back as missing; export with a config that does not treat it as a missing token")
    } else if config.trim && text.trim() != text {
        Err("has surrounding whitespace that ingest would trim")
    } else {
        Ok(())
    }
}

fn format_field(value: &Value, config: &CsvConfig) -> String {
    match value {
        Value::LocalDate(d) => d.format(&config.date_format).to_string(),
        Value::LocalTime(t) => t.format(&config.time_format).to_string(),
        Value::LocalDateTime(dt) => dt.format(&config.date_time_format).to_string(),
        other => other.to_string(),
    }
}

pub(crate) fn export_csv(table: &Table, path: &Path, config: &CsvConfig) -> Result<()> {
    let file = File::create(path)?;
    write_csv(table, BufWriter::new(file), config)?;

    info!(
        table = %table.name(),
        rows = table.row_count(),
        path = %path.display(),
        "CSV export complete"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::column::Column;
    use crate::ingest::CsvIngester;
    use crate::types::ColumnType;
    use chrono::NaiveDate;
    use tempfile::tempdir;

    fn sample() -> Table {
        Table::from_columns(
            "sample",
            vec![
                Column::categories("state", vec![Some("TX"), None, Some("a, b")]),
                Column::floats("width", vec![Some(1.5), Some(2.0), None]),
                Column::dates(
                    "Date",
                    vec![NaiveDate::from_ymd_opt(1950, 1, 3), None, NaiveDate::from_ymd_opt(2014, 6, 15)],
                ),
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_write_csv_renders_missing_as_empty() {
        let mut out = Vec::new();
        write_csv(&sample(), &mut out, &CsvConfig::default()).unwrap();
        let text = String::from_utf8(out).unwrap();

        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "state,width,Date");
        assert_eq!(lines[1], "TX,1.5,1950-01-03");
        assert_eq!(lines[2], ",2,");
        assert_eq!(lines[3], "\"a, b\",,2014-06-15");
    }

    #[test]
    fn test_export_then_ingest_reproduces_table() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("sample.csv");
        let table = sample();
        table.export_to_csv(&path).unwrap();

        let types = [ColumnType::Category, ColumnType::Float, ColumnType::LocalDate];
        let back = CsvIngester::new(&types).read_path(&path).unwrap();
        assert_eq!(back, table);
    }

    fn states(values: Vec<Option<&str>>) -> Table {
        Table::from_columns("states", vec![Column::categories("state", values)]).unwrap()
    }

    #[test]
    fn test_category_that_reads_back_as_missing_is_rejected() {
        for text in ["NA", "", "null", " TX"] {
            let table = states(vec![Some("TX"), Some(text)]);
            let mut out = Vec::new();
            let err = write_csv(&table, &mut out, &CsvConfig::default()).unwrap_err();
            assert!(matches!(err, Error::TypeMismatch(_)), "{:?} gave {:?}", text, err);
        }
    }

    #[test]
    fn test_round_trip_with_tokens_disabled() {
        let table = states(vec![Some("NA"), None, Some("N/A"), Some("x")]);
        let config = CsvConfig::default().with_missing_tokens(Vec::<String>::new());

        let mut out = Vec::new();
        write_csv(&table, &mut out, &config).unwrap();
        let back = CsvIngester::new(&[ColumnType::Category])
            .with_config(config)
            .read("states", out.as_slice())
            .unwrap();

        assert_eq!(back, table);
        assert_eq!(back.column("state").unwrap().get(0).unwrap(), Value::from("NA"));
        assert!(back.column("state").unwrap().is_missing(1));
    }

    #[test]
    fn test_write_uses_config_dialect_and_formats() {
        let config = CsvConfig {
            date_format: "%d.%m.%Y".to_string(),
            ..CsvConfig::default()
        }
        .with_delimiter(';');

        let mut out = Vec::new();
        write_csv(&sample(), &mut out, &config).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert_eq!(text.lines().nth(1), Some("TX;1.5;03.01.1950"));

        let types = [ColumnType::Category, ColumnType::Float, ColumnType::LocalDate];
        let back = CsvIngester::new(&types)
            .with_config(config)
            .read("sample", text.as_bytes())
            .unwrap();
        assert_eq!(back, sample());
    }
}
