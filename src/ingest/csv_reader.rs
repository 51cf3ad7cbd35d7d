use super::parse::FieldParser;
use super::{dialect_byte, CsvConfig};
use crate::column::Column;
use crate::table::Table;
use crate::types::ColumnType;
use crate::{Error, Result};
use csv::{ReaderBuilder, Trim};
use std::collections::HashSet;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use tracing::info;

/// Reads CSV text into a [`Table`] with caller-supplied column types
#[derive(Debug, Clone)]
pub struct CsvIngester {
    column_types: Vec<ColumnType>,
    config: CsvConfig,
}

impl CsvIngester {
    pub fn new(column_types: &[ColumnType]) -> Self {
        Self {
            column_types: column_types.to_vec(),
            config: CsvConfig::default(),
        }
    }

    pub fn with_config(mut self, config: CsvConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &CsvConfig {
        &self.config
    }

    /// Read a CSV file; the table is named after the file stem
    pub fn read_path(&self, path: impl AsRef<Path>) -> Result<Table> {
        let path = path.as_ref();
        let name = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let file = File::open(path)?;
        self.read(name, BufReader::new(file))
    }

    /// Read CSV text from any reader.
    ///
    /// The header is checked against the column types before any data row is
    /// read. The first bad row aborts ingest and no partial table is returned.
    pub fn read<R: Read>(&self, name: impl Into<String>, reader: R) -> Result<Table> {
        let name = name.into();
        let mut reader = ReaderBuilder::new()
            .delimiter(dialect_byte(self.config.delimiter, "delimiter")?)
            .quote(dialect_byte(self.config.quote, "quote")?)
            .comment(
                self.config
                    .comment
                    .map(|c| dialect_byte(c, "comment"))
                    .transpose()?,
            )
            .trim(if self.config.trim { Trim::All } else { Trim::None })
            .has_headers(true)
            .flexible(true)
            .from_reader(reader);

        let headers = reader.headers()?.clone();
        if headers.is_empty() {
            return Err(Error::Config(format!("CSV input for '{}' has no header row", name)));
        }
        if headers.len() != self.column_types.len() {
            return Err(Error::Config(format!(
                "CSV header has {} columns but {} column types were given",
                headers.len(),
                self.column_types.len()
            )));
        }

        let mut seen = HashSet::with_capacity(headers.len());
        for header in headers.iter() {
            if !seen.insert(header) {
                return Err(Error::DuplicateName(header.to_string()));
            }
        }

        let mut columns: Vec<Column> = headers
            .iter()
            .zip(&self.column_types)
            .map(|(header, &column_type)| Column::new(header, column_type))
            .collect();

        let parser = FieldParser::new(&self.config);
        let expected = self.column_types.len();
        for (row, record) in reader.records().enumerate() {
            let record = record?;
            if record.len() < expected {
                return Err(Error::MalformedRow {
                    row,
                    expected,
                    found: record.len(),
                });
            }

            for ((column, &column_type), text) in
                columns.iter_mut().zip(&self.column_types).zip(record.iter())
            {
                let value = parser.parse(column_type, text).ok_or_else(|| Error::TypeParse {
                    row,
                    column: column.name().to_string(),
                    column_type,
                    text: text.to_string(),
                })?;
                column.append(&value)?;
            }
        }

        let table = Table::from_columns(name, columns)?;
        info!(
            table = %table.name(),
            rows = table.row_count(),
            columns = table.column_count(),
            "CSV ingest complete"
        );
        Ok(table)
    }
}
