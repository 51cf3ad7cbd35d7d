//! Binary table store.
//!
//! A saved table is a directory `<name>.saw/` holding a `schema.bin` and one
//! segment file per column. Segments are written first and the schema last,
//! so a directory without a readable schema is never mistaken for a table.

pub mod schema;
mod segment;

pub use schema::{ColumnSchema, TableSchema};

use crate::table::Table;
use crate::{Error, Result};
use schema::segment_file_name;
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

pub const SCHEMA_FILE: &str = "schema.bin";
pub const TABLE_DIR_EXTENSION: &str = "saw";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Check every crc32 on load
    pub verify_checksums: bool,
    /// fsync each file after writing it
    pub sync: bool,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            verify_checksums: true,
            sync: false,
        }
    }
}

impl StoreConfig {
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)?;
        serde_json::from_str(&text)
            .map_err(|e| Error::Config(format!("Invalid store config {}: {}", path.display(), e)))
    }
}

/// Save with the default [`StoreConfig`]
pub fn save(table: &Table, dir: impl AsRef<Path>) -> Result<PathBuf> {
    save_with_config(table, dir, &StoreConfig::default())
}

/// Write `table` under `dir` and return the table directory
pub fn save_with_config(table: &Table, dir: impl AsRef<Path>, config: &StoreConfig) -> Result<PathBuf> {
    let table_dir = dir
        .as_ref()
        .join(format!("{}.{}", sanitize_file_name(table.name()), TABLE_DIR_EXTENSION));
    fs::create_dir_all(&table_dir)?;

    let mut columns = Vec::with_capacity(table.column_count());
    for (index, column) in table.columns().enumerate() {
        let file = segment_file_name(index);
        write_file(&table_dir.join(&file), &segment::encode_segment(column), config.sync)?;
        columns.push(ColumnSchema {
            name: column.name().to_string(),
            column_type: column.column_type(),
            file,
        });
    }

    let schema = TableSchema {
        name: table.name().to_string(),
        row_count: table.row_count() as u64,
        columns,
    };
    write_file(&table_dir.join(SCHEMA_FILE), &schema.encode()?, config.sync)?;

    info!(
        table = %table.name(),
        rows = table.row_count(),
        columns = table.column_count(),
        path = %table_dir.display(),
        "table saved"
    );
    Ok(table_dir)
}

/// Load with the default [`StoreConfig`]
pub fn load(path: impl AsRef<Path>) -> Result<Table> {
    load_with_config(path, &StoreConfig::default())
}

/// Read a table directory written by [`save`]
pub fn load_with_config(path: impl AsRef<Path>, config: &StoreConfig) -> Result<Table> {
    let table_dir = path.as_ref();
    if !config.verify_checksums {
        warn!(path = %table_dir.display(), "loading table with checksum verification disabled");
    }

    let schema_path = table_dir.join(SCHEMA_FILE);
    let schema = TableSchema::decode(&fs::read(&schema_path)?, &schema_path, config.verify_checksums)?;
    let rows = usize::try_from(schema.row_count)
        .map_err(|_| Error::corrupted(&schema_path, "row count does not fit in memory"))?;

    let mut columns = Vec::with_capacity(schema.columns.len());
    for column in &schema.columns {
        let segment_path = table_dir.join(&column.file);
        let bytes = fs::read(&segment_path)?;
        columns.push(segment::decode_segment(
            &bytes,
            &segment_path,
            &column.name,
            column.column_type,
            rows,
            config.verify_checksums,
        )?);
    }

    let table = Table::from_columns(schema.name, columns)?;
    info!(
        table = %table.name(),
        rows = table.row_count(),
        columns = table.column_count(),
        path = %table_dir.display(),
        "table loaded"
    );
    Ok(table)
}

fn write_file(path: &Path, bytes: &[u8], sync: bool) -> Result<()> {
    let mut file = File::create(path)?;
    file.write_all(bytes)?;
    if sync {
        file.sync_all()?;
    }
    Ok(())
}

/// Table names become directory names: anything outside `[A-Za-z0-9._-]` turns into `_`
pub(crate) fn sanitize_file_name(name: &str) -> String {
    let cleaned: String = name
        .trim()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect();

    if cleaned.is_empty() || cleaned.chars().all(|c| c == '.') {
        "table".to_string()
    } else {
        cleaned
    }
}

/// Bounds-checked little-endian cursor over a file image
pub(crate) struct ByteReader<'a> {
    buf: &'a [u8],
    pos: usize,
    path: &'a Path,
}

impl<'a> ByteReader<'a> {
    pub(crate) fn new(buf: &'a [u8], path: &'a Path) -> Self {
        Self { buf, pos: 0, path }
    }

    pub(crate) fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    pub(crate) fn take(&mut self, n: usize) -> Result<&'a [u8]> {
        if n > self.remaining() {
            return Err(Error::corrupted(
                self.path,
                format!("truncated: wanted {} bytes at offset {}, {} left", n, self.pos, self.remaining()),
            ));
        }
        let slice = &self.buf[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    /// Everything not yet consumed
    pub(crate) fn rest(&mut self) -> &'a [u8] {
        let slice = &self.buf[self.pos..];
        self.pos = self.buf.len();
        slice
    }

    pub(crate) fn u8(&mut self) -> Result<u8> {
        Ok(self.take(1)?[0])
    }

    pub(crate) fn u32(&mut self) -> Result<u32> {
        let mut bytes = [0u8; 4];
        bytes.copy_from_slice(self.take(4)?);
        Ok(u32::from_le_bytes(bytes))
    }

    pub(crate) fn u64(&mut self) -> Result<u64> {
        let mut bytes = [0u8; 8];
        bytes.copy_from_slice(self.take(8)?);
        Ok(u64::from_le_bytes(bytes))
    }
}
