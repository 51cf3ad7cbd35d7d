//! The `schema.bin` file of a saved table.
//!
//! ```text
//! "LTSC" | version u32 | payload len u32 | bincode(TableSchema) | crc32 u32
//! ```

use super::ByteReader;
use crate::types::ColumnType;
use crate::{Error, Result};
use bincode::{Decode, Encode};
use std::path::Path;

pub(crate) const SCHEMA_MAGIC: &[u8; 4] = b"LTSC";
pub(crate) const FORMAT_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Encode, Decode)]
pub struct TableSchema {
    pub name: String,
    pub row_count: u64,
    pub columns: Vec<ColumnSchema>,
}

#[derive(Debug, Clone, PartialEq, Encode, Decode)]
pub struct ColumnSchema {
    pub name: String,
    pub column_type: ColumnType,
    /// Segment file name, relative to the table directory
    pub file: String,
}

impl TableSchema {
    pub(crate) fn encode(&self) -> Result<Vec<u8>> {
        let payload = bincode::encode_to_vec(self, bincode::config::standard())
            .map_err(|e| Error::Serialization(e.to_string()))?;

        let mut out = Vec::with_capacity(payload.len() + 16);
        out.extend_from_slice(SCHEMA_MAGIC);
        out.extend_from_slice(&FORMAT_VERSION.to_le_bytes());
        out.extend_from_slice(&(payload.len() as u32).to_le_bytes());
        out.extend_from_slice(&payload);
        out.extend_from_slice(&crc32fast::hash(&payload).to_le_bytes());
        Ok(out)
    }

    pub(crate) fn decode(bytes: &[u8], path: &Path, verify_checksum: bool) -> Result<Self> {
        let mut reader = ByteReader::new(bytes, path);
        if reader.take(4)? != SCHEMA_MAGIC {
            return Err(Error::corrupted(path, "bad schema magic"));
        }

        let version = reader.u32()?;
        if version != FORMAT_VERSION {
            return Err(Error::corrupted(path, format!("unsupported format version {}", version)));
        }

        let len = reader.u32()? as usize;
        let payload = reader.take(len)?;
        let stored_crc = reader.u32()?;
        if reader.remaining() != 0 {
            return Err(Error::corrupted(path, "trailing bytes after schema"));
        }

        if verify_checksum {
            let actual = crc32fast::hash(payload);
            if actual != stored_crc {
                return Err(Error::ChecksumMismatch {
                    expected: stored_crc,
                    actual,
                });
            }
        }

        let (schema, read): (TableSchema, usize) =
            bincode::decode_from_slice(payload, bincode::config::standard())
                .map_err(|e| Error::corrupted(path, format!("undecodable schema: {}", e)))?;
        if read != payload.len() {
            return Err(Error::corrupted(path, "schema payload has trailing bytes"));
        }

        schema.validate(path)?;
        Ok(schema)
    }

    /// Segment files must be plain names inside the table directory
    fn validate(&self, path: &Path) -> Result<()> {
        for column in &self.columns {
            let file = column.file.as_str();
            if file.is_empty() || file.contains(['/', '\\']) || file == "." || file == ".." {
                return Err(Error::corrupted(path, format!("invalid segment file name '{}'", file)));
            }
        }
        Ok(())
    }
}

/// Segment file name for the column at `index`
pub(crate) fn segment_file_name(index: usize) -> String {
    format!("c{:05}.col", index)
}
