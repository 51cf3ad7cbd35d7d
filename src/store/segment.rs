//! Column segment files.
//!
//! ```text
//! "LTCL" | type tag u8 | row count u64 | payload len u64 | payload | crc32 u32
//! ```
//!
//! All integers are little-endian. Fixed-width types store their raw cells,
//! sentinels included. A CATEGORY payload is the dictionary size (u32), each
//! entry as a u32 length plus UTF-8 bytes, then one u32 code per row. Only
//! dictionary entries referenced by a row are written.

use super::ByteReader;
use crate::column::{
    decode_date, decode_date_time, CategoryDictionary, Column, ColumnData, MISSING_BOOLEAN,
    MISSING_CATEGORY, MISSING_DATE, MISSING_DATE_TIME, MISSING_TIME,
};
use crate::types::ColumnType;
use crate::{Error, Result};
use std::path::Path;
use std::sync::Arc;

pub(crate) const SEGMENT_MAGIC: &[u8; 4] = b"LTCL";

const MILLIS_PER_DAY: i32 = 86_400_000;

/// Serialize a column into a complete segment file image
pub(crate) fn encode_segment(column: &Column) -> Vec<u8> {
    let payload = encode_payload(column.data());

    let mut out = Vec::with_capacity(payload.len() + 25);
    out.extend_from_slice(SEGMENT_MAGIC);
    out.push(column.column_type().tag());
    out.extend_from_slice(&(column.len() as u64).to_le_bytes());
    out.extend_from_slice(&(payload.len() as u64).to_le_bytes());
    out.extend_from_slice(&payload);
    out.extend_from_slice(&crc32fast::hash(&payload).to_le_bytes());
    out
}

fn encode_payload(data: &ColumnData) -> Vec<u8> {
    match data {
        ColumnData::Integer(v) => v.iter().flat_map(|x| x.to_le_bytes()).collect(),
        ColumnData::Float(v) => v.iter().flat_map(|x| x.to_le_bytes()).collect(),
        ColumnData::Boolean(v) => v.iter().map(|&x| x as u8).collect(),
        ColumnData::Category { dictionary, codes } => encode_category(dictionary, codes),
        ColumnData::LocalDate(v) | ColumnData::LocalTime(v) => {
            v.iter().flat_map(|x| x.to_le_bytes()).collect()
        }
        ColumnData::LocalDateTime(v) => v.iter().flat_map(|x| x.to_le_bytes()).collect(),
    }
}

/// A derived column may share a larger dictionary; only entries some row
/// references are written, renumbered in dictionary order.
fn encode_category(dictionary: &CategoryDictionary, codes: &[u32]) -> Vec<u8> {
    let mut remap: Vec<Option<u32>> = vec![None; dictionary.len()];
    for &code in codes {
        if let Some(slot) = remap.get_mut(code as usize) {
            *slot = Some(0);
        }
    }
    let mut kept = 0u32;
    for slot in remap.iter_mut().flatten() {
        *slot = kept;
        kept += 1;
    }

    let mut out = Vec::new();
    out.extend_from_slice(&kept.to_le_bytes());
    for (entry, _) in dictionary.values().iter().zip(&remap).filter(|(_, slot)| slot.is_some()) {
        out.extend_from_slice(&(entry.len() as u32).to_le_bytes());
        out.extend_from_slice(entry.as_bytes());
    }
    for &code in codes {
        let code = remap
            .get(code as usize)
            .copied()
            .flatten()
            .unwrap_or(MISSING_CATEGORY);
        out.extend_from_slice(&code.to_le_bytes());
    }
    out
}

/// Decode a segment image into a column named `name`.
///
/// The segment must hold `expected_type` cells and exactly `expected_rows` rows.
pub(crate) fn decode_segment(
    bytes: &[u8],
    path: &Path,
    name: &str,
    expected_type: ColumnType,
    expected_rows: usize,
    verify_checksum: bool,
) -> Result<Column> {
    let mut reader = ByteReader::new(bytes, path);
    if reader.take(4)? != SEGMENT_MAGIC {
        return Err(Error::corrupted(path, "bad segment magic"));
    }

    let tag = reader.u8()?;
    let column_type = ColumnType::from_tag(tag)
        .ok_or_else(|| Error::corrupted(path, format!("unknown type tag {}", tag)))?;
    if column_type != expected_type {
        return Err(Error::corrupted(
            path,
            format!("segment holds {} but schema says {}", column_type, expected_type),
        ));
    }

    let rows = reader.u64()? as usize;
    if rows != expected_rows {
        return Err(Error::corrupted(
            path,
            format!("segment has {} rows but schema says {}", rows, expected_rows),
        ));
    }

    let payload_len = reader.u64()? as usize;
    if payload_len != reader.remaining().saturating_sub(4) || reader.remaining() < 4 {
        return Err(Error::corrupted(path, "payload length does not match file size"));
    }
    let payload = reader.take(payload_len)?;
    let stored_crc = reader.u32()?;

    if verify_checksum {
        let actual = crc32fast::hash(payload);
        if actual != stored_crc {
            return Err(Error::ChecksumMismatch {
                expected: stored_crc,
                actual,
            });
        }
    }

    let data = decode_payload(payload, path, column_type, rows)?;
    Ok(Column::from_data(name, data))
}

fn decode_payload(payload: &[u8], path: &Path, column_type: ColumnType, rows: usize) -> Result<ColumnData> {
    let data = match column_type {
        ColumnType::Integer => ColumnData::Integer(fixed(payload, path, rows, i64::from_le_bytes)?),
        ColumnType::Float => ColumnData::Float(fixed(payload, path, rows, f64::from_le_bytes)?),
        ColumnType::Boolean => {
            let v: Vec<i8> = fixed(payload, path, rows, i8::from_le_bytes)?;
            if v.iter().any(|&x| x != 0 && x != 1 && x != MISSING_BOOLEAN) {
                return Err(Error::corrupted(path, "invalid boolean cell"));
            }
            ColumnData::Boolean(v)
        }
        ColumnType::LocalDate => {
            let v: Vec<i32> = fixed(payload, path, rows, i32::from_le_bytes)?;
            if v.iter().any(|&d| d != MISSING_DATE && decode_date(d).is_none()) {
                return Err(Error::corrupted(path, "date out of range"));
            }
            ColumnData::LocalDate(v)
        }
        ColumnType::LocalTime => {
            let v: Vec<i32> = fixed(payload, path, rows, i32::from_le_bytes)?;
            if v.iter().any(|&t| t != MISSING_TIME && !(0..MILLIS_PER_DAY).contains(&t)) {
                return Err(Error::corrupted(path, "time out of range"));
            }
            ColumnData::LocalTime(v)
        }
        ColumnType::LocalDateTime => {
            let v: Vec<i64> = fixed(payload, path, rows, i64::from_le_bytes)?;
            if v.iter().any(|&t| t != MISSING_DATE_TIME && decode_date_time(t).is_none()) {
                return Err(Error::corrupted(path, "date-time out of range"));
            }
            ColumnData::LocalDateTime(v)
        }
        ColumnType::Category => decode_category(payload, path, rows)?,
    };
    Ok(data)
}

/// Decode `rows` fixed-width little-endian cells
fn fixed<T, const N: usize>(
    payload: &[u8],
    path: &Path,
    rows: usize,
    from_le: fn([u8; N]) -> T,
) -> Result<Vec<T>> {
    if rows.checked_mul(N) != Some(payload.len()) {
        return Err(Error::corrupted(
            path,
            format!("expected {} bytes for {} rows, found {}", rows.saturating_mul(N), rows, payload.len()),
        ));
    }

    let mut out = Vec::with_capacity(rows);
    for chunk in payload.chunks_exact(N) {
        let mut cell = [0u8; N];
        cell.copy_from_slice(chunk);
        out.push(from_le(cell));
    }
    Ok(out)
}

fn decode_category(payload: &[u8], path: &Path, rows: usize) -> Result<ColumnData> {
    let mut reader = ByteReader::new(payload, path);

    let size = reader.u32()? as usize;
    let mut values = Vec::with_capacity(size.min(reader.remaining() / 4));
    for _ in 0..size {
        let len = reader.u32()? as usize;
        let bytes = reader.take(len)?;
        let entry = std::str::from_utf8(bytes)
            .map_err(|_| Error::corrupted(path, "dictionary entry is not UTF-8"))?;
        values.push(entry.to_string());
    }
    let dictionary = CategoryDictionary::from_values(values)
        .ok_or_else(|| Error::corrupted(path, "duplicate dictionary entry"))?;

    let codes: Vec<u32> = fixed(reader.rest(), path, rows, u32::from_le_bytes)?;
    if let Some(bad) = codes
        .iter()
        .find(|&&c| c != MISSING_CATEGORY && c as usize >= dictionary.len())
    {
        return Err(Error::corrupted(
            path,
            format!("code {} outside dictionary of {}", bad, dictionary.len()),
        ));
    }

    Ok(ColumnData::Category {
        dictionary: Arc::new(dictionary),
        codes,
    })
}
