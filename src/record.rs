//! Stored file record types and filename derivation.

use chrono::{DateTime, TimeZone, Utc};
use rusqlite::types::Value;
use serde::{Deserialize, Serialize};

use crate::error::{Result, StoreError};

/// Columns of a metadata-only projection, in decode order. The payload
/// column is deliberately absent so it is never transferred for stat-style
/// lookups.
pub(crate) const META_COLUMNS: &[&str] = &["id", "name", "ext", "tag", "size", "time"];

/// Columns of a full-record projection, in decode order.
pub(crate) const RECORD_COLUMNS: &[&str] = &["id", "name", "ext", "tag", "size", "time", "data"];

/// Metadata view of a stored file. Carries no payload; use
/// [`FileStore::read_payload`](crate::FileStore::read_payload) or a handle
/// from [`FileStore::open`](crate::FileStore::open) for content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileMetadata {
    /// Caller-chosen unique identity, may encode a path-like key.
    pub id: String,
    /// Display filename, the base name of the path supplied at save time.
    pub name: String,
    /// Lower-cased extension of `name`, leading dot kept; empty if none.
    pub ext: String,
    /// Classification label, empty when unset.
    pub tag: String,
    /// Payload length in bytes, recomputed on every save.
    pub size: u64,
    /// Caller-supplied timestamp, independent of storage insertion time.
    pub time: DateTime<Utc>,
}

/// A full stored row, payload included.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileRecord {
    pub id: String,
    pub name: String,
    pub ext: String,
    pub tag: String,
    pub size: u64,
    pub time: DateTime<Utc>,
    pub data: Vec<u8>,
}

impl FileMetadata {
    /// Decode a row projected with [`META_COLUMNS`].
    pub(crate) fn from_values(values: Vec<Value>) -> Result<Self> {
        let mut values = values.into_iter();
        Ok(FileMetadata {
            id: take_text(values.next())?,
            name: take_text(values.next())?,
            ext: take_text(values.next())?,
            tag: take_text(values.next())?,
            size: take_integer(values.next())? as u64,
            time: decode_time(take_integer(values.next())?)?,
        })
    }
}

impl FileRecord {
    /// Decode a row projected with [`RECORD_COLUMNS`].
    pub(crate) fn from_values(values: Vec<Value>) -> Result<Self> {
        let mut values = values.into_iter();
        Ok(FileRecord {
            id: take_text(values.next())?,
            name: take_text(values.next())?,
            ext: take_text(values.next())?,
            tag: take_text(values.next())?,
            size: take_integer(values.next())? as u64,
            time: decode_time(take_integer(values.next())?)?,
            data: take_blob(values.next())?,
        })
    }

    /// Drop the payload, keeping the metadata view.
    pub fn into_metadata(self) -> FileMetadata {
        FileMetadata {
            id: self.id,
            name: self.name,
            ext: self.ext,
            tag: self.tag,
            size: self.size,
            time: self.time,
        }
    }
}

/// Split a path-like filename into its base name and lower-cased extension.
/// The extension keeps its leading dot and is empty when the base name has
/// no dot at all.
pub(crate) fn name_and_ext(filename: &str) -> (String, String) {
    let base = filename.rsplit(['/', '\\']).next().unwrap_or(filename);
    let ext = match base.rfind('.') {
        Some(idx) => base[idx..].to_lowercase(),
        None => String::new(),
    };
    (base.to_string(), ext)
}

fn take_text(value: Option<Value>) -> Result<String> {
    match value {
        Some(Value::Text(s)) => Ok(s),
        other => Err(decode_error("TEXT", other)),
    }
}

fn take_integer(value: Option<Value>) -> Result<i64> {
    match value {
        Some(Value::Integer(n)) => Ok(n),
        other => Err(decode_error("INTEGER", other)),
    }
}

fn take_blob(value: Option<Value>) -> Result<Vec<u8>> {
    match value {
        Some(Value::Blob(b)) => Ok(b),
        other => Err(decode_error("BLOB", other)),
    }
}

fn decode_time(millis: i64) -> Result<DateTime<Utc>> {
    Utc.timestamp_millis_opt(millis)
        .single()
        .ok_or_else(|| StoreError::Backend(format!("timestamp out of range: {millis}").into()))
}

fn decode_error(expected: &str, got: Option<Value>) -> StoreError {
    StoreError::Backend(format!("expected {expected} column, got {got:?}").into())
}
