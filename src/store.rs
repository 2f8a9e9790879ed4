//! Identity-keyed blob storage over an abstract relation.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use rusqlite::types::Value;

use crate::error::{Result, StoreError};
use crate::handle::StoreFile;
use crate::order;
use crate::record::{self, FileMetadata, FileRecord, META_COLUMNS, RECORD_COLUMNS};
use crate::relation::Relation;

/// Identity-keyed blob store bound to one table of a backing relation.
///
/// Every operation is a single request against the relation; there is no
/// in-process locking, caching or retrying, and consistency is whatever the
/// backend provides per statement. Clones are cheap and share the relation.
#[derive(Clone)]
pub struct FileStore {
    rel: Arc<dyn Relation>,
}

impl FileStore {
    pub fn new(rel: Arc<dyn Relation>) -> Self {
        Self { rel }
    }

    /// Open a file handle: metadata is fetched now, the payload lazily on
    /// the handle's first read. Fails with [`StoreError::NotFound`] when no
    /// record with this id exists.
    pub fn open(&self, id: &str) -> Result<StoreFile> {
        let meta = self.find_metadata(id)?;
        Ok(StoreFile::new(self.clone(), meta))
    }

    /// Point lookup of metadata. The payload column is never fetched.
    pub fn find_metadata(&self, id: &str) -> Result<FileMetadata> {
        match self.rel.select_one(META_COLUMNS, "id = ?", &[text(id)])? {
            Some(values) => FileMetadata::from_values(values),
            None => Err(StoreError::NotFound(id.to_string())),
        }
    }

    /// True when a record with this id exists.
    pub fn exists(&self, id: &str) -> Result<bool> {
        Ok(self.rel.select_one(&["id"], "id = ?", &[text(id)])?.is_some())
    }

    /// Insert or fully replace the record `id`. `name` and `ext` derive from
    /// `filename`, `size` from the payload length; an existing record is
    /// replaced wholesale, never field-merged. A `None` or empty tag stores
    /// the empty string.
    pub fn save(
        &self,
        id: &str,
        filename: &str,
        time: DateTime<Utc>,
        data: Vec<u8>,
        tag: Option<&str>,
    ) -> Result<FileMetadata> {
        let (name, ext) = record::name_and_ext(filename);
        let meta = FileMetadata {
            id: id.to_string(),
            name,
            ext,
            tag: tag.unwrap_or("").to_string(),
            size: data.len() as u64,
            time,
        };
        tracing::debug!(id, size = meta.size, "save file");
        self.rel.upsert(
            RECORD_COLUMNS,
            &[
                text(&meta.id),
                text(&meta.name),
                text(&meta.ext),
                text(&meta.tag),
                Value::Integer(meta.size as i64),
                millis(meta.time),
                Value::Blob(data),
            ],
        )?;
        Ok(meta)
    }

    /// Fetch the stored payload. Fails with [`StoreError::NotFound`] when no
    /// record with this id exists.
    pub fn read_payload(&self, id: &str) -> Result<Vec<u8>> {
        match self.rel.select_one(RECORD_COLUMNS, "id = ?", &[text(id)])? {
            Some(values) => Ok(FileRecord::from_values(values)?.data),
            None => Err(StoreError::NotFound(id.to_string())),
        }
    }

    /// Duplicate `src` as `dst`, replacing any existing `dst`. The copy is a
    /// single set-based statement against the relation, so `src` cannot
    /// disappear between a read and a write; its absence is detected from
    /// the affected-row count. An explicit non-empty `tag` overrides the
    /// source's tag on the duplicate.
    pub fn copy(&self, src: &str, dst: &str, tag: Option<&str>) -> Result<()> {
        let t = self.rel.table();
        let (sql, args) = match tag.filter(|s| !s.is_empty()) {
            None => (
                format!(
                    "INSERT OR REPLACE INTO {t} (id, name, ext, tag, size, time, data) \
                     SELECT ?, name, ext, tag, size, time, data FROM {t} WHERE id = ?"
                ),
                vec![text(dst), text(src)],
            ),
            Some(tag) => (
                format!(
                    "INSERT OR REPLACE INTO {t} (id, name, ext, tag, size, time, data) \
                     SELECT ?, name, ext, ?, size, time, data FROM {t} WHERE id = ?"
                ),
                vec![text(dst), text(tag), text(src)],
            ),
        };
        if self.rel.execute(&sql, &args)? == 0 {
            return Err(StoreError::NotFound(src.to_string()));
        }
        Ok(())
    }

    /// Rename `src` to `dst` in place: a logical identity change, not a byte
    /// copy. All other fields are untouched unless a non-empty `tag`
    /// override is supplied. An existing `dst` is replaced atomically.
    /// Fails with [`StoreError::NotFound`] when no record matched `src`.
    pub fn rename(&self, src: &str, dst: &str, tag: Option<&str>) -> Result<()> {
        let mut assignments: Vec<(&str, Value)> = vec![("id", text(dst))];
        if let Some(tag) = tag.filter(|s| !s.is_empty()) {
            assignments.push(("tag", text(tag)));
        }
        let changed = self
            .rel
            .update_where(&assignments, "id = ?", &[text(src)], true)?;
        if changed == 0 {
            return Err(StoreError::NotFound(src.to_string()));
        }
        Ok(())
    }

    /// Delete at most one record. Absence of a match is not an error.
    pub fn delete(&self, id: &str) -> Result<()> {
        self.rel.delete_where("id = ?", &[text(id)])?;
        Ok(())
    }

    /// Bulk delete by identity set; returns the number of records removed.
    pub fn delete_many(&self, ids: &[&str]) -> Result<u64> {
        if ids.is_empty() {
            return Ok(0);
        }
        let marks = vec!["?"; ids.len()].join(", ");
        let args: Vec<Value> = ids.iter().map(|id| text(id)).collect();
        self.rel.delete_where(&format!("id IN ({marks})"), &args)
    }

    /// Delete every record whose id starts with `prefix`.
    pub fn delete_prefix(&self, prefix: &str) -> Result<u64> {
        self.rel
            .delete_where("id LIKE ? ESCAPE '\\'", &[text(&starts_like(prefix))])
    }

    /// Delete every record with an exact tag match.
    pub fn delete_tagged(&self, tag: &str) -> Result<u64> {
        self.rel.delete_where("tag = ?", &[text(tag)])
    }

    /// Delete every record whose time is strictly earlier than `cutoff`.
    pub fn delete_before(&self, cutoff: DateTime<Utc>) -> Result<u64> {
        self.rel.delete_where("time < ?", &[millis(cutoff)])
    }

    /// Delete every record matching `prefix` whose time is strictly earlier
    /// than `cutoff`.
    pub fn delete_prefix_before(&self, prefix: &str, cutoff: DateTime<Utc>) -> Result<u64> {
        self.rel.delete_where(
            "id LIKE ? ESCAPE '\\' AND time < ?",
            &[text(&starts_like(prefix)), millis(cutoff)],
        )
    }

    /// Delete every record tagged `tag` whose time is strictly earlier than
    /// `cutoff`.
    pub fn delete_tagged_before(&self, tag: &str, cutoff: DateTime<Utc>) -> Result<u64> {
        self.rel
            .delete_where("tag = ? AND time < ?", &[text(tag), millis(cutoff)])
    }

    /// Delete by a caller-supplied predicate fragment with positional args.
    /// The fragment is passed through verbatim; it must come from trusted
    /// code.
    pub fn delete_where(&self, predicate: &str, args: &[Value]) -> Result<u64> {
        self.rel.delete_where(predicate, args)
    }

    /// Unconditional full-table delete via a direct statement, skipping
    /// row-level predicate machinery.
    pub fn delete_all(&self) -> Result<u64> {
        tracing::warn!(table = self.rel.table(), "deleting all files");
        self.rel
            .execute(&format!("DELETE FROM {}", self.rel.table()), &[])
    }

    /// Clear the table and reclaim its storage. Unlike [`delete_all`] this
    /// also vacuums the backing database and cannot be rolled back; treat it
    /// as a privileged maintenance operation.
    ///
    /// [`delete_all`]: FileStore::delete_all
    pub fn truncate(&self) -> Result<()> {
        tracing::warn!(table = self.rel.table(), "truncating file table");
        self.rel
            .execute(&format!("DELETE FROM {}", self.rel.table()), &[])?;
        self.rel.execute("VACUUM", &[])?;
        Ok(())
    }

    /// Metadata-only listing, optionally restricted to an id prefix. `order`
    /// is a user sort string resolved against an `id` tie-break default, so
    /// the result order is always deterministic.
    pub fn list(&self, prefix: Option<&str>, order: &str) -> Result<Vec<FileMetadata>> {
        let directives = order::resolve(order, &["id"]);
        let rows = match prefix {
            Some(p) => self.rel.select_all(
                META_COLUMNS,
                "id LIKE ? ESCAPE '\\'",
                &[text(&starts_like(p))],
                &directives,
            )?,
            None => self.rel.select_all(META_COLUMNS, "", &[], &directives)?,
        };
        rows.into_iter().map(FileMetadata::from_values).collect()
    }
}

/// LIKE pattern matching ids that start with `prefix`, with `%`, `_` and
/// the escape character itself neutralized.
fn starts_like(prefix: &str) -> String {
    let mut pattern = String::with_capacity(prefix.len() + 1);
    for c in prefix.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

fn text(s: &str) -> Value {
    Value::Text(s.to_string())
}

fn millis(time: DateTime<Utc>) -> Value {
    Value::Integer(time.timestamp_millis())
}
