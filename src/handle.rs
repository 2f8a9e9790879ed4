//! Generic file-handle capability over the store.

use std::fmt;
use std::io::{self, Read};

use crate::error::StoreError;
use crate::record::FileMetadata;
use crate::store::FileStore;

/// Capability contract for open files: stat-like metadata access plus a
/// payload stream. Generic file-serving code should accept `impl VirtualFile`
/// so any backing store can be consumed polymorphically.
pub trait VirtualFile: Read {
    fn metadata(&self) -> &FileMetadata;
}

/// An open file: stat-like metadata plus a lazily fetched payload stream.
///
/// The payload is not transferred until the first `read` call, so handles
/// that are only ever stat'ed never touch the data column. A record deleted
/// between open and first read surfaces as a `NotFound` io error.
pub struct StoreFile {
    store: FileStore,
    meta: FileMetadata,
    payload: Option<io::Cursor<Vec<u8>>>,
}

impl StoreFile {
    pub(crate) fn new(store: FileStore, meta: FileMetadata) -> Self {
        Self {
            store,
            meta,
            payload: None,
        }
    }

    /// Stat-like metadata access.
    pub fn metadata(&self) -> &FileMetadata {
        &self.meta
    }
}

impl fmt::Debug for StoreFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StoreFile")
            .field("meta", &self.meta)
            .field("payload_loaded", &self.payload.is_some())
            .finish_non_exhaustive()
    }
}

impl VirtualFile for StoreFile {
    fn metadata(&self) -> &FileMetadata {
        StoreFile::metadata(self)
    }
}

impl Read for StoreFile {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if self.payload.is_none() {
            let data = self
                .store
                .read_payload(&self.meta.id)
                .map_err(into_io_error)?;
            self.payload = Some(io::Cursor::new(data));
        }
        match self.payload.as_mut() {
            Some(cursor) => cursor.read(buf),
            None => Ok(0),
        }
    }
}

fn into_io_error(err: StoreError) -> io::Error {
    match err {
        StoreError::NotFound(_) => io::Error::new(io::ErrorKind::NotFound, err),
        StoreError::Backend(_) => io::Error::other(err),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::{TimeZone, Utc};

    use super::*;
    use crate::sqlite::SqliteRelation;

    fn store() -> FileStore {
        FileStore::new(Arc::new(SqliteRelation::open_in_memory("files").unwrap()))
    }

    #[test]
    fn handle_streams_payload() {
        let s = store();
        let time = Utc.timestamp_opt(1, 0).unwrap();
        s.save("a", "a.bin", time, vec![0u8; 1024], None).unwrap();

        let mut file = s.open("a").unwrap();
        let mut first = [0u8; 100];
        file.read_exact(&mut first).unwrap();

        let mut rest = Vec::new();
        file.read_to_end(&mut rest).unwrap();
        assert_eq!(rest.len(), 924);
    }

    #[test]
    fn deleted_between_open_and_read_is_not_found() {
        let s = store();
        let time = Utc.timestamp_opt(1, 0).unwrap();
        s.save("a", "a.bin", time, b"x".to_vec(), None).unwrap();

        let mut file = s.open("a").unwrap();
        s.delete("a").unwrap();

        let mut buf = Vec::new();
        let err = file.read_to_end(&mut buf).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }
}
