//! tablefs: relational-table-backed blob storage with filesystem-like
//! semantics.
//!
//! Two independent pieces share this crate:
//!
//! - [`FileStore`], an identity-keyed blob store over an abstract
//!   [`Relation`] capability: open/save/copy/rename plus a family of
//!   predicate-based bulk deletes, with a [`SqliteRelation`] backend.
//! - the [`order`] resolver, which merges a user-supplied sort string with
//!   caller defaults into deterministic, duplicate-free `ORDER BY`
//!   directives.
//!
//! ```no_run
//! use std::sync::Arc;
//! use chrono::Utc;
//! use tablefs::{FileStore, SqliteRelation};
//!
//! # fn main() -> tablefs::Result<()> {
//! let rel = Arc::new(SqliteRelation::open("files.db", "files")?);
//! let store = FileStore::new(rel);
//!
//! store.save("reports/2026/q2", "Q2 Report.pdf", Utc::now(), vec![1, 2, 3], None)?;
//! let meta = store.find_metadata("reports/2026/q2")?;
//! assert_eq!(meta.ext, ".pdf");
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod handle;
pub mod order;
pub mod record;
pub mod relation;
pub mod sqlite;
pub mod store;

pub use error::{Result, StoreError};
pub use handle::{StoreFile, VirtualFile};
pub use order::{resolve, OrderBy};
pub use record::{FileMetadata, FileRecord};
pub use relation::Relation;
pub use sqlite::SqliteRelation;
pub use store::FileStore;
