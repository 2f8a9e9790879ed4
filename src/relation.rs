//! Abstract relational capability the file store is built on.

use rusqlite::types::Value;

use crate::error::Result;
use crate::order::OrderBy;

/// A single table in a relational backend.
///
/// One instance is bound to one table at construction time; the store never
/// names tables itself except through [`Relation::table`]. Predicates use
/// positional `?` parameters for values. Identifier fragments (column lists,
/// predicate text) are trusted input: callers must not feed them from
/// untrusted sources.
pub trait Relation: Send + Sync {
    /// The bound table name, for callers composing raw statements.
    fn table(&self) -> &str;

    /// Point lookup: the first row matching `predicate`, projected to
    /// `columns`. Returns `Ok(None)` when no row matched.
    fn select_one(
        &self,
        columns: &[&str],
        predicate: &str,
        args: &[Value],
    ) -> Result<Option<Vec<Value>>>;

    /// Every row matching `predicate`, projected to `columns` and ordered by
    /// `order` (backend order when empty). An empty predicate matches all
    /// rows.
    fn select_all(
        &self,
        columns: &[&str],
        predicate: &str,
        args: &[Value],
        order: &[OrderBy],
    ) -> Result<Vec<Vec<Value>>>;

    /// Insert-or-fully-replace by primary key. `columns` and `values` pair up
    /// positionally and must cover the whole row; an existing row with the
    /// same key is replaced, never merged.
    fn upsert(&self, columns: &[&str], values: &[Value]) -> Result<()>;

    /// `UPDATE .. SET <assignments> WHERE <predicate>`; returns the number of
    /// rows changed. With `on_conflict_replace` set, a primary-key collision
    /// caused by the update replaces the colliding row instead of failing.
    fn update_where(
        &self,
        assignments: &[(&str, Value)],
        predicate: &str,
        args: &[Value],
        on_conflict_replace: bool,
    ) -> Result<u64>;

    /// `DELETE .. WHERE <predicate>`; returns the number of rows deleted.
    /// Zero is a valid result, not an error.
    fn delete_where(&self, predicate: &str, args: &[Value]) -> Result<u64>;

    /// Raw statement execution; returns the affected-row count.
    fn execute(&self, sql: &str, args: &[Value]) -> Result<u64>;
}
