//! SQLite-backed [`Relation`] implementation.

use std::path::Path;
use std::sync::Arc;

use parking_lot::Mutex;
use rusqlite::types::Value;
use rusqlite::{params_from_iter, Connection};

use crate::error::{Result, StoreError};
use crate::order::{self, OrderBy};
use crate::relation::Relation;

impl From<rusqlite::Error> for StoreError {
    fn from(err: rusqlite::Error) -> Self {
        StoreError::backend(err)
    }
}

/// A file table in a SQLite database.
pub struct SqliteRelation {
    conn: Arc<Mutex<Connection>>,
    table: String,
}

impl SqliteRelation {
    /// Open (or create) the database at `path` and bind to `table`, creating
    /// the table and its indexes when missing.
    pub fn open(path: impl AsRef<Path>, table: &str) -> Result<Self> {
        let conn = Connection::open(path)?;
        Self::from_conn(conn, table)
    }

    /// In-memory database, for tests and ephemeral stores.
    pub fn open_in_memory(table: &str) -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Self::from_conn(conn, table)
    }

    fn from_conn(conn: Connection, table: &str) -> Result<Self> {
        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA synchronous  = NORMAL;",
        )?;
        Self::init_schema(&conn, table)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            table: table.to_string(),
        })
    }

    fn init_schema(conn: &Connection, table: &str) -> Result<()> {
        conn.execute_batch(&format!(
            "CREATE TABLE IF NOT EXISTS {t} (
                id    TEXT PRIMARY KEY,
                name  TEXT NOT NULL,
                ext   TEXT NOT NULL,
                tag   TEXT NOT NULL DEFAULT '',
                size  INTEGER NOT NULL,
                time  INTEGER NOT NULL,
                data  BLOB NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_{t}_tag  ON {t}(tag);
            CREATE INDEX IF NOT EXISTS idx_{t}_time ON {t}(time);",
            t = table,
        ))?;
        tracing::debug!(table, "file table ready");
        Ok(())
    }
}

impl Relation for SqliteRelation {
    fn table(&self) -> &str {
        &self.table
    }

    fn select_one(
        &self,
        columns: &[&str],
        predicate: &str,
        args: &[Value],
    ) -> Result<Option<Vec<Value>>> {
        let conn = self.conn.lock();
        let sql = format!(
            "SELECT {} FROM {} WHERE {}",
            columns.join(", "),
            self.table,
            predicate
        );
        let mut stmt = conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(args.iter()))?;
        match rows.next()? {
            Some(row) => Ok(Some(row_values(row, columns.len())?)),
            None => Ok(None),
        }
    }

    fn select_all(
        &self,
        columns: &[&str],
        predicate: &str,
        args: &[Value],
        order: &[OrderBy],
    ) -> Result<Vec<Vec<Value>>> {
        let conn = self.conn.lock();
        let mut sql = format!("SELECT {} FROM {}", columns.join(", "), self.table);
        if !predicate.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(predicate);
        }
        if !order.is_empty() {
            sql.push_str(" ORDER BY ");
            sql.push_str(&order::sql_clause(order));
        }
        let mut stmt = conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(args.iter()))?;
        let mut out = Vec::new();
        while let Some(row) = rows.next()? {
            out.push(row_values(row, columns.len())?);
        }
        Ok(out)
    }

    fn upsert(&self, columns: &[&str], values: &[Value]) -> Result<()> {
        let conn = self.conn.lock();
        let marks = vec!["?"; columns.len()].join(", ");
        let sql = format!(
            "INSERT OR REPLACE INTO {} ({}) VALUES ({})",
            self.table,
            columns.join(", "),
            marks
        );
        conn.execute(&sql, params_from_iter(values.iter()))?;
        Ok(())
    }

    fn update_where(
        &self,
        assignments: &[(&str, Value)],
        predicate: &str,
        args: &[Value],
        on_conflict_replace: bool,
    ) -> Result<u64> {
        let conn = self.conn.lock();
        let set: Vec<String> = assignments.iter().map(|(c, _)| format!("{c} = ?")).collect();
        let verb = if on_conflict_replace {
            "UPDATE OR REPLACE"
        } else {
            "UPDATE"
        };
        let sql = format!(
            "{verb} {} SET {} WHERE {}",
            self.table,
            set.join(", "),
            predicate
        );
        let mut stmt = conn.prepare(&sql)?;
        let params: Vec<&Value> = assignments
            .iter()
            .map(|(_, v)| v)
            .chain(args.iter())
            .collect();
        let changed = stmt.execute(params_from_iter(params))?;
        Ok(changed as u64)
    }

    fn delete_where(&self, predicate: &str, args: &[Value]) -> Result<u64> {
        let conn = self.conn.lock();
        let sql = format!("DELETE FROM {} WHERE {}", self.table, predicate);
        let deleted = conn.execute(&sql, params_from_iter(args.iter()))?;
        Ok(deleted as u64)
    }

    fn execute(&self, sql: &str, args: &[Value]) -> Result<u64> {
        let conn = self.conn.lock();
        let affected = conn.execute(sql, params_from_iter(args.iter()))?;
        Ok(affected as u64)
    }
}

fn row_values(row: &rusqlite::Row<'_>, n: usize) -> Result<Vec<Value>> {
    let mut values = Vec::with_capacity(n);
    for i in 0..n {
        values.push(row.get::<_, Value>(i)?);
    }
    Ok(values)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rel() -> SqliteRelation {
        SqliteRelation::open_in_memory("files").unwrap()
    }

    fn row(id: &str, tag: &str, time: i64) -> Vec<Value> {
        vec![
            Value::Text(id.into()),
            Value::Text(format!("{id}.txt")),
            Value::Text(".txt".into()),
            Value::Text(tag.into()),
            Value::Integer(3),
            Value::Integer(time),
            Value::Blob(b"abc".to_vec()),
        ]
    }

    const COLS: &[&str] = &["id", "name", "ext", "tag", "size", "time", "data"];

    #[test]
    fn upsert_replaces_whole_row() {
        let r = rel();
        r.upsert(COLS, &row("a", "x", 1)).unwrap();
        r.upsert(COLS, &row("a", "y", 2)).unwrap();

        let found = r
            .select_one(&["tag", "time"], "id = ?", &[Value::Text("a".into())])
            .unwrap()
            .unwrap();
        assert_eq!(found, vec![Value::Text("y".into()), Value::Integer(2)]);
    }

    #[test]
    fn select_one_missing_is_none() {
        let r = rel();
        let found = r
            .select_one(&["id"], "id = ?", &[Value::Text("nope".into())])
            .unwrap();
        assert!(found.is_none());
    }

    #[test]
    fn select_all_applies_order_directives() {
        let r = rel();
        r.upsert(COLS, &row("a", "", 3)).unwrap();
        r.upsert(COLS, &row("b", "", 1)).unwrap();
        r.upsert(COLS, &row("c", "", 2)).unwrap();

        let rows = r
            .select_all(&["id"], "", &[], &order::resolve("-time", &[]))
            .unwrap();
        let ids: Vec<Value> = rows.into_iter().flatten().collect();
        assert_eq!(
            ids,
            vec![
                Value::Text("a".into()),
                Value::Text("c".into()),
                Value::Text("b".into()),
            ]
        );
    }

    #[test]
    fn update_where_reports_changed_rows() {
        let r = rel();
        r.upsert(COLS, &row("a", "old", 1)).unwrap();

        let changed = r
            .update_where(
                &[("tag", Value::Text("new".into()))],
                "id = ?",
                &[Value::Text("a".into())],
                false,
            )
            .unwrap();
        assert_eq!(changed, 1);

        let changed = r
            .update_where(
                &[("tag", Value::Text("new".into()))],
                "id = ?",
                &[Value::Text("missing".into())],
                false,
            )
            .unwrap();
        assert_eq!(changed, 0);
    }

    #[test]
    fn delete_where_counts() {
        let r = rel();
        r.upsert(COLS, &row("a", "t", 1)).unwrap();
        r.upsert(COLS, &row("b", "t", 2)).unwrap();

        let deleted = r
            .delete_where("tag = ?", &[Value::Text("t".into())])
            .unwrap();
        assert_eq!(deleted, 2);

        let deleted = r
            .delete_where("tag = ?", &[Value::Text("t".into())])
            .unwrap();
        assert_eq!(deleted, 0);
    }

    #[test]
    fn reopen_persists_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.db");

        let r = SqliteRelation::open(&path, "files").unwrap();
        r.upsert(COLS, &row("a", "", 1)).unwrap();
        drop(r);

        let r = SqliteRelation::open(&path, "files").unwrap();
        let found = r
            .select_one(&["id"], "id = ?", &[Value::Text("a".into())])
            .unwrap();
        assert!(found.is_some());
    }
}
