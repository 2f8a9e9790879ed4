//! End-to-end lifecycle over the public API: save, copy, rename, retention
//! deletes and ordered listing against a file-backed SQLite database.

use std::io::Read;
use std::sync::Arc;

use chrono::{TimeZone, Utc};
use tablefs::{order, FileStore, SqliteRelation};

#[test]
fn full_lifecycle() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("files.db");
    let store = FileStore::new(Arc::new(SqliteRelation::open(&path, "files").unwrap()));

    let t0 = Utc.timestamp_opt(1_000, 0).unwrap();
    let t1 = Utc.timestamp_opt(2_000, 0).unwrap();

    // Save derives name, extension and size.
    let meta = store
        .save("a", "inbox/report.PDF", t0, vec![1, 2, 3, 4, 5], None)
        .unwrap();
    assert_eq!(meta.name, "report.PDF");
    assert_eq!(meta.ext, ".pdf");
    assert_eq!(meta.size, 5);

    // Copy detaches from its source.
    store.copy("a", "b", None).unwrap();
    store.delete("a").unwrap();
    assert_eq!(store.read_payload("b").unwrap(), vec![1, 2, 3, 4, 5]);

    // Rename destroys the old identity and keeps the metadata.
    store.rename("b", "c", Some("archived")).unwrap();
    assert!(store.open("b").unwrap_err().is_not_found());

    let mut file = store.open("c").unwrap();
    assert_eq!(file.metadata().name, "report.PDF");
    assert_eq!(file.metadata().tag, "archived");
    let mut payload = Vec::new();
    file.read_to_end(&mut payload).unwrap();
    assert_eq!(payload, vec![1, 2, 3, 4, 5]);

    // Retention deletes only touch records matching every predicate.
    store.save("tmp/x", "x.log", t0, b"x".to_vec(), None).unwrap();
    store.save("tmp/y", "y.log", t1, b"y".to_vec(), None).unwrap();
    assert_eq!(store.delete_prefix_before("tmp/", t1).unwrap(), 1);
    assert!(store.exists("tmp/y").unwrap());

    // Listing follows the resolved order directives.
    let directives = order::resolve("-time", &["id"]);
    assert_eq!(order::sql_clause(&directives), "time DESC, id");
    let ids: Vec<String> = store
        .list(None, "-time")
        .unwrap()
        .into_iter()
        .map(|m| m.id)
        .collect();
    assert_eq!(ids, vec!["tmp/y", "c"]);

    assert_eq!(store.delete_all().unwrap(), 2);
}
