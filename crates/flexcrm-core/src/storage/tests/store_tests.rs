use crate::storage::error::StoreError;
use crate::storage::store::Store;
use crate::storage::value::{Record, Value};

use tempfile::tempdir;

fn store_with_notes() -> Store {
    let store = Store::open_in_memory().expect("Failed to open in-memory store");
    store
        .execute(
            "CREATE TABLE notes (id INTEGER PRIMARY KEY AUTOINCREMENT, body TEXT, score INTEGER)",
            &[],
        )
        .expect("Failed to create notes table");
    store
}

fn note(body: &str, score: i64) -> Record {
    let mut record = Record::new();
    record.insert("body".to_string(), Value::Text(body.to_string()));
    record.insert("score".to_string(), Value::Integer(score));
    record
}

#[test]
fn test_open_creates_parent_directory() {
    let dir = tempdir().expect("Failed to create temp dir");
    let db_path = dir.path().join("nested").join("db").join("crm.db");

    let store = Store::open(&db_path).expect("Store::open failed");
    assert!(db_path.parent().unwrap().is_dir());
    assert_eq!(store.path(), Some(db_path.as_path()));
    assert!(store.is_open());
}

#[test]
fn test_insert_returns_increasing_ids() {
    let store = store_with_notes();
    let first = store.insert("notes", &note("a", 1)).unwrap();
    let second = store.insert("notes", &note("b", 2)).unwrap();
    assert!(second > first);
}

#[test]
fn test_insert_empty_record_uses_default_values() {
    let store = store_with_notes();
    let id = store.insert("notes", &Record::new()).unwrap();
    let rows = store.select("notes", Some("\"id\" = ?"), &[Value::Integer(id)], None).unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].get("body"), Some(&Value::Null));
}

#[test]
fn test_select_with_filter_and_order() {
    let store = store_with_notes();
    store.insert("notes", &note("low", 1)).unwrap();
    store.insert("notes", &note("high", 9)).unwrap();
    store.insert("notes", &note("mid", 5)).unwrap();

    let rows = store
        .select("notes", Some("score > ?"), &[Value::Integer(2)], Some("score"))
        .unwrap();
    let bodies: Vec<_> = rows.iter().map(|r| r.get("body").cloned()).collect();
    assert_eq!(
        bodies,
        vec![Some(Value::Text("mid".into())), Some(Value::Text("high".into()))]
    );
}

#[test]
fn test_filter_values_are_bound_not_interpolated() {
    let store = store_with_notes();
    store.insert("notes", &note("x", 1)).unwrap();

    let hostile = Value::Text("x' OR '1'='1".to_string());
    let rows = store.select("notes", Some("body = ?"), &[hostile], None).unwrap();
    assert!(rows.is_empty());
}

#[test]
fn test_update_and_delete_report_row_counts() {
    let store = store_with_notes();
    let id = store.insert("notes", &note("draft", 0)).unwrap();

    let mut changes = Record::new();
    changes.insert("body".to_string(), Value::Text("final".to_string()));
    let updated = store
        .update("notes", &changes, "\"id\" = ?", &[Value::Integer(id)])
        .unwrap();
    assert_eq!(updated, 1);

    let missing = store
        .update("notes", &changes, "\"id\" = ?", &[Value::Integer(id + 100)])
        .unwrap();
    assert_eq!(missing, 0);

    assert_eq!(store.delete("notes", "\"id\" = ?", &[Value::Integer(id)]).unwrap(), 1);
    assert_eq!(store.delete("notes", "\"id\" = ?", &[Value::Integer(id)]).unwrap(), 0);
}

#[test]
fn test_invalid_identifier_rejected() {
    let store = store_with_notes();
    let err = store.insert("notes; DROP TABLE notes", &note("a", 1)).unwrap_err();
    assert!(matches!(err, StoreError::InvalidIdentifier(_)));

    let mut bad_column = Record::new();
    bad_column.insert("body text".to_string(), Value::Null);
    let err = store.insert("notes", &bad_column).unwrap_err();
    assert!(matches!(err, StoreError::InvalidIdentifier(name) if name == "body text"));
}

#[test]
fn test_malformed_statement_is_sqlite_error() {
    let store = store_with_notes();
    let err = store.query("SELEC nothing", &[]).unwrap_err();
    assert!(matches!(err, StoreError::Sqlite { .. }));
}

#[test]
fn test_table_exists_and_columns() {
    let store = store_with_notes();
    assert!(store.table_exists("notes").unwrap());
    assert!(!store.table_exists("ghosts").unwrap());
    assert_eq!(store.columns("notes").unwrap(), vec!["id", "body", "score"]);
}

#[test]
fn test_close_is_idempotent_and_blocks_use() {
    let store = store_with_notes();
    store.close().expect("first close");
    store.close().expect("second close is a no-op");
    assert!(!store.is_open());

    assert!(matches!(store.execute("SELECT 1", &[]), Err(StoreError::Closed)));
    assert!(matches!(store.insert("notes", &note("a", 1)), Err(StoreError::Closed)));
}

#[test]
fn test_data_survives_reopen() {
    let dir = tempdir().expect("Failed to create temp dir");
    let db_path = dir.path().join("crm.db");

    {
        let store = Store::open(&db_path).unwrap();
        store.execute("CREATE TABLE notes (id INTEGER PRIMARY KEY, body TEXT)", &[]).unwrap();
        store.insert("notes", &note_body("kept")).unwrap();
        store.close().unwrap();
    }

    let store = Store::open(&db_path).unwrap();
    let rows = store.select("notes", None, &[], None).unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].get("body"), Some(&Value::Text("kept".to_string())));
}

fn note_body(body: &str) -> Record {
    let mut record = Record::new();
    record.insert("body".to_string(), Value::Text(body.to_string()));
    record
}

#[test]
fn test_invalid_utf8_text_is_read_lossily() {
    let store = store_with_notes();
    store
        .execute("INSERT INTO notes (body, score) VALUES (CAST(x'ff' AS TEXT), 1)", &[])
        .unwrap();

    let rows = store.query("SELECT body FROM notes", &[]).expect("query does not fail");
    assert_eq!(rows[0].get("body"), Some(&Value::Text("\u{FFFD}".to_string())));
}
