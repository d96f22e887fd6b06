use optiscene_core::db::migrations::latest_version;
use optiscene_core::db::{open_db, open_db_in_memory, DbError};
use optiscene_core::{DocumentKind, DocumentStore, SqliteDocumentStore, StoreError};
use rusqlite::Connection;
use serde_json::json;

#[test]
fn documents_table_has_store_columns_and_kind_index() {
    let conn = open_db_in_memory().unwrap();

    assert_eq!(schema_version(&conn), latest_version());
    assert_eq!(
        column_names(&conn, "documents"),
        vec!["seq", "doc_key", "kind", "body", "revision", "created_at", "updated_at"]
    );
    let index: String = conn
        .query_row(
            "SELECT name FROM sqlite_master WHERE type = 'index' AND tbl_name = 'documents' AND name LIKE 'idx_%';",
            [],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(index, "idx_documents_kind_seq");
}

#[test]
fn revision_below_one_is_refused_by_schema() {
    let conn = open_db_in_memory().unwrap();
    let inserted = conn.execute(
        "INSERT INTO documents (doc_key, kind, body, revision) VALUES ('k', 'spectrum', '{}', 0);",
        [],
    );
    assert!(inserted.is_err());
}

#[test]
fn sequence_is_not_reused_after_delete() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("optiscene.db");
    let body = json!({"name": "Sun", "monochromatic": {"wavelength": 555.0}});

    let (first, third) = {
        let store = SqliteDocumentStore::open(&path).unwrap();
        let first = store.create(DocumentKind::Spectrum, &body).unwrap();
        let second = store.create(DocumentKind::Spectrum, &body).unwrap();
        store.delete(&second).unwrap();
        let third = store.create(DocumentKind::Spectrum, &body).unwrap();
        (first, third)
    };

    let conn = open_db(&path).unwrap();
    assert_eq!(schema_version(&conn), latest_version());
    let third_seq: i64 = conn
        .query_row(
            "SELECT seq FROM documents WHERE doc_key = ?1;",
            [third.as_str()],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(third_seq, 3);

    let store = SqliteDocumentStore::new(conn);
    assert_eq!(store.list(DocumentKind::Spectrum).unwrap(), vec![first, third]);
}

#[test]
fn store_refuses_database_with_newer_schema_version() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("future.db");

    let conn = Connection::open(&path).unwrap();
    conn.execute_batch("PRAGMA user_version = 999;").unwrap();
    drop(conn);

    match SqliteDocumentStore::open(&path) {
        Err(StoreError::Db(DbError::UnsupportedSchemaVersion {
            db_version,
            latest_supported,
        })) => {
            assert_eq!(db_version, 999);
            assert_eq!(latest_supported, latest_version());
        }
        Err(other) => panic!("unexpected error: {other}"),
        Ok(_) => panic!("newer schema was accepted"),
    }
}

fn schema_version(conn: &Connection) -> u32 {
    conn.query_row("PRAGMA user_version;", [], |row| row.get(0))
        .unwrap()
}

fn column_names(conn: &Connection, table_name: &str) -> Vec<String> {
    let mut stmt = conn
        .prepare(&format!("PRAGMA table_info({table_name});"))
        .unwrap();
    let names = stmt
        .query_map([], |row| row.get::<_, String>(1))
        .unwrap()
        .collect::<Result<Vec<_>, _>>()
        .unwrap();
    names
}
