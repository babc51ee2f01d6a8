mod common;

use common::new_patient;
use medrec_core::db::migrations::latest_version;
use medrec_core::db::{open_db, open_db_in_memory, DbError};
use medrec_core::{assemble_record, PatientStore, SearchFilter, SqlitePatientStore};
use rusqlite::Connection;

#[test]
fn open_db_in_memory_applies_all_migrations() {
    let conn = open_db_in_memory().unwrap();

    assert_eq!(schema_version(&conn), latest_version());
    assert_object_exists(&conn, "table", "patients");
    assert_object_exists(&conn, "index", "idx_patients_condition");
}

#[test]
fn migrations_do_not_create_store_owned_indexes() {
    let conn = open_db_in_memory().unwrap();
    assert!(!object_exists(&conn, "index", "idx_patients_patient_id"));
    assert!(!object_exists(&conn, "table", "patients_text"));

    SqlitePatientStore::new(&conn).create_indexes().unwrap();
    assert_object_exists(&conn, "index", "idx_patients_patient_id");
    assert_object_exists(&conn, "table", "patients_text");
}

#[test]
fn reopening_file_database_keeps_records_and_indexes() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("healthcare_db.sqlite3");

    let first = open_db(&path).unwrap();
    let store = SqlitePatientStore::new(&first);
    store.create_indexes().unwrap();
    store
        .insert_one(&assemble_record(new_patient("P1", "Migraine")).unwrap())
        .unwrap();
    drop(first);

    let second = open_db(&path).unwrap();
    assert_eq!(schema_version(&second), latest_version());
    let store = SqlitePatientStore::new(&second);
    store.create_indexes().unwrap();

    let hits = store
        .find(&SearchFilter::Text {
            search: "migraine".to_string(),
        })
        .unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].patient_id, "P1");
}

#[test]
fn opening_database_with_newer_schema_version_returns_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("future.db");

    let conn = Connection::open(&path).unwrap();
    conn.execute_batch("PRAGMA user_version = 999;").unwrap();
    drop(conn);

    let err = open_db(&path).unwrap_err();
    match err {
        DbError::UnsupportedSchemaVersion {
            db_version,
            latest_supported,
        } => {
            assert_eq!(db_version, 999);
            assert_eq!(latest_supported, latest_version());
        }
        other => panic!("unexpected error: {other}"),
    }
}

fn schema_version(conn: &Connection) -> u32 {
    conn.query_row("PRAGMA user_version;", [], |row| row.get(0))
        .unwrap()
}

fn object_exists(conn: &Connection, kind: &str, name: &str) -> bool {
    let exists: i64 = conn
        .query_row(
            "SELECT EXISTS(
                SELECT 1
                FROM sqlite_master
                WHERE type = ?1 AND name = ?2
            );",
            [kind, name],
            |row| row.get(0),
        )
        .unwrap();
    exists == 1
}

fn assert_object_exists(conn: &Connection, kind: &str, name: &str) {
    assert!(object_exists(conn, kind, name), "{kind} {name} does not exist");
}
