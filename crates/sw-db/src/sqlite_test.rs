use super::*;
use tempfile::TempDir;

#[test]
fn test_in_memory() {
    let db = SqliteBackend::in_memory().unwrap();
    assert_eq!(db.db_type(), "sqlite");
    assert_eq!(db.dialect(), Dialect::Sqlite);
}

#[test]
fn test_execute_and_query_rows() {
    let db = SqliteBackend::in_memory().unwrap();
    db.execute("CREATE TABLE t (id INTEGER, name TEXT, score REAL)")
        .unwrap();
    db.execute("INSERT INTO t VALUES (1, 'a', 1.5), (2, NULL, NULL)")
        .unwrap();

    let rows = db.query_rows("SELECT id, name, score FROM t ORDER BY id").unwrap();
    assert_eq!(
        rows,
        vec![
            vec![Some("1".to_string()), Some("a".to_string()), Some("1.5".to_string())],
            vec![Some("2".to_string()), None, None],
        ]
    );
}

#[test]
fn test_execute_params() {
    let db = SqliteBackend::in_memory().unwrap();
    db.execute("CREATE TABLE kv (k TEXT PRIMARY KEY, v TEXT)").unwrap();
    let n = db
        .execute_params("INSERT INTO kv VALUES (?1, ?2)", &["a", "it's"])
        .unwrap();
    assert_eq!(n, 1);
    let n = db
        .execute_params("INSERT OR IGNORE INTO kv VALUES (?1, ?2)", &["a", "b"])
        .unwrap();
    assert_eq!(n, 0);
    let rows = db.query_rows("SELECT v FROM kv").unwrap();
    assert_eq!(rows, vec![vec![Some("it's".to_string())]]);
}

#[test]
fn test_column_exists() {
    let db = SqliteBackend::in_memory().unwrap();
    db.execute("CREATE TABLE users (id INTEGER, Email TEXT)").unwrap();
    assert!(db.column_exists("users", "id").unwrap());
    assert!(db.column_exists("users", "email").unwrap());
    assert!(db.column_exists("main.users", "id").unwrap());
    assert!(!db.column_exists("users", "missing").unwrap());
    assert!(!db.column_exists("no_such_table", "id").unwrap());
}

#[test]
fn test_duplicate_column_is_classified() {
    let db = SqliteBackend::in_memory().unwrap();
    db.execute("CREATE TABLE t (a INT)").unwrap();
    let err = db.execute("ALTER TABLE t ADD COLUMN a INT").unwrap_err();
    assert_eq!(err.category(), ErrorCategory::DuplicateColumn);
    assert!(err.to_string().contains("[D002]"));
}

#[test]
fn test_already_exists_is_classified() {
    let db = SqliteBackend::in_memory().unwrap();
    db.execute("CREATE TABLE t (a INT)").unwrap();
    let err = db.execute("CREATE TABLE t (a INT)").unwrap_err();
    assert_eq!(err.category(), ErrorCategory::AlreadyExists);
}

#[test]
fn test_unsupported_constructs_are_classified() {
    let db = SqliteBackend::in_memory().unwrap();
    let err = db.execute("CREATE EXTENSION pgcrypto").unwrap_err();
    assert_eq!(err.category(), ErrorCategory::UnsupportedFeature);
    let err = db
        .execute("CREATE FUNCTION f() RETURNS int AS 'select 1' LANGUAGE sql")
        .unwrap_err();
    assert_eq!(err.category(), ErrorCategory::UnsupportedFeature);
}

#[test]
fn test_unknown_function_call_is_not_unsupported() {
    let db = SqliteBackend::in_memory().unwrap();
    let err = db.execute("SELECT md5('seed')").unwrap_err();
    assert_eq!(err.category(), ErrorCategory::Other);
    assert_eq!(classify("no such module: fts6"), ErrorCategory::Other);
}

#[test]
fn test_other_errors() {
    let db = SqliteBackend::in_memory().unwrap();
    let err = db.execute("INSERT INTO missing VALUES (1)").unwrap_err();
    assert_eq!(err.category(), ErrorCategory::Other);
    assert_eq!(classify("UNIQUE constraint failed: t.id"), ErrorCategory::Other);
}

#[test]
fn test_rollback_discards_changes() {
    let db = SqliteBackend::in_memory().unwrap();
    db.execute("CREATE TABLE t (id INT)").unwrap();
    db.begin().unwrap();
    db.execute("INSERT INTO t VALUES (1)").unwrap();
    db.execute("CREATE TABLE u (id INT)").unwrap();
    db.rollback().unwrap();

    assert!(db.query_rows("SELECT * FROM t").unwrap().is_empty());
    assert!(!db.column_exists("u", "id").unwrap());
}

#[test]
fn test_failed_statement_keeps_transaction_open() {
    let db = SqliteBackend::in_memory().unwrap();
    db.begin().unwrap();
    db.execute("CREATE TABLE t (a INT)").unwrap();
    assert!(db.execute("ALTER TABLE t ADD COLUMN a INT").is_err());
    db.execute("ALTER TABLE t ADD COLUMN b INT").unwrap();
    db.commit().unwrap();
    assert!(db.column_exists("t", "b").unwrap());
}

#[test]
fn test_commit_without_transaction_fails() {
    let db = SqliteBackend::in_memory().unwrap();
    let err = db.commit().unwrap_err();
    assert!(matches!(err, DbError::TransactionError(_)));
}

#[test]
fn test_file_database_persists() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("app.db");
    {
        let db = SqliteBackend::new(path.to_str().unwrap()).unwrap();
        db.execute("CREATE TABLE t (id INT)").unwrap();
    }
    let db = SqliteBackend::from_path(&path).unwrap();
    assert!(db.column_exists("t", "id").unwrap());
}
