//! Migration runs against DuckDB.
//!
//! DuckDB aborts its transaction on any failed statement, so every error is
//! fatal here, including ones SQLite would skip.

use std::fs;
use sw_db::{Database, DuckDbBackend};
use sw_migrate::{MigrateError, Migrator, MigratorConfig, RunState};
use tempfile::TempDir;

fn project(files: &[(&str, &str)]) -> (TempDir, MigratorConfig) {
    let dir = TempDir::new().unwrap();
    let migrations = dir.path().join("migrations");
    fs::create_dir(&migrations).unwrap();
    for (name, sql) in files {
        fs::write(migrations.join(name), sql).unwrap();
    }
    let config = MigratorConfig {
        migrations_dir: migrations,
        ..Default::default()
    };
    (dir, config)
}

fn count(db: &dyn Database, sql: &str) -> i64 {
    db.query_rows(sql).unwrap()[0][0]
        .as_deref()
        .unwrap()
        .parse()
        .unwrap()
}

#[test]
fn test_postgres_flavoured_schema_applies() {
    let (_dir, config) = project(&[
        (
            "1_init.sql",
            "CREATE EXTENSION IF NOT EXISTS \"uuid-ossp\";\n\
             CREATE TABLE users (id UUID PRIMARY KEY DEFAULT uuid_generate_v4(), email VARCHAR);\n\
             INSERT INTO users (email) VALUES ('a@example.com'), ('b@example.com');",
        ),
        (
            "2_touch.sql",
            "CREATE OR REPLACE FUNCTION touch() RETURNS trigger AS $$\n\
             BEGIN RETURN NEW; END;\n\
             $$ LANGUAGE plpgsql;\n\
             CREATE TRIGGER users_touch BEFORE UPDATE ON users FOR EACH ROW EXECUTE FUNCTION touch();",
        ),
    ]);
    let db = DuckDbBackend::in_memory().unwrap();

    let report = Migrator::new(&db, config).ensure_and_apply().unwrap();
    assert_eq!(report.applied, vec!["1_init.sql", "2_touch.sql"]);
    assert_eq!(report.skipped_statements, 3);

    let ids = db.query_rows("SELECT CAST(id AS VARCHAR) FROM users").unwrap();
    assert_eq!(ids.len(), 2);
    for row in ids {
        let id = row[0].clone().unwrap();
        let parsed = uuid::Uuid::parse_str(&id).unwrap();
        assert_eq!(parsed.get_version_num(), 4);
    }
}

#[test]
fn test_rerun_is_noop() {
    let (_dir, config) = project(&[("1_t.sql", "CREATE TABLE t (id INT);")]);
    let db = DuckDbBackend::in_memory().unwrap();
    Migrator::new(&db, config.clone()).ensure_and_apply().unwrap();

    let mut migrator = Migrator::new(&db, config);
    let report = migrator.ensure_and_apply().unwrap();
    assert!(report.applied.is_empty());
    assert_eq!(migrator.state(), RunState::LedgerReady);
    assert_eq!(migrator.list_applied().len(), 1);
}

#[test]
fn test_add_columns_guarded_by_existence_check() {
    let (dir, config) = project(&[("1_t.sql", "CREATE TABLE t (id INT, a INT);")]);
    let db = DuckDbBackend::in_memory().unwrap();
    Migrator::new(&db, config.clone()).ensure_and_apply().unwrap();

    fs::write(
        dir.path().join("migrations").join("2_cols.sql"),
        "ALTER TABLE t ADD COLUMN IF NOT EXISTS a INT, ADD COLUMN IF NOT EXISTS b VARCHAR;",
    )
    .unwrap();
    let report = Migrator::new(&db, config).ensure_and_apply().unwrap();
    assert_eq!(report.applied, vec!["2_cols.sql"]);
    assert_eq!(report.skipped_columns, 1);
    assert!(db.column_exists("t", "b").unwrap());
}

#[test]
fn test_already_exists_is_fatal() {
    let (_dir, config) = project(&[
        ("1_t.sql", "CREATE TABLE t (id INT);"),
        ("2_again.sql", "CREATE TABLE t (id INT);"),
    ]);
    let db = DuckDbBackend::in_memory().unwrap();
    let mut migrator = Migrator::new(&db, config);

    let err = migrator.ensure_and_apply().unwrap_err();
    assert!(matches!(
        err,
        MigrateError::Statement { ref migration, .. } if migration == "2_again.sql"
    ));
    assert_eq!(migrator.state(), RunState::RolledBack);
    assert!(!db.column_exists("t", "id").unwrap());
    assert_eq!(count(&db, "SELECT COUNT(*) FROM schema_migrations"), 0);
}
