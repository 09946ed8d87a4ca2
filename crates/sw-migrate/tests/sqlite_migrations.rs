//! End-to-end migration runs against file-backed SQLite databases.

use std::fs;
use std::path::PathBuf;
use sw_db::{Database, SqliteBackend};
use sw_migrate::{MigrateError, Migrator, MigratorConfig, RunState};
use tempfile::TempDir;

// ── Helpers ────────────────────────────────────────────────────────────

struct Project {
    dir: TempDir,
}

impl Project {
    fn new(files: &[(&str, &str)]) -> Self {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join("migrations")).unwrap();
        let project = Self { dir };
        for (name, sql) in files {
            project.write(name, sql);
        }
        project
    }

    fn write(&self, name: &str, sql: &str) {
        fs::write(self.migrations_dir().join(name), sql).unwrap();
    }

    fn migrations_dir(&self) -> PathBuf {
        self.dir.path().join("migrations")
    }

    fn db_path(&self) -> PathBuf {
        self.dir.path().join("app.db")
    }

    fn open(&self) -> SqliteBackend {
        SqliteBackend::from_path(&self.db_path()).unwrap()
    }

    fn config(&self) -> MigratorConfig {
        MigratorConfig {
            migrations_dir: self.migrations_dir(),
            ..Default::default()
        }
    }
}

fn table_exists(db: &dyn Database, table: &str) -> bool {
    let rows = db
        .query_rows(&format!(
            "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = '{}'",
            table
        ))
        .unwrap();
    rows[0][0].as_deref() == Some("1")
}

fn ledger_names(db: &dyn Database) -> Vec<String> {
    db.query_rows("SELECT version FROM schema_migrations ORDER BY version")
        .unwrap()
        .into_iter()
        .filter_map(|row| row.into_iter().next().flatten())
        .collect()
}

// ── Properties ─────────────────────────────────────────────────────────

#[test]
fn test_rerun_applies_nothing() {
    let project = Project::new(&[
        ("1_users.sql", "CREATE TABLE users (id INTEGER PRIMARY KEY, name TEXT);"),
        ("2_posts.sql", "CREATE TABLE posts (id INTEGER PRIMARY KEY, user_id INT);"),
    ]);
    let db = project.open();

    let first = Migrator::new(&db, project.config())
        .ensure_and_apply()
        .unwrap();
    assert_eq!(first.applied, vec!["1_users.sql", "2_posts.sql"]);

    let second = Migrator::new(&db, project.config())
        .ensure_and_apply()
        .unwrap();
    assert!(second.applied.is_empty());
    assert_eq!(second.state, RunState::LedgerReady);
    assert_eq!(second.discovered, 2);
}

#[test]
fn test_rerun_from_new_connection() {
    let project = Project::new(&[("1_users.sql", "CREATE TABLE users (id INTEGER);")]);
    {
        let db = project.open();
        Migrator::new(&db, project.config())
            .ensure_and_apply()
            .unwrap();
    }
    let db = project.open();
    let report = Migrator::new(&db, project.config())
        .ensure_and_apply()
        .unwrap();
    assert!(report.applied.is_empty());
    assert_eq!(ledger_names(&db), vec!["1_users.sql"]);
}

#[test]
fn test_files_apply_in_numeric_order() {
    let project = Project::new(&[
        ("2_a.sql", "INSERT INTO log (name) VALUES ('a');"),
        ("10_b.sql", "INSERT INTO log (name) VALUES ('b');"),
        (
            "1_c.sql",
            "CREATE TABLE log (seq INTEGER PRIMARY KEY AUTOINCREMENT, name TEXT);\n\
             INSERT INTO log (name) VALUES ('c');",
        ),
    ]);
    let db = project.open();

    let report = Migrator::new(&db, project.config())
        .ensure_and_apply()
        .unwrap();
    assert_eq!(report.applied, vec!["1_c.sql", "2_a.sql", "10_b.sql"]);

    let names: Vec<_> = db
        .query_rows("SELECT name FROM log ORDER BY seq")
        .unwrap()
        .into_iter()
        .map(|row| row[0].clone().unwrap())
        .collect();
    assert_eq!(names, vec!["c", "a", "b"]);
}

#[test]
fn test_fatal_error_rolls_back_every_file() {
    let project = Project::new(&[
        ("1_a.sql", "CREATE TABLE a (id INT);"),
        ("2_b.sql", "CREATE TABLE b (id INT);\nINSERT INTO a VALUES (1);"),
        ("3_c.sql", "CREATE TABLE c (id INT);\nINSERT INTO does_not_exist VALUES (1);"),
        ("4_d.sql", "CREATE TABLE d (id INT);"),
        ("5_e.sql", "CREATE TABLE e (id INT);"),
    ]);
    let db = project.open();
    let mut migrator = Migrator::new(&db, project.config());

    let err = migrator.ensure_and_apply().unwrap_err();
    assert_eq!(migrator.state(), RunState::RolledBack);
    assert!(matches!(
        err,
        MigrateError::Statement { ref migration, .. } if migration == "3_c.sql"
    ));
    assert!(err.to_string().contains("does_not_exist"));

    assert!(ledger_names(&db).is_empty());
    for table in ["a", "b", "c", "d", "e"] {
        assert!(!table_exists(&db, table), "table {} survived rollback", table);
    }

    // Fixing the file makes the whole set apply
    project.write("3_c.sql", "CREATE TABLE c (id INT);");
    let report = migrator.ensure_and_apply().unwrap();
    assert_eq!(report.applied.len(), 5);
    assert_eq!(migrator.state(), RunState::Committed);
}

#[test]
fn test_add_column_split_adds_only_missing_columns() {
    let project = Project::new(&[
        ("1_t.sql", "CREATE TABLE t (id INT, a INT);"),
        (
            "2_cols.sql",
            "ALTER TABLE t ADD COLUMN IF NOT EXISTS a INT, ADD COLUMN IF NOT EXISTS b TEXT;",
        ),
    ]);
    let db = project.open();

    let report = Migrator::new(&db, project.config())
        .ensure_and_apply()
        .unwrap();
    assert_eq!(report.applied, vec!["1_t.sql", "2_cols.sql"]);
    assert_eq!(report.skipped_columns, 1);
    assert!(db.column_exists("t", "a").unwrap());
    assert!(db.column_exists("t", "b").unwrap());
    assert_eq!(ledger_names(&db), vec!["1_t.sql", "2_cols.sql"]);
}

#[test]
fn test_uuid_default_generates_canonical_ids() {
    let project = Project::new(&[(
        "1_items.sql",
        "CREATE EXTENSION IF NOT EXISTS \"uuid-ossp\";\n\
         CREATE TABLE items (id UUID PRIMARY KEY DEFAULT uuid_generate_v4(), label TEXT);\n\
         INSERT INTO items (label) VALUES ('x'), ('y'), ('z');\n\
         INSERT INTO items (id, label) VALUES (gen_random_uuid(), 'w');",
    )]);
    let db = project.open();
    Migrator::new(&db, project.config())
        .ensure_and_apply()
        .unwrap();

    let ids: Vec<String> = db
        .query_rows("SELECT id FROM items")
        .unwrap()
        .into_iter()
        .map(|row| row[0].clone().unwrap())
        .collect();
    assert_eq!(ids.len(), 4);
    for id in &ids {
        assert_eq!(id.len(), 36, "{}", id);
        assert_eq!(id, &id.to_lowercase());
        let parsed = uuid::Uuid::parse_str(id).unwrap();
        assert_eq!(parsed.get_version_num(), 4, "{}", id);
        assert_eq!(parsed.get_variant(), uuid::Variant::RFC4122, "{}", id);
    }
    let mut unique = ids.clone();
    unique.sort();
    unique.dedup();
    assert_eq!(unique.len(), ids.len());
}

#[test]
fn test_missing_migrations_dir_creates_empty_ledger() {
    let dir = TempDir::new().unwrap();
    let db = SqliteBackend::from_path(&dir.path().join("app.db")).unwrap();
    let config = MigratorConfig {
        migrations_dir: dir.path().join("migrations"),
        ..Default::default()
    };

    let report = Migrator::new(&db, config).ensure_and_apply().unwrap();
    assert!(report.applied.is_empty());
    assert_eq!(report.discovered, 0);
    assert!(table_exists(&db, "schema_migrations"));
    assert!(ledger_names(&db).is_empty());
}

// ── Other behaviour ────────────────────────────────────────────────────

#[test]
fn test_stored_functions_and_triggers_are_skipped() {
    let project = Project::new(&[(
        "1_trigger.sql",
        "CREATE TABLE t (id INT, updated_at TEXT);\n\
         CREATE OR REPLACE FUNCTION touch() RETURNS trigger AS $$\n\
         BEGIN\n  NEW.updated_at = now();\n  RETURN NEW;\nEND;\n\
         $$ LANGUAGE plpgsql;\n\
         CREATE TRIGGER t_touch BEFORE UPDATE ON t FOR EACH ROW EXECUTE FUNCTION touch();",
    )]);
    let db = project.open();
    let report = Migrator::new(&db, project.config())
        .ensure_and_apply()
        .unwrap();
    assert_eq!(report.skipped_statements, 2);
    assert!(table_exists(&db, "t"));
}

#[test]
fn test_duplicate_versions_abort_before_touching_database() {
    let project = Project::new(&[
        ("1_a.sql", "CREATE TABLE a (id INT);"),
        ("01_b.sql", "CREATE TABLE b (id INT);"),
    ]);
    let db = project.open();
    let err = Migrator::new(&db, project.config())
        .ensure_and_apply()
        .unwrap_err();
    assert!(matches!(err, MigrateError::Core(_)));
    assert!(!table_exists(&db, "a"));
}

#[test]
fn test_custom_ledger_table() {
    let project = Project::new(&[("1_a.sql", "CREATE TABLE a (id INT);")]);
    let db = project.open();
    let config = MigratorConfig {
        ledger_table: "main.applied_changes".to_string(),
        ..project.config()
    };
    let migrator = Migrator::new(&db, config.clone());
    Migrator::new(&db, config).ensure_and_apply().unwrap();

    let applied = migrator.list_applied();
    assert_eq!(applied.len(), 1);
    assert!(table_exists(&db, "applied_changes"));
    assert!(!table_exists(&db, "schema_migrations"));
}

#[test]
fn test_status_after_partial_history() {
    let project = Project::new(&[("1_a.sql", "CREATE TABLE a (id INT);")]);
    let db = project.open();
    let mut migrator = Migrator::new(&db, project.config());
    migrator.ensure_and_apply().unwrap();
    project.write("2_b.sql", "CREATE TABLE b (id INT);");

    let status = migrator.status().unwrap();
    assert_eq!(status.migrations.len(), 2);
    assert_eq!(status.pending_count(), 1);
    assert!(status.orphaned.is_empty());
}

