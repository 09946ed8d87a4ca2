//! End-to-end tests for the `sw` binary against a file-backed SQLite database.

use std::fs;
use std::path::Path;
use std::process::{Command, Output};
use tempfile::TempDir;

// ── Helpers ────────────────────────────────────────────────────────────

fn sw(project: &Path, args: &[&str]) -> Output {
    let db_url = project.join("app.db").display().to_string();
    Command::new(env!("CARGO_BIN_EXE_sw"))
        .arg("--project-dir")
        .arg(project)
        .arg("--database-url")
        .arg(&db_url)
        .args(args)
        .env_remove("SW_TARGET")
        .env("RUST_LOG", "warn")
        .output()
        .expect("failed to run sw")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn json(output: &Output) -> serde_json::Value {
    serde_json::from_slice(&output.stdout).expect("stdout is JSON")
}

// ── Commands ───────────────────────────────────────────────────────────

#[test]
fn test_new_migrate_status_applied() {
    let dir = TempDir::new().unwrap();

    let created = sw(dir.path(), &["new", "create", "users"]);
    assert!(created.status.success());
    let path = dir.path().join("migrations").join("001_create_users.sql");
    assert_eq!(stdout(&created).trim(), path.display().to_string());
    fs::write(&path, "CREATE TABLE users (id UUID PRIMARY KEY DEFAULT gen_random_uuid());").unwrap();

    let pending = sw(dir.path(), &["status", "--check"]);
    assert_eq!(pending.status.code(), Some(1));
    assert!(stdout(&pending).contains("0 applied, 1 pending"));

    let report = sw(dir.path(), &["migrate", "--output", "json"]);
    assert!(report.status.success());
    let report = json(&report);
    assert_eq!(report["state"], "committed");
    assert_eq!(report["applied"][0], "001_create_users.sql");

    let status = sw(dir.path(), &["status", "--check", "--output", "json"]);
    assert!(status.status.success());
    let status = json(&status);
    assert_eq!(status["migrations"][0]["state"], "applied");
    assert!(status["orphaned"].as_array().unwrap().is_empty());

    let applied = json(&sw(dir.path(), &["applied", "--output", "json"]));
    assert_eq!(applied.as_array().unwrap().len(), 1);
    assert_eq!(applied[0]["name"], "001_create_users.sql");

    let again = sw(dir.path(), &["migrate"]);
    assert!(again.status.success());
    assert!(stdout(&again).contains("Nothing to apply"));
}

#[test]
fn test_failed_migrate_exits_non_zero() {
    let dir = TempDir::new().unwrap();
    let migrations = dir.path().join("migrations");
    fs::create_dir(&migrations).unwrap();
    fs::write(migrations.join("1_ok.sql"), "CREATE TABLE a (id INT);").unwrap();
    fs::write(migrations.join("2_bad.sql"), "INSERT INTO missing VALUES (1);").unwrap();

    let output = sw(dir.path(), &["migrate"]);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("2_bad.sql"), "{}", stderr);

    let applied = json(&sw(dir.path(), &["applied", "--output", "json"]));
    assert!(applied.as_array().unwrap().is_empty());
}

#[test]
fn test_translate_file_for_sqlite() {
    let dir = TempDir::new().unwrap();
    let file = dir.path().join("init.sql");
    fs::write(
        &file,
        "CREATE EXTENSION IF NOT EXISTS pgcrypto;\n\
         ALTER TABLE t ADD COLUMN a INT, ADD COLUMN b UUID;",
    )
    .unwrap();

    let output = sw(
        dir.path(),
        &["translate", "--dialect", "sqlite", file.to_str().unwrap()],
    );
    assert!(output.status.success());
    let text = stdout(&output);
    assert!(text.contains("-- skipped (extension"), "{}", text);
    assert!(text.contains("ALTER TABLE t ADD COLUMN a INT;"), "{}", text);
    assert!(text.contains("ALTER TABLE t ADD COLUMN b TEXT;"), "{}", text);
}

#[test]
fn test_config_file_is_honored() {
    let dir = TempDir::new().unwrap();
    fs::write(
        dir.path().join("stepwise.yml"),
        "migrations_dir: db\nledger_table: applied_changes\n",
    )
    .unwrap();
    fs::create_dir(dir.path().join("db")).unwrap();
    fs::write(dir.path().join("db").join("1_a.sql"), "CREATE TABLE a (id INT);").unwrap();

    let report = json(&sw(dir.path(), &["migrate", "--output", "json"]));
    assert_eq!(report["applied"][0], "1_a.sql");

    let applied = json(&sw(dir.path(), &["applied", "--output", "json"]));
    assert_eq!(applied[0]["name"], "1_a.sql");
}
