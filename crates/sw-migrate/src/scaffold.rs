//! Creating new migration files.

use crate::error::{MigrateError, MigrateResult};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use sw_core::catalog::discover;
use sw_core::CoreError;

/// Turn a free-form description into a filename-safe slug.
///
/// Lowercases, maps every run of non-alphanumeric characters to `_` and trims
/// underscores from both ends.
pub fn slugify(description: &str) -> String {
    let mut slug = String::with_capacity(description.len());
    for c in description.trim().chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
        } else if !slug.ends_with('_') {
            slug.push('_');
        }
    }
    slug.trim_matches('_').to_string()
}

/// Write an empty `<next version>_<slug>.sql` into `dir`, creating the
/// directory if needed, and return its path.
///
/// The next version is one above the highest existing version, zero-padded
/// to three digits.
pub fn create_migration(dir: &Path, description: &str) -> MigrateResult<PathBuf> {
    let slug = slugify(description);
    if slug.is_empty() {
        return Err(MigrateError::Scaffold(format!(
            "description '{}' has no usable characters",
            description
        )));
    }

    let next = discover(dir)?
        .last()
        .map_or(Some(1), |f| f.version.checked_add(1))
        .ok_or_else(|| MigrateError::Scaffold("version number overflow".to_string()))?;

    std::fs::create_dir_all(dir).map_err(|e| CoreError::IoWithPath {
        path: dir.display().to_string(),
        source: e,
    })?;

    let path = dir.join(format!("{:03}_{}.sql", next, slug));
    let mut file = OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(&path)
        .map_err(|e| CoreError::IoWithPath {
            path: path.display().to_string(),
            source: e,
        })?;
    writeln!(
        file,
        "-- {}\n--\n-- Write PostgreSQL; statements are translated for SQLite and DuckDB.\n",
        description.trim()
    )
    .map_err(|e| CoreError::IoWithPath {
        path: path.display().to_string(),
        source: e,
    })?;

    log::info!("Created migration {}", path.display());
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("Add users table"), "add_users_table");
        assert_eq!(slugify("  drop -- old/index!  "), "drop_old_index");
        assert_eq!(slugify("???"), "");
    }

    #[test]
    fn test_first_migration_in_missing_dir() {
        let dir = TempDir::new().unwrap();
        let migrations = dir.path().join("migrations");
        let path = create_migration(&migrations, "init schema").unwrap();
        assert_eq!(path, migrations.join("001_init_schema.sql"));
        let content = fs::read_to_string(&path).unwrap();
        assert!(content.starts_with("-- init schema"));
    }

    #[test]
    fn test_next_version_follows_highest() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("2_a.sql"), "").unwrap();
        fs::write(dir.path().join("10_b.sql"), "").unwrap();
        let path = create_migration(dir.path(), "Add email").unwrap();
        assert_eq!(path.file_name().unwrap(), "011_add_email.sql");
    }

    #[test]
    fn test_empty_description_is_rejected() {
        let dir = TempDir::new().unwrap();
        let err = create_migration(dir.path(), " - ").unwrap_err();
        assert!(matches!(err, MigrateError::Scaffold(_)));
    }
}
