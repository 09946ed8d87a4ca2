//! Shared utilities for CLI commands

use anyhow::{Context, Result};
use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};
use sw_core::{Config, DatabaseConfig};
use sw_db::{open_database, Database};
use sw_migrate::MigratorConfig;

use crate::cli::GlobalArgs;

/// Error type representing a non-zero process exit code.
///
/// Use `return Err(ExitCode(N).into())` instead of `std::process::exit(N)`
/// so that destructors run before the process exits.
#[derive(Debug)]
pub(crate) struct ExitCode(pub(crate) i32);

impl fmt::Display for ExitCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Control flow only; nothing to show the user.
        write!(f, "")
    }
}

impl std::error::Error for ExitCode {}

/// Project directory, its configuration and the resolved target.
#[derive(Debug)]
pub(crate) struct ProjectContext {
    pub(crate) root: PathBuf,
    pub(crate) config: Config,
    pub(crate) target: Option<String>,
    database_url: Option<String>,
    migrations_dir: Option<String>,
}

impl ProjectContext {
    /// Connection settings: `--database-url` wins over the configured target.
    pub(crate) fn database_config(&self) -> Result<DatabaseConfig> {
        if let Some(url) = &self.database_url {
            return Ok(DatabaseConfig::from_url(url));
        }
        self.config
            .get_database_config(self.target.as_deref())
            .context("Failed to get database configuration")
    }

    /// Migrator settings for the resolved target, honoring `--migrations-dir`.
    pub(crate) fn migrator_config(&self) -> Result<MigratorConfig> {
        let mut migrator =
            MigratorConfig::from_config(&self.config, &self.root, self.target.as_deref())
                .context("Failed to resolve migrations directory")?;
        if let Some(dir) = &self.migrations_dir {
            migrator.migrations_dir = self.root.join(dir);
        }
        Ok(migrator)
    }

    pub(crate) fn migrations_dir(&self) -> Result<PathBuf> {
        Ok(self.migrator_config()?.migrations_dir)
    }

    /// Open the configured database.
    pub(crate) fn connect(&self) -> Result<Box<dyn Database>> {
        let db_config = self.database_config()?;
        log::debug!(
            "Connecting to {} at {}",
            db_config.db_type,
            db_config.redacted_url()
        );
        open_database(&db_config).context("Failed to connect to database")
    }
}

/// Load the project named by the global CLI arguments.
///
/// An explicit `--config` must exist. Without one, `stepwise.yml` in the
/// project directory is used when present and defaults apply otherwise.
pub(crate) fn load_context(global: &GlobalArgs) -> Result<ProjectContext> {
    let root = PathBuf::from(&global.project_dir);
    let config = match &global.config {
        Some(path) => Config::load(Path::new(path))
            .with_context(|| format!("Failed to load config {}", path))?,
        None => match Config::find_in_dir(&root) {
            Some(path) => Config::load(&path)
                .with_context(|| format!("Failed to load config {}", path.display()))?,
            None => {
                log::debug!(
                    "No config file in {}, using defaults",
                    root.display()
                );
                Config::default()
            }
        },
    };

    Ok(ProjectContext {
        root,
        config,
        target: Config::resolve_target(global.target.as_deref()),
        database_url: global.database_url.clone().filter(|u| !u.is_empty()),
        migrations_dir: global.migrations_dir.clone(),
    })
}

/// Print any serializable value as pretty JSON on stdout.
pub(crate) fn print_json<T: Serialize + ?Sized>(data: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(data).context("Failed to serialize output")?;
    println!("{}", json);
    Ok(())
}

// ---------------------------------------------------------------------------
// Table-printing utilities
// ---------------------------------------------------------------------------

/// Widest cell per column, headers included.
pub(crate) fn calculate_column_widths(headers: &[&str], rows: &[Vec<String>]) -> Vec<usize> {
    let mut widths: Vec<usize> = headers.iter().map(|h| h.len()).collect();
    for row in rows {
        for (w, cell) in widths.iter_mut().zip(row) {
            *w = (*w).max(cell.len());
        }
    }
    widths
}

fn format_row<S: AsRef<str>>(cells: &[S], widths: &[usize]) -> String {
    cells
        .iter()
        .zip(widths)
        .map(|(cell, &w)| format!("{:<width$}", cell.as_ref(), width = w))
        .collect::<Vec<_>>()
        .join("  ")
        .trim_end()
        .to_string()
}

/// Print a left-aligned table with a dashed separator under the header.
///
/// ```ignore
/// print_table(&["NAME", "STATE"], &[vec!["1_init.sql".into(), "applied".into()]]);
/// // NAME        STATE
/// // ----------  -------
/// // 1_init.sql  applied
/// ```
pub(crate) fn print_table(headers: &[&str], rows: &[Vec<String>]) {
    let widths = calculate_column_widths(headers, rows);
    println!("{}", format_row(headers, &widths));
    let separator: Vec<String> = widths.iter().map(|&w| "-".repeat(w)).collect();
    println!("{}", format_row(&separator, &widths));
    for row in rows {
        println!("{}", format_row(row, &widths));
    }
}

#[cfg(test)]
#[path = "common_test.rs"]
mod tests;
