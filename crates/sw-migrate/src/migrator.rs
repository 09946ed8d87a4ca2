//! Transactional migration executor.
//!
//! A run moves through `Idle -> LedgerReady -> Running -> Committed` or
//! `RolledBack`. All pending files share one transaction: either every one of
//! them is applied and recorded, or none is.

use crate::error::{MigrateError, MigrateResult};
use crate::ledger::{advisory_lock_key, AppliedMigration, Ledger};
use crate::policy::{disposition, Disposition};
use serde::Serialize;
use std::collections::BTreeSet;
use std::fmt;
use std::path::{Path, PathBuf};
use sw_core::catalog::{discover, MigrationFile};
use sw_core::config::{DEFAULT_LEDGER_TABLE, DEFAULT_MIGRATIONS_DIR};
use sw_core::sql_utils::{truncate_statement, STATEMENT_PREVIEW_CHARS};
use sw_core::translate::{translate, AddColumnPlan, Translation};
use sw_core::{split, Config, Dialect};
use sw_db::{with_transaction, Database, DbError};

/// Migrator settings
#[derive(Debug, Clone)]
pub struct MigratorConfig {
    /// Directory holding the migration files
    pub migrations_dir: PathBuf,
    /// Ledger table name, optionally schema-qualified
    pub ledger_table: String,
    /// Serialize concurrent runners with a PostgreSQL advisory lock
    pub advisory_lock: bool,
}

impl Default for MigratorConfig {
    fn default() -> Self {
        Self {
            migrations_dir: PathBuf::from(DEFAULT_MIGRATIONS_DIR),
            ledger_table: DEFAULT_LEDGER_TABLE.to_string(),
            advisory_lock: true,
        }
    }
}

impl MigratorConfig {
    /// Settings for a project rooted at `root`, applying target overrides
    pub fn from_config(config: &Config, root: &Path, target: Option<&str>) -> MigrateResult<Self> {
        Ok(Self {
            migrations_dir: config.migrations_dir_absolute(root, target)?,
            ledger_table: config.ledger_table.clone(),
            advisory_lock: config.advisory_lock,
        })
    }
}

/// Executor state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunState {
    /// Nothing has happened yet
    #[default]
    Idle,
    /// Ledger table ensured; no transaction open
    LedgerReady,
    /// Run transaction open
    Running,
    /// Every pending file applied and committed
    Committed,
    /// A fatal error undid the whole run
    RolledBack,
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RunState::Idle => "idle",
            RunState::LedgerReady => "ledger_ready",
            RunState::Running => "running",
            RunState::Committed => "committed",
            RunState::RolledBack => "rolled_back",
        };
        f.write_str(name)
    }
}

/// Outcome of a successful [`Migrator::ensure_and_apply`]
#[derive(Debug, Clone, Default, Serialize)]
pub struct MigrationReport {
    /// Final executor state (`LedgerReady` for a no-op run)
    pub state: RunState,
    /// Migration files found on disk
    pub discovered: usize,
    /// Files applied by this run, in order
    pub applied: Vec<String>,
    /// Statements dropped by dialect translation
    pub skipped_statements: usize,
    /// Column additions skipped because the column already existed
    pub skipped_columns: usize,
    /// Statement errors tolerated as ignorable
    pub ignored_errors: usize,
}

/// Applied/pending state of one migration file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FileState {
    Applied,
    Pending,
}

/// Status line for one migration file
#[derive(Debug, Clone, Serialize)]
pub struct MigrationStatus {
    pub version: u64,
    pub name: String,
    pub state: FileState,
    pub applied_at: Option<chrono::NaiveDateTime>,
}

/// Result of [`Migrator::status`]
#[derive(Debug, Clone, Default, Serialize)]
pub struct StatusReport {
    /// Every file on disk, ascending by version
    pub migrations: Vec<MigrationStatus>,
    /// Ledger rows with no matching file on disk
    pub orphaned: Vec<AppliedMigration>,
}

impl StatusReport {
    /// Number of files not yet applied
    pub fn pending_count(&self) -> usize {
        self.migrations
            .iter()
            .filter(|m| m.state == FileState::Pending)
            .count()
    }
}

/// Applies pending migrations over an injected connection.
pub struct Migrator<'a> {
    db: &'a dyn Database,
    config: MigratorConfig,
    state: RunState,
}

impl<'a> Migrator<'a> {
    pub fn new(db: &'a dyn Database, config: MigratorConfig) -> Self {
        Self {
            db,
            config,
            state: RunState::Idle,
        }
    }

    /// State reached by the last call to [`ensure_and_apply`](Self::ensure_and_apply)
    pub fn state(&self) -> RunState {
        self.state
    }

    pub fn config(&self) -> &MigratorConfig {
        &self.config
    }

    fn ledger(&self) -> Ledger<'_> {
        Ledger::new(self.db, &self.config.ledger_table)
    }

    /// Ensure the ledger exists and apply every pending migration in one
    /// transaction.
    ///
    /// Zero pending files is a successful no-op that opens no transaction.
    /// On a fatal statement error everything done by this run is rolled
    /// back and the error is returned.
    pub fn ensure_and_apply(&mut self) -> MigrateResult<MigrationReport> {
        self.state = RunState::Idle;
        self.ledger().ensure_table();
        self.state = RunState::LedgerReady;

        let files = discover(&self.config.migrations_dir)?;
        let applied = self.ledger().applied_versions();
        let pending: Vec<&MigrationFile> = files
            .iter()
            .filter(|f| !applied.contains(&f.name))
            .collect();

        let mut report = MigrationReport {
            state: self.state,
            discovered: files.len(),
            ..Default::default()
        };

        if pending.is_empty() {
            if files.is_empty() {
                log::info!("No migrations to apply");
            } else {
                log::info!("All {} migration(s) already applied", files.len());
            }
            return Ok(report);
        }

        log::info!(
            "Applying {} pending migration(s) on {}",
            pending.len(),
            self.db.db_type()
        );
        self.state = RunState::Running;
        let db = self.db;
        let result = with_transaction(db, |db| self.run_pending(db, &pending, &mut report));

        match result {
            Ok(()) => {
                self.state = RunState::Committed;
                report.state = RunState::Committed;
                log::info!("Applied {} migration(s)", report.applied.len());
                Ok(report)
            }
            Err(err) => {
                self.state = RunState::RolledBack;
                log::error!("Migration run rolled back: {}", err);
                Err(err)
            }
        }
    }

    /// Body of the run transaction.
    fn run_pending(
        &self,
        db: &dyn Database,
        pending: &[&MigrationFile],
        report: &mut MigrationReport,
    ) -> MigrateResult<()> {
        if db.dialect() == Dialect::Postgres && self.config.advisory_lock {
            let key = advisory_lock_key(&self.config.ledger_table);
            log::debug!("Waiting for advisory lock {}", key);
            db.execute(&format!("SELECT pg_advisory_xact_lock({})", key))?;
        }

        // A concurrent runner may have committed while this one waited.
        let ledger = Ledger::new(db, &self.config.ledger_table);
        let applied: BTreeSet<String> = ledger.read_versions()?;

        for file in pending {
            if applied.contains(&file.name) {
                log::info!("{} was applied concurrently, skipping", file.name);
                continue;
            }
            log::info!("Running migration {}", file.name);
            self.apply_file(db, file, report)?;
            ledger.mark_applied(&file.name)?;
            report.applied.push(file.name.clone());
        }
        Ok(())
    }

    fn apply_file(
        &self,
        db: &dyn Database,
        file: &MigrationFile,
        report: &mut MigrationReport,
    ) -> MigrateResult<()> {
        let raw_sql = file.read_sql()?;
        let statements = split(&raw_sql);
        log::debug!("{}: {} statement(s)", file.name, statements.len());

        for statement in &statements {
            match translate(statement, db.dialect()) {
                Translation::Skip(reason) => {
                    log::info!(
                        "{}: skipped `{}` ({} on {})",
                        file.name,
                        truncate_statement(statement, 60),
                        reason,
                        db.dialect()
                    );
                    report.skipped_statements += 1;
                }
                Translation::Execute(sql) => self.execute_statement(db, file, &sql, report)?,
                Translation::AddColumns(plan) => self.add_columns(db, file, &plan, report)?,
            }
        }
        Ok(())
    }

    /// Add each planned column that does not exist yet.
    fn add_columns(
        &self,
        db: &dyn Database,
        file: &MigrationFile,
        plan: &AddColumnPlan,
        report: &mut MigrationReport,
    ) -> MigrateResult<()> {
        for column in &plan.columns {
            let sql = plan.statement_for(column);
            let exists = db
                .column_exists(&plan.table, &column.name)
                .map_err(|source| statement_error(file, &sql, source))?;
            if exists {
                log::info!(
                    "{}: column {}.{} already exists, skipping",
                    file.name,
                    plan.table,
                    column.name
                );
                report.skipped_columns += 1;
                continue;
            }
            self.execute_statement(db, file, &sql, report)?;
        }
        Ok(())
    }

    fn execute_statement(
        &self,
        db: &dyn Database,
        file: &MigrationFile,
        sql: &str,
        report: &mut MigrationReport,
    ) -> MigrateResult<()> {
        log::debug!("{}: {}", file.name, truncate_statement(sql, STATEMENT_PREVIEW_CHARS));
        match db.execute(sql) {
            Ok(()) => Ok(()),
            Err(err) => match disposition(db.dialect(), &err) {
                Disposition::Ignore => {
                    log::warn!(
                        "{}: ignoring {} error in `{}`: {}",
                        file.name,
                        err.category(),
                        truncate_statement(sql, 60),
                        err
                    );
                    report.ignored_errors += 1;
                    Ok(())
                }
                Disposition::Abort => Err(statement_error(file, sql, err)),
            },
        }
    }

    /// Applied migrations, ordered by version. Read-only: a database that has
    /// never been migrated reports an empty list.
    pub fn list_applied(&self) -> Vec<AppliedMigration> {
        self.ledger().applied_history()
    }

    /// Applied/pending state of every file on disk, plus ledger rows whose
    /// file is gone.
    pub fn status(&self) -> MigrateResult<StatusReport> {
        let files = discover(&self.config.migrations_dir)?;
        let applied = self.list_applied();

        let migrations = files
            .iter()
            .map(|file| {
                let row = applied.iter().find(|a| a.name == file.name);
                MigrationStatus {
                    version: file.version,
                    name: file.name.clone(),
                    state: if row.is_some() {
                        FileState::Applied
                    } else {
                        FileState::Pending
                    },
                    applied_at: row.and_then(|a| a.applied_at),
                }
            })
            .collect();
        let orphaned = applied
            .into_iter()
            .filter(|a| !files.iter().any(|f| f.name == a.name))
            .collect();

        Ok(StatusReport {
            migrations,
            orphaned,
        })
    }
}

fn statement_error(file: &MigrationFile, sql: &str, source: DbError) -> MigrateError {
    MigrateError::Statement {
        migration: file.name.clone(),
        statement: truncate_statement(sql, STATEMENT_PREVIEW_CHARS),
        source,
    }
}

#[cfg(test)]
#[path = "migrator_test.rs"]
mod tests;
