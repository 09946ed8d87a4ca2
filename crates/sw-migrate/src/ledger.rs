//! Applied-migration ledger.
//!
//! One row per applied migration file, keyed by filename. Rows are only ever
//! inserted, and always inside the run transaction together with the schema
//! change they record.

use crate::error::{MigrateError, MigrateResult};
use chrono::NaiveDateTime;
use serde::Serialize;
use std::collections::BTreeSet;
use sw_core::catalog::parse_version;
use sw_core::sql_utils::quote_qualified;
use sw_core::Dialect;
use sw_db::Database;

/// A row of the ledger table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AppliedMigration {
    /// Migration filename
    pub name: String,
    /// When the migration was recorded; `None` if the stored value could not
    /// be parsed
    pub applied_at: Option<NaiveDateTime>,
}

/// Ledger table accessor bound to one connection.
pub struct Ledger<'a> {
    db: &'a dyn Database,
    table: &'a str,
}

impl<'a> Ledger<'a> {
    pub fn new(db: &'a dyn Database, table: &'a str) -> Self {
        Self { db, table }
    }

    fn quoted_table(&self) -> String {
        quote_qualified(self.table)
    }

    /// Create the ledger table if missing.
    ///
    /// Never fails: a creation error (for instance a concurrent runner
    /// creating the same table) is logged and the run continues.
    pub fn ensure_table(&self) {
        let sql = format!(
            "CREATE TABLE IF NOT EXISTS {} (\
             version VARCHAR(255) PRIMARY KEY, \
             applied_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP)",
            self.quoted_table()
        );
        match self.db.execute(&sql) {
            Ok(()) => log::debug!("Ledger table {} ready", self.table),
            Err(e) => log::warn!("Could not create ledger table {}: {}", self.table, e),
        }
    }

    /// Names of applied migrations, empty if the ledger cannot be read.
    pub fn applied_versions(&self) -> BTreeSet<String> {
        match self.read_versions() {
            Ok(versions) => versions,
            Err(e) => {
                log::warn!("Treating ledger as empty: {}", e);
                BTreeSet::new()
            }
        }
    }

    /// Names of applied migrations, propagating read errors.
    pub fn read_versions(&self) -> MigrateResult<BTreeSet<String>> {
        let rows = self
            .db
            .query_rows(&format!("SELECT version FROM {}", self.quoted_table()))
            .map_err(|source| self.error("read", source))?;
        Ok(rows
            .into_iter()
            .filter_map(|row| row.into_iter().next().flatten())
            .collect())
    }

    /// Every ledger row, ordered by migration version.
    pub fn applied_migrations(&self) -> MigrateResult<Vec<AppliedMigration>> {
        let rows = self
            .db
            .query_rows(&format!(
                "SELECT version, CAST(applied_at AS VARCHAR) FROM {}",
                self.quoted_table()
            ))
            .map_err(|source| self.error("read", source))?;

        let mut applied: Vec<AppliedMigration> = rows
            .into_iter()
            .filter_map(|row| {
                let mut cols = row.into_iter();
                let name = cols.next().flatten()?;
                let applied_at = cols.next().flatten().and_then(|ts| parse_timestamp(&ts));
                Some(AppliedMigration { name, applied_at })
            })
            .collect();
        applied.sort_by(|a, b| {
            sort_key(&a.name)
                .cmp(&sort_key(&b.name))
                .then_with(|| a.name.cmp(&b.name))
        });
        Ok(applied)
    }

    /// Every ledger row, or nothing if the ledger cannot be read (typically
    /// because no run has created it yet). Never writes.
    pub fn applied_history(&self) -> Vec<AppliedMigration> {
        match self.applied_migrations() {
            Ok(applied) => applied,
            Err(e) => {
                log::debug!("Treating ledger as empty: {}", e);
                Vec::new()
            }
        }
    }

    /// Record `name` as applied. Re-recording an applied name is a no-op.
    pub fn mark_applied(&self, name: &str) -> MigrateResult<()> {
        let table = self.quoted_table();
        let sql = match self.db.dialect() {
            Dialect::Postgres => format!(
                "INSERT INTO {} (version) VALUES ($1) ON CONFLICT DO NOTHING",
                table
            ),
            Dialect::Sqlite => format!("INSERT OR IGNORE INTO {} (version) VALUES (?1)", table),
            Dialect::DuckDb => format!("INSERT OR IGNORE INTO {} (version) VALUES (?)", table),
        };
        self.db
            .execute_params(&sql, &[name])
            .map_err(|source| self.error("insert", source))?;
        Ok(())
    }

    fn error(&self, action: &'static str, source: sw_db::DbError) -> MigrateError {
        MigrateError::Ledger {
            action,
            table: self.table.to_string(),
            source,
        }
    }
}

/// Key for `pg_advisory_xact_lock`, derived from the ledger table name so
/// projects sharing a database but not a ledger do not block each other.
pub fn advisory_lock_key(table: &str) -> i64 {
    // 64-bit FNV-1a
    let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
    for byte in table.bytes() {
        hash ^= u64::from(byte);
        hash = hash.wrapping_mul(0x0100_0000_01b3);
    }
    hash as i64
}

/// Versioned names first, ascending; anything else after them.
fn sort_key(name: &str) -> (bool, u64) {
    match parse_version(name).ok().flatten() {
        Some(version) => (false, version),
        None => (true, 0),
    }
}

/// Parse a timestamp as rendered by any backend's text cast.
fn parse_timestamp(value: &str) -> Option<NaiveDateTime> {
    let value = value.trim();
    let parsed = ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok());
    if parsed.is_none() {
        log::debug!("Unrecognized ledger timestamp '{}'", value);
    }
    parsed
}

#[cfg(test)]
#[path = "ledger_test.rs"]
mod tests;
