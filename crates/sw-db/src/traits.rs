//! Database trait definition

use crate::error::DbResult;
use sw_core::Dialect;

/// A row read back as text, `None` for SQL NULL
pub type TextRow = Vec<Option<String>>;

/// Synchronous database abstraction for Stepwise
///
/// One implementation wraps one connection. Transactions are explicit:
/// `begin`, then any number of statements, then `commit` or `rollback`.
pub trait Database: Send + Sync {
    /// SQL dialect spoken by this backend
    fn dialect(&self) -> Dialect;

    /// Database type identifier for logging
    fn db_type(&self) -> &'static str {
        self.dialect().name()
    }

    /// Execute one statement (or a batch) that returns no rows
    fn execute(&self, sql: &str) -> DbResult<()>;

    /// Execute one statement with positional text parameters, returning the
    /// number of affected rows
    fn execute_params(&self, sql: &str, params: &[&str]) -> DbResult<usize>;

    /// Run a query and return every row with each column rendered as text
    fn query_rows(&self, sql: &str) -> DbResult<Vec<TextRow>>;

    /// Check whether `column` exists on `table` (optionally schema-qualified)
    fn column_exists(&self, table: &str, column: &str) -> DbResult<bool>;

    /// Open a transaction
    fn begin(&self) -> DbResult<()>;

    /// Commit the open transaction
    fn commit(&self) -> DbResult<()>;

    /// Roll back the open transaction
    fn rollback(&self) -> DbResult<()>;
}

/// Execute `body` within a `begin` / `commit` pair, rolling back on error.
///
/// A failed rollback is logged and the original error is returned.
pub fn with_transaction<T, E, F>(db: &dyn Database, body: F) -> Result<T, E>
where
    F: FnOnce(&dyn Database) -> Result<T, E>,
    E: From<crate::error::DbError>,
{
    db.begin()?;
    match body(db) {
        Ok(value) => {
            if let Err(commit_err) = db.commit() {
                if let Err(e) = db.rollback() {
                    log::warn!("Rollback after failed commit also failed: {}", e);
                }
                return Err(commit_err.into());
            }
            Ok(value)
        }
        Err(err) => {
            if let Err(e) = db.rollback() {
                log::warn!("Rollback failed: {}", e);
            }
            Err(err)
        }
    }
}
