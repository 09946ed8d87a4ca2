//! DuckDB database backend implementation

use crate::error::{DbError, DbResult, ErrorCategory};
use crate::row_helpers::get_column_as_string;
use crate::traits::{Database, TextRow};
use duckdb::{params_from_iter, Connection};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use sw_core::sql_utils::split_qualified_name;
use sw_core::Dialect;

/// DuckDB database backend
pub struct DuckDbBackend {
    conn: Mutex<Connection>,
}

impl DuckDbBackend {
    /// Create a new in-memory DuckDB connection
    pub fn in_memory() -> DbResult<Self> {
        let conn =
            Connection::open_in_memory().map_err(|e| DbError::ConnectionError(e.to_string()))?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Create a new DuckDB connection from a file path
    pub fn from_path(path: &Path) -> DbResult<Self> {
        let conn = Connection::open(path).map_err(|e| {
            DbError::ConnectionError(format!("{}: {}", path.display(), e))
        })?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Create from path string (handles :memory: special case)
    pub fn new(path: &str) -> DbResult<Self> {
        if path == ":memory:" {
            Self::in_memory()
        } else {
            Self::from_path(Path::new(path))
        }
    }

    fn lock(&self) -> DbResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| DbError::MutexPoisoned(e.to_string()))
    }

    fn transaction_control(&self, sql: &str) -> DbResult<()> {
        self.lock()?
            .execute_batch(sql)
            .map_err(|e| DbError::TransactionError(format!("{} failed: {}", sql, e)))
    }
}

/// Map a DuckDB error onto an [`ErrorCategory`].
///
/// `duckdb::Error` does not expose structured variants, so the message is
/// inspected with narrow patterns.
pub(crate) fn classify(message: &str) -> ErrorCategory {
    let msg = message.to_ascii_lowercase();
    if msg.contains("column with name") && msg.contains("already exists") {
        ErrorCategory::DuplicateColumn
    } else if msg.contains("already exists") {
        ErrorCategory::AlreadyExists
    } else if msg.contains("not implemented")
        || (msg.contains("function with name") && msg.contains("does not exist"))
        || ["extension", "trigger", "procedure"]
            .iter()
            .any(|kw| msg.contains(&format!("at or near \"{}\"", kw)))
    {
        ErrorCategory::UnsupportedFeature
    } else {
        ErrorCategory::Other
    }
}

fn execution_error(err: duckdb::Error) -> DbError {
    let message = err.to_string();
    DbError::execution(classify(&message), message)
}

impl Database for DuckDbBackend {
    fn dialect(&self) -> Dialect {
        Dialect::DuckDb
    }

    fn execute(&self, sql: &str) -> DbResult<()> {
        self.lock()?.execute_batch(sql).map_err(execution_error)
    }

    fn execute_params(&self, sql: &str, params: &[&str]) -> DbResult<usize> {
        self.lock()?
            .execute(sql, params_from_iter(params.iter()))
            .map_err(execution_error)
    }

    fn query_rows(&self, sql: &str) -> DbResult<Vec<TextRow>> {
        let conn = self.lock()?;
        let mut stmt = conn
            .prepare(sql)
            .map_err(|e| DbError::QueryError(e.to_string()))?;
        // column_count() before execution panics, read it per row instead
        let rows = stmt
            .query_map([], |row| {
                let col_count = row.as_ref().column_count();
                Ok((0..col_count)
                    .map(|i| get_column_as_string(row, i))
                    .collect::<TextRow>())
            })
            .map_err(|e| DbError::QueryError(e.to_string()))?
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| DbError::QueryError(format!("row error: {}", e)))?;
        Ok(rows)
    }

    fn column_exists(&self, table: &str, column: &str) -> DbResult<bool> {
        let (schema, table) = split_qualified_name(table);
        let schema = schema.unwrap_or("main");
        let count: i64 = self
            .lock()?
            .query_row(
                "SELECT COUNT(*) FROM information_schema.columns \
                 WHERE lower(table_schema) = lower(?) \
                 AND lower(table_name) = lower(?) \
                 AND lower(column_name) = lower(?)",
                [schema, table, column],
                |row| row.get(0),
            )
            .map_err(|e| DbError::QueryError(e.to_string()))?;
        Ok(count > 0)
    }

    fn begin(&self) -> DbResult<()> {
        self.transaction_control("BEGIN TRANSACTION")
    }

    fn commit(&self) -> DbResult<()> {
        self.transaction_control("COMMIT")
    }

    fn rollback(&self) -> DbResult<()> {
        self.transaction_control("ROLLBACK")
    }
}

#[cfg(test)]
#[path = "duckdb_test.rs"]
mod tests;
