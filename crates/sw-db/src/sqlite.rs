//! SQLite database backend implementation

use crate::error::{DbError, DbResult, ErrorCategory};
use crate::traits::{Database, TextRow};
use rusqlite::types::ValueRef;
use rusqlite::{params_from_iter, Connection};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;
use sw_core::sql_utils::split_qualified_name;
use sw_core::Dialect;

/// How long a writer waits for another connection's lock before failing
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Keywords SQLite reports as `near "<kw>": syntax error` for constructs it
/// has no equivalent of
const UNSUPPORTED_KEYWORDS: &[&str] = &["extension", "function", "procedure", "trigger", "do"];

/// SQLite database backend
pub struct SqliteBackend {
    conn: Mutex<Connection>,
}

impl SqliteBackend {
    /// Create a new in-memory SQLite connection
    pub fn in_memory() -> DbResult<Self> {
        let conn =
            Connection::open_in_memory().map_err(|e| DbError::ConnectionError(e.to_string()))?;
        Self::from_connection(conn)
    }

    /// Open (creating if needed) a SQLite database file
    pub fn from_path(path: &Path) -> DbResult<Self> {
        let conn = Connection::open(path).map_err(|e| {
            DbError::ConnectionError(format!("{}: {}", path.display(), e))
        })?;
        Self::from_connection(conn)
    }

    /// Create from path string (handles :memory: special case)
    pub fn new(path: &str) -> DbResult<Self> {
        if path == ":memory:" {
            Self::in_memory()
        } else {
            Self::from_path(Path::new(path))
        }
    }

    fn from_connection(conn: Connection) -> DbResult<Self> {
        conn.busy_timeout(BUSY_TIMEOUT)
            .map_err(|e| DbError::ConnectionError(e.to_string()))?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
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

/// Map a SQLite error onto an [`ErrorCategory`].
///
/// SQLite reports all of these as the generic `SQLITE_ERROR`, so the message
/// is the only signal. A call to an unknown function is a real failure and
/// stays [`ErrorCategory::Other`].
pub(crate) fn classify(message: &str) -> ErrorCategory {
    let msg = message.to_ascii_lowercase();
    if msg.contains("duplicate column name") {
        ErrorCategory::DuplicateColumn
    } else if msg.contains("already exists") {
        ErrorCategory::AlreadyExists
    } else if UNSUPPORTED_KEYWORDS
        .iter()
        .any(|kw| msg.contains(&format!("near \"{}\"", kw)))
    {
        ErrorCategory::UnsupportedFeature
    } else {
        ErrorCategory::Other
    }
}

fn execution_error(err: rusqlite::Error) -> DbError {
    let message = err.to_string();
    DbError::execution(classify(&message), message)
}

fn value_to_text(value: ValueRef<'_>) -> Option<String> {
    match value {
        ValueRef::Null => None,
        ValueRef::Integer(n) => Some(n.to_string()),
        ValueRef::Real(f) => Some(f.to_string()),
        ValueRef::Text(bytes) => Some(String::from_utf8_lossy(bytes).into_owned()),
        ValueRef::Blob(bytes) => Some(bytes.iter().map(|b| format!("{:02x}", b)).collect()),
    }
}

impl Database for SqliteBackend {
    fn dialect(&self) -> Dialect {
        Dialect::Sqlite
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
        let column_count = stmt.column_count();
        let rows = stmt
            .query_map([], |row| {
                (0..column_count)
                    .map(|i| row.get_ref(i).map(value_to_text))
                    .collect::<Result<TextRow, _>>()
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
                "SELECT COUNT(*) FROM pragma_table_info(?1, ?2) WHERE lower(name) = lower(?3)",
                [table, schema, column],
                |row| row.get(0),
            )
            .map_err(|e| DbError::QueryError(e.to_string()))?;
        Ok(count > 0)
    }

    fn begin(&self) -> DbResult<()> {
        self.transaction_control("BEGIN IMMEDIATE")
    }

    fn commit(&self) -> DbResult<()> {
        self.transaction_control("COMMIT")
    }

    fn rollback(&self) -> DbResult<()> {
        self.transaction_control("ROLLBACK")
    }
}

#[cfg(test)]
#[path = "sqlite_test.rs"]
mod tests;
