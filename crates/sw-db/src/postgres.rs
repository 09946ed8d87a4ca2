//! PostgreSQL database backend implementation

use crate::error::{DbError, DbResult, ErrorCategory};
use crate::traits::{Database, TextRow};
use postgres::types::ToSql;
use postgres::{Client, NoTls, SimpleQueryMessage};
use std::sync::{Mutex, MutexGuard};
use sw_core::sql_utils::split_qualified_name;
use sw_core::Dialect;

/// PostgreSQL database backend over a blocking client
pub struct PostgresBackend {
    client: Mutex<Client>,
}

impl PostgresBackend {
    /// Connect using a `postgres://` connection string
    pub fn connect(url: &str) -> DbResult<Self> {
        let client =
            Client::connect(url, NoTls).map_err(|e| DbError::ConnectionError(e.to_string()))?;
        Ok(Self {
            client: Mutex::new(client),
        })
    }

    fn lock(&self) -> DbResult<MutexGuard<'_, Client>> {
        self.client
            .lock()
            .map_err(|e| DbError::MutexPoisoned(e.to_string()))
    }

    fn transaction_control(&self, sql: &str) -> DbResult<()> {
        self.lock()?
            .batch_execute(sql)
            .map_err(|e| DbError::TransactionError(format!("{} failed: {}", sql, e)))
    }
}

/// Map a SQLSTATE code onto an [`ErrorCategory`].
pub(crate) fn classify_sqlstate(code: &str) -> ErrorCategory {
    match code {
        // duplicate_column
        "42701" => ErrorCategory::DuplicateColumn,
        // duplicate_table, duplicate_object, duplicate_function, duplicate_schema
        "42P07" | "42710" | "42723" | "42P06" => ErrorCategory::AlreadyExists,
        // feature_not_supported, undefined_function, undefined_file
        "0A000" | "42883" | "58P01" => ErrorCategory::UnsupportedFeature,
        _ => ErrorCategory::Other,
    }
}

fn execution_error(err: postgres::Error) -> DbError {
    let category = err
        .code()
        .map_or(ErrorCategory::Other, |state| classify_sqlstate(state.code()));
    let message = match err.as_db_error() {
        Some(db) => format!("{} (SQLSTATE {})", db.message(), db.code().code()),
        None => err.to_string(),
    };
    DbError::execution(category, message)
}

impl Database for PostgresBackend {
    fn dialect(&self) -> Dialect {
        Dialect::Postgres
    }

    fn execute(&self, sql: &str) -> DbResult<()> {
        self.lock()?.batch_execute(sql).map_err(execution_error)
    }

    fn execute_params(&self, sql: &str, params: &[&str]) -> DbResult<usize> {
        let values: Vec<&(dyn ToSql + Sync)> =
            params.iter().map(|p| p as &(dyn ToSql + Sync)).collect();
        let affected = self
            .lock()?
            .execute(sql, &values)
            .map_err(execution_error)?;
        Ok(affected as usize)
    }

    fn query_rows(&self, sql: &str) -> DbResult<Vec<TextRow>> {
        let messages = self
            .lock()?
            .simple_query(sql)
            .map_err(|e| DbError::QueryError(e.to_string()))?;
        let rows = messages
            .into_iter()
            .filter_map(|message| match message {
                SimpleQueryMessage::Row(row) => Some(
                    (0..row.len())
                        .map(|i| row.get(i).map(str::to_string))
                        .collect::<TextRow>(),
                ),
                _ => None,
            })
            .collect();
        Ok(rows)
    }

    fn column_exists(&self, table: &str, column: &str) -> DbResult<bool> {
        let (schema, table) = split_qualified_name(table);
        let row = self
            .lock()?
            .query_one(
                "SELECT COUNT(*) FROM information_schema.columns \
                 WHERE table_schema::text = COALESCE($1::text, current_schema()::text) \
                 AND table_name::text = $2::text \
                 AND column_name::text = $3::text",
                &[&schema, &table, &column],
            )
            .map_err(|e| DbError::QueryError(e.to_string()))?;
        let count: i64 = row.get(0);
        Ok(count > 0)
    }

    fn begin(&self) -> DbResult<()> {
        self.transaction_control("BEGIN")
    }

    fn commit(&self) -> DbResult<()> {
        self.transaction_control("COMMIT")
    }

    fn rollback(&self) -> DbResult<()> {
        self.transaction_control("ROLLBACK")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_sqlstate() {
        assert_eq!(classify_sqlstate("42701"), ErrorCategory::DuplicateColumn);
        assert_eq!(classify_sqlstate("42P07"), ErrorCategory::AlreadyExists);
        assert_eq!(classify_sqlstate("42710"), ErrorCategory::AlreadyExists);
        assert_eq!(classify_sqlstate("0A000"), ErrorCategory::UnsupportedFeature);
        assert_eq!(classify_sqlstate("23505"), ErrorCategory::Other);
    }

    #[test]
    fn test_connect_failure_is_connection_error() {
        let err = PostgresBackend::connect("not a connection string ::").err();
        assert!(matches!(err, Some(DbError::ConnectionError(_))));
    }
}
