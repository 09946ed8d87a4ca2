//! sw-db - Database abstraction layer for Stepwise
//!
//! This crate provides the synchronous `Database` trait and implementations
//! for PostgreSQL, SQLite and DuckDB. Backends normalize driver errors into an
//! [`ErrorCategory`] so the migration executor can decide what is ignorable
//! without looking at driver messages.

pub mod duckdb;
pub mod error;
pub mod postgres;
pub(crate) mod row_helpers;
pub mod sqlite;
pub mod traits;

pub use crate::duckdb::DuckDbBackend;
pub use crate::postgres::PostgresBackend;
pub use error::{DbError, DbResult, ErrorCategory};
pub use sqlite::SqliteBackend;
pub use traits::{with_transaction, Database, TextRow};

use sw_core::{DatabaseConfig, Dialect};

/// Open a connection for `config`, choosing the backend by database type.
pub fn open_database(config: &DatabaseConfig) -> DbResult<Box<dyn Database>> {
    log::debug!(
        "Opening {} database at {}",
        config.db_type,
        config.redacted_url()
    );
    let db: Box<dyn Database> = match config.db_type {
        Dialect::Postgres => Box::new(PostgresBackend::connect(&config.url)?),
        Dialect::Sqlite => Box::new(SqliteBackend::new(&config.url)?),
        Dialect::DuckDb => Box::new(DuckDbBackend::new(&config.url)?),
    };
    Ok(db)
}
