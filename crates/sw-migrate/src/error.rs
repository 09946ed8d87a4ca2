//! Error types for the migration engine.

use sw_core::CoreError;
use sw_db::DbError;
use thiserror::Error;

/// Migration engine errors.
#[derive(Error, Debug)]
pub enum MigrateError {
    /// Discovering or reading migration files failed (M001).
    #[error("[M001] {0}")]
    Core(#[from] CoreError),

    /// The ledger table could not be read or written (M002).
    #[error("[M002] Ledger {action} failed on '{table}': {source}")]
    Ledger {
        action: &'static str,
        table: String,
        #[source]
        source: DbError,
    },

    /// A statement failed fatally; the run was rolled back (M003).
    #[error("[M003] Migration '{migration}' failed at `{statement}`: {source}")]
    Statement {
        migration: String,
        statement: String,
        #[source]
        source: DbError,
    },

    /// Opening, committing or locking the run transaction failed (M004).
    #[error("[M004] Migration transaction failed: {0}")]
    Transaction(#[from] DbError),

    /// A new migration file could not be created (M005).
    #[error("[M005] Cannot create migration: {0}")]
    Scaffold(String),
}

/// Result type alias for [`MigrateError`].
pub type MigrateResult<T> = Result<T, MigrateError>;
