//! Error types for sw-db

use std::fmt;
use thiserror::Error;

/// Backend-independent classification of a failed statement.
///
/// Each backend maps its driver errors onto these categories once, so
/// callers never inspect driver messages themselves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// The column being added already exists
    DuplicateColumn,
    /// A table, index, schema or other object already exists
    AlreadyExists,
    /// The construct (extension, stored function, trigger) is not understood
    UnsupportedFeature,
    /// Anything else
    Other,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorCategory::DuplicateColumn => "duplicate column",
            ErrorCategory::AlreadyExists => "already exists",
            ErrorCategory::UnsupportedFeature => "unsupported feature",
            ErrorCategory::Other => "other",
        };
        f.write_str(name)
    }
}

/// Database operation errors
#[derive(Error, Debug)]
pub enum DbError {
    /// Connection error (D001)
    #[error("[D001] Database connection failed: {0}")]
    ConnectionError(String),

    /// Statement execution error (D002)
    #[error("[D002] SQL execution failed: {message}")]
    ExecutionError {
        category: ErrorCategory,
        message: String,
    },

    /// Query error (D003)
    #[error("[D003] Query failed: {0}")]
    QueryError(String),

    /// Transaction control error (D004)
    #[error("[D004] Transaction error: {0}")]
    TransactionError(String),

    /// Mutex poisoned (D005)
    #[error("[D005] Database mutex poisoned: {0}")]
    MutexPoisoned(String),
}

impl DbError {
    /// Normalized category; `Other` for anything but execution errors
    pub fn category(&self) -> ErrorCategory {
        match self {
            DbError::ExecutionError { category, .. } => *category,
            _ => ErrorCategory::Other,
        }
    }

    pub(crate) fn execution(category: ErrorCategory, message: impl Into<String>) -> Self {
        DbError::ExecutionError {
            category,
            message: message.into(),
        }
    }
}

/// Result type alias for DbError
pub type DbResult<T> = Result<T, DbError>;
