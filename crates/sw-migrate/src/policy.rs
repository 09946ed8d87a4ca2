//! Failure policy for statements that error during a run.

use sw_core::Dialect;
use sw_db::{DbError, ErrorCategory};

/// What the executor does with a failed statement
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    /// Log, skip the statement, keep going within the same file
    Ignore,
    /// Roll back the whole run
    Abort,
}

/// Decide how to handle `err` raised by a statement on `dialect`.
///
/// Only dialects whose transactions survive a failed statement can skip one,
/// and only for errors meaning "already done" or "no equivalent here".
pub fn disposition(dialect: Dialect, err: &DbError) -> Disposition {
    if !dialect.tolerates_statement_errors() {
        return Disposition::Abort;
    }
    match err.category() {
        ErrorCategory::DuplicateColumn
        | ErrorCategory::AlreadyExists
        | ErrorCategory::UnsupportedFeature => Disposition::Ignore,
        ErrorCategory::Other => Disposition::Abort,
    }
}
