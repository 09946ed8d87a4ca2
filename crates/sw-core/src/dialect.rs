//! SQL dialects supported by the migration engine.
//!
//! PostgreSQL is the canonical dialect: migration files are authored for it
//! and pass through untranslated. SQLite and DuckDB are reduced dialects whose
//! capabilities drive the rewrite rules in [`crate::translate`].

use crate::error::CoreError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Target SQL dialect
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
    /// PostgreSQL server dialect
    Postgres,
    /// SQLite embedded-file dialect (default)
    #[default]
    Sqlite,
    /// DuckDB embedded-file dialect
    #[serde(rename = "duckdb")]
    DuckDb,
}

impl Dialect {
    /// The dialect migration files are written in. Statements pass through
    /// unchanged.
    pub fn is_canonical(self) -> bool {
        matches!(self, Dialect::Postgres)
    }

    /// `CREATE EXTENSION` is understood.
    pub fn supports_extensions(self) -> bool {
        self.is_canonical()
    }

    /// `CREATE FUNCTION` / `CREATE TRIGGER` in the PL/pgSQL form are understood.
    pub fn supports_stored_procedures(self) -> bool {
        self.is_canonical()
    }

    /// A native `UUID` column type exists.
    pub fn has_uuid_type(self) -> bool {
        !matches!(self, Dialect::Sqlite)
    }

    /// `gen_random_uuid()` is a builtin.
    pub fn has_gen_random_uuid(self) -> bool {
        !matches!(self, Dialect::Sqlite)
    }

    /// `uuid_generate_v4()` (from the `uuid-ossp` extension) is available.
    pub fn has_uuid_generate_v4(self) -> bool {
        self.is_canonical()
    }

    /// Multiple `ADD COLUMN` actions in one `ALTER TABLE` with
    /// `IF NOT EXISTS` guards are understood.
    pub fn supports_multi_add_column(self) -> bool {
        self.is_canonical()
    }

    /// A failed statement leaves the surrounding transaction usable, so an
    /// ignorable error can be skipped without aborting the run.
    ///
    /// PostgreSQL and DuckDB both poison the transaction on any error.
    pub fn tolerates_statement_errors(self) -> bool {
        matches!(self, Dialect::Sqlite)
    }

    /// Dialect name used in config and logs
    pub fn name(self) -> &'static str {
        match self {
            Dialect::Postgres => "postgres",
            Dialect::Sqlite => "sqlite",
            Dialect::DuckDb => "duckdb",
        }
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Dialect {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "postgres" | "postgresql" | "pg" => Ok(Dialect::Postgres),
            "sqlite" | "sqlite3" => Ok(Dialect::Sqlite),
            "duckdb" => Ok(Dialect::DuckDb),
            _ => Err(CoreError::UnknownDialect {
                name: s.to_string(),
            }),
        }
    }
}
