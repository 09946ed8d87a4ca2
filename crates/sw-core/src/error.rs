//! Error types for sw-core

use thiserror::Error;

/// Core error type for Stepwise
#[derive(Error, Debug)]
pub enum CoreError {
    /// C001: Configuration file not found
    #[error("[C001] Config file not found: {path}")]
    ConfigNotFound { path: String },

    /// C002: Invalid configuration value
    #[error("[C002] Invalid config: {message}")]
    ConfigInvalid { message: String },

    /// C003: Unknown target name
    #[error("[C003] Unknown target '{name}'. Available targets: {available}")]
    UnknownTarget { name: String, available: String },

    /// C004: Two migration files share a numeric version
    #[error("[C004] Duplicate migration version {version}: '{first}' and '{second}'")]
    DuplicateVersion {
        version: u64,
        first: String,
        second: String,
    },

    /// C005: Migration filename cannot be parsed
    #[error("[C005] Invalid migration filename '{name}': {reason}")]
    InvalidMigrationName { name: String, reason: String },

    /// C006: Unknown dialect or database type name
    #[error("[C006] Unknown dialect '{name}'. Expected one of: postgres, sqlite, duckdb")]
    UnknownDialect { name: String },

    /// C007: IO error with file path context
    #[error("[C007] Failed to read '{path}': {source}")]
    IoWithPath {
        path: String,
        source: std::io::Error,
    },

    /// C008: Config YAML parse error
    #[error("[C008] Failed to parse config: {0}")]
    YamlParse(#[from] serde_yaml::Error),
}

/// Result type alias for CoreError
pub type CoreResult<T> = Result<T, CoreError>;
