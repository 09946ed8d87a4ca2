//! Configuration types and parsing for stepwise.yml

use crate::dialect::Dialect;
use crate::error::{CoreError, CoreResult};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Config filenames looked up in a project directory, in order
pub const CONFIG_FILE_NAMES: [&str; 2] = ["stepwise.yml", "stepwise.yaml"];

/// Default migration directory, relative to the project root
pub const DEFAULT_MIGRATIONS_DIR: &str = "migrations";

/// Default ledger table name
pub const DEFAULT_LEDGER_TABLE: &str = "schema_migrations";

/// Environment variable consulted when no `--target` is given
pub const TARGET_ENV_VAR: &str = "SW_TARGET";

/// Project configuration from stepwise.yml
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Directory holding `<version>_<description>.sql` files
    #[serde(default = "default_migrations_dir")]
    pub migrations_dir: String,

    /// Table recording applied migrations; may be schema-qualified
    #[serde(default = "default_ledger_table")]
    pub ledger_table: String,

    /// Take a PostgreSQL advisory lock for the duration of a run
    #[serde(default = "default_true")]
    pub advisory_lock: bool,

    /// Database connection configuration
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Named target configurations (e.g., dev, ci, prod)
    #[serde(default)]
    pub targets: HashMap<String, TargetConfig>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            migrations_dir: default_migrations_dir(),
            ledger_table: default_ledger_table(),
            advisory_lock: true,
            database: DatabaseConfig::default(),
            targets: HashMap::new(),
        }
    }
}

/// Target-specific configuration overrides
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct TargetConfig {
    /// Database configuration override
    #[serde(default)]
    pub database: Option<DatabaseConfig>,

    /// Migration directory override
    #[serde(default)]
    pub migrations_dir: Option<String>,
}

/// Database connection configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DatabaseConfig {
    /// Database type, which is also the SQL dialect
    #[serde(rename = "type", default)]
    pub db_type: Dialect,

    /// Connection string (PostgreSQL) or file path / `:memory:` (SQLite, DuckDB)
    #[serde(default = "default_db_url")]
    pub url: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            db_type: Dialect::default(),
            url: default_db_url(),
        }
    }
}

impl DatabaseConfig {
    /// Build a config from a bare connection string, inferring the type.
    ///
    /// - `postgres://` / `postgresql://` select PostgreSQL
    /// - `duckdb://` or a `.duckdb` file selects DuckDB
    /// - anything else is a SQLite path (a `sqlite://` prefix is stripped)
    pub fn from_url(url: &str) -> Self {
        let lower = url.to_ascii_lowercase();
        if lower.starts_with("postgres://") || lower.starts_with("postgresql://") {
            return Self {
                db_type: Dialect::Postgres,
                url: url.to_string(),
            };
        }
        if let Some(path) = url.strip_prefix("duckdb://") {
            return Self {
                db_type: Dialect::DuckDb,
                url: path.to_string(),
            };
        }
        if lower.ends_with(".duckdb") {
            return Self {
                db_type: Dialect::DuckDb,
                url: url.to_string(),
            };
        }
        let path = url
            .strip_prefix("sqlite://")
            .or_else(|| url.strip_prefix("sqlite:"))
            .unwrap_or(url);
        Self {
            db_type: Dialect::Sqlite,
            url: path.to_string(),
        }
    }

    /// Connection string with any password replaced, for logging
    pub fn redacted_url(&self) -> String {
        let Some(scheme_end) = self.url.find("://") else {
            return self.url.clone();
        };
        let rest = &self.url[scheme_end + 3..];
        let Some(at) = rest.find('@') else {
            return self.url.clone();
        };
        match rest[..at].find(':') {
            Some(colon) => format!(
                "{}{}:***{}",
                &self.url[..scheme_end + 3],
                &rest[..colon],
                &rest[at..]
            ),
            None => self.url.clone(),
        }
    }
}

fn default_migrations_dir() -> String {
    DEFAULT_MIGRATIONS_DIR.to_string()
}

fn default_ledger_table() -> String {
    DEFAULT_LEDGER_TABLE.to_string()
}

fn default_db_url() -> String {
    ":memory:".to_string()
}

fn default_true() -> bool {
    true
}

impl Config {
    /// Load configuration from a file path
    pub fn load(path: &Path) -> CoreResult<Self> {
        if !path.exists() {
            return Err(CoreError::ConfigNotFound {
                path: path.display().to_string(),
            });
        }

        let content = std::fs::read_to_string(path).map_err(|e| CoreError::IoWithPath {
            path: path.display().to_string(),
            source: e,
        })?;
        let config: Config = serde_yaml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a project directory
    /// Looks for stepwise.yml or stepwise.yaml
    pub fn load_from_dir(dir: &Path) -> CoreResult<Self> {
        match Self::find_in_dir(dir) {
            Some(path) => Self::load(&path),
            None => Err(CoreError::ConfigNotFound {
                path: dir.join(CONFIG_FILE_NAMES[0]).display().to_string(),
            }),
        }
    }

    /// Path of the config file in `dir`, if any
    pub fn find_in_dir(dir: &Path) -> Option<PathBuf> {
        CONFIG_FILE_NAMES
            .iter()
            .map(|name| dir.join(name))
            .find(|p| p.exists())
    }

    /// Validate the configuration
    pub fn validate(&self) -> CoreResult<()> {
        if self.migrations_dir.trim().is_empty() {
            return Err(CoreError::ConfigInvalid {
                message: "migrations_dir cannot be empty".to_string(),
            });
        }
        validate_ledger_table(&self.ledger_table)?;
        for (name, target) in &self.targets {
            if let Some(dir) = &target.migrations_dir {
                if dir.trim().is_empty() {
                    return Err(CoreError::ConfigInvalid {
                        message: format!("targets.{}.migrations_dir cannot be empty", name),
                    });
                }
            }
        }
        Ok(())
    }

    /// Get the list of available target names, sorted
    pub fn available_targets(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.targets.keys().map(|s| s.as_str()).collect();
        names.sort_unstable();
        names
    }

    fn get_target(&self, name: &str) -> CoreResult<&TargetConfig> {
        self.targets
            .get(name)
            .ok_or_else(|| CoreError::UnknownTarget {
                name: name.to_string(),
                available: self.available_targets().join(", "),
            })
    }

    /// Get database configuration, optionally applying target overrides
    pub fn get_database_config(&self, target: Option<&str>) -> CoreResult<DatabaseConfig> {
        match target {
            Some(name) => Ok(self
                .get_target(name)?
                .database
                .clone()
                .unwrap_or_else(|| self.database.clone())),
            None => Ok(self.database.clone()),
        }
    }

    /// Get the migration directory, optionally applying target overrides
    pub fn get_migrations_dir(&self, target: Option<&str>) -> CoreResult<&str> {
        match target {
            Some(name) => Ok(self
                .get_target(name)?
                .migrations_dir
                .as_deref()
                .unwrap_or(&self.migrations_dir)),
            None => Ok(&self.migrations_dir),
        }
    }

    /// Absolute migration directory relative to a project root
    pub fn migrations_dir_absolute(&self, root: &Path, target: Option<&str>) -> CoreResult<PathBuf> {
        Ok(root.join(self.get_migrations_dir(target)?))
    }

    /// Resolve target from CLI flag or SW_TARGET environment variable
    ///
    /// Priority: CLI flag > SW_TARGET env var > None
    pub fn resolve_target(cli_target: Option<&str>) -> Option<String> {
        cli_target
            .map(String::from)
            .or_else(|| std::env::var(TARGET_ENV_VAR).ok())
            .filter(|t| !t.is_empty())
    }
}

/// Ledger table names are plain or schema-qualified SQL identifiers.
fn validate_ledger_table(name: &str) -> CoreResult<()> {
    let valid_part = |part: &str| {
        let mut chars = part.chars();
        matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
            && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
    };
    if name.is_empty() {
        return Err(CoreError::ConfigInvalid {
            message: "ledger_table cannot be empty".to_string(),
        });
    }
    if !name.split('.').all(valid_part) {
        return Err(CoreError::ConfigInvalid {
            message: format!(
                "ledger_table '{}' must be an identifier, optionally schema-qualified",
                name
            ),
        });
    }
    Ok(())
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
