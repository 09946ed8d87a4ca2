//! Migration file discovery.
//!
//! A migration directory holds files named `<integer>_<description>.sql`.
//! Files are ordered by the parsed integer, never by filesystem or lexical
//! order, so `2_x.sql` runs before `10_y.sql`.

use crate::error::{CoreError, CoreResult};
use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};

/// A versioned SQL migration file on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationFile {
    /// Numeric prefix parsed from the filename
    pub version: u64,
    /// Full filename, used as the ledger key
    pub name: String,
    /// Absolute or directory-relative path to the file
    pub path: PathBuf,
}

impl MigrationFile {
    /// Read the raw SQL contents of the file.
    pub fn read_sql(&self) -> CoreResult<String> {
        std::fs::read_to_string(&self.path).map_err(|e| CoreError::IoWithPath {
            path: self.path.display().to_string(),
            source: e,
        })
    }
}

impl fmt::Display for MigrationFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// Parse the numeric version out of a migration filename.
///
/// Returns `Ok(None)` for names that are not migrations (wrong extension, no
/// digit prefix, no `_` after the digits). Returns an error when the prefix is
/// all digits but does not fit in a `u64`.
pub fn parse_version(file_name: &str) -> CoreResult<Option<u64>> {
    let Some(stem) = file_name.strip_suffix(".sql") else {
        return Ok(None);
    };
    let digits_end = stem
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(stem.len());
    if digits_end == 0 || !stem[digits_end..].starts_with('_') {
        return Ok(None);
    }
    stem[..digits_end]
        .parse::<u64>()
        .map(Some)
        .map_err(|e| CoreError::InvalidMigrationName {
            name: file_name.to_string(),
            reason: e.to_string(),
        })
}

/// Discover migration files in `dir`, ordered by ascending version.
///
/// A missing directory yields an empty list. Files whose names do not match
/// `^<digits>_.*\.sql$` and subdirectories are ignored.
pub fn discover(dir: &Path) -> CoreResult<Vec<MigrationFile>> {
    if !dir.is_dir() {
        log::info!(
            "Migration directory {} not found, nothing to discover",
            dir.display()
        );
        return Ok(Vec::new());
    }

    let entries = std::fs::read_dir(dir).map_err(|e| CoreError::IoWithPath {
        path: dir.display().to_string(),
        source: e,
    })?;

    let mut files = Vec::new();
    let mut seen: HashMap<u64, String> = HashMap::new();

    for entry in entries {
        let entry = entry.map_err(|e| CoreError::IoWithPath {
            path: dir.display().to_string(),
            source: e,
        })?;
        let path = entry.path();
        if path.is_dir() {
            continue;
        }
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        let Some(version) = parse_version(name)? else {
            log::debug!("Ignoring non-migration file {}", path.display());
            continue;
        };
        if let Some(first) = seen.insert(version, name.to_string()) {
            let (first, second) = if first.as_str() < name {
                (first, name.to_string())
            } else {
                (name.to_string(), first)
            };
            return Err(CoreError::DuplicateVersion {
                version,
                first,
                second,
            });
        }
        files.push(MigrationFile {
            version,
            name: name.to_string(),
            path,
        });
    }

    files.sort_by_key(|f| f.version);

    if files.is_empty() {
        log::info!("No migration files found in {}", dir.display());
    } else {
        log::debug!("Discovered {} migration file(s) in {}", files.len(), dir.display());
    }
    Ok(files)
}

#[cfg(test)]
#[path = "catalog_test.rs"]
mod tests;
