//! Dry-run translation of migration files.

use crate::error::MigrateResult;
use std::path::Path;
use sw_core::catalog::discover;
use sw_core::{split, translate, Dialect, Translation};

/// One statement and what it becomes on the target dialect
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatementPreview {
    pub original: String,
    pub translation: Translation,
}

impl StatementPreview {
    /// SQL that would be sent to the database, in order
    pub fn rendered(&self) -> Vec<String> {
        match &self.translation {
            Translation::Execute(sql) => vec![sql.clone()],
            Translation::Skip(_) => Vec::new(),
            Translation::AddColumns(plan) => plan
                .columns
                .iter()
                .map(|c| plan.statement_for(c))
                .collect(),
        }
    }
}

/// Preview of one migration file
#[derive(Debug, Clone)]
pub struct FilePreview {
    pub name: String,
    pub statements: Vec<StatementPreview>,
}

/// Split and translate raw SQL without touching a database.
pub fn preview_sql(raw_sql: &str, dialect: Dialect) -> Vec<StatementPreview> {
    split(raw_sql)
        .into_iter()
        .map(|original| {
            let translation = translate(&original, dialect);
            StatementPreview {
                original,
                translation,
            }
        })
        .collect()
}

/// Translate every migration in `dir` for `dialect`, in version order.
pub fn preview(dir: &Path, dialect: Dialect) -> MigrateResult<Vec<FilePreview>> {
    discover(dir)?
        .into_iter()
        .map(|file| -> MigrateResult<FilePreview> {
            let sql = file.read_sql()?;
            Ok(FilePreview {
                statements: preview_sql(&sql, dialect),
                name: file.name,
            })
        })
        .collect()
}
