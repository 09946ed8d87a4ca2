//! Translate command implementation

use anyhow::{Context, Result};
use sw_core::sql_utils::truncate_statement;
use sw_core::Translation;
use sw_migrate::{preview, preview_sql, StatementPreview};

use crate::cli::{GlobalArgs, TranslateArgs};
use crate::commands::common::load_context;

/// Execute the translate command
pub(crate) fn execute(args: &TranslateArgs, global: &GlobalArgs) -> Result<()> {
    let ctx = load_context(global)?;
    let dialect = match args.dialect {
        Some(dialect) => dialect,
        None => ctx.database_config()?.db_type,
    };

    if let Some(file) = &args.file {
        let sql = std::fs::read_to_string(file)
            .with_context(|| format!("Failed to read {}", file.display()))?;
        print_statements(&preview_sql(&sql, dialect));
        return Ok(());
    }

    let dir = ctx.migrations_dir()?;
    let files = preview(&dir, dialect).context("Failed to translate migrations")?;
    if files.is_empty() {
        println!("-- no migrations in {}", dir.display());
    }
    for (i, file) in files.iter().enumerate() {
        if i > 0 {
            println!();
        }
        println!("-- {} ({})", file.name, dialect);
        print_statements(&file.statements);
    }
    Ok(())
}

fn print_statements(statements: &[StatementPreview]) {
    for statement in statements {
        if let Translation::Skip(reason) = &statement.translation {
            println!(
                "-- skipped ({}): {}",
                reason,
                truncate_statement(&statement.original, 60)
            );
            continue;
        }
        for sql in statement.rendered() {
            println!("{};", sql);
        }
    }
}
