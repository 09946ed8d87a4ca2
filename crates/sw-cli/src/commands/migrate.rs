//! Migrate command implementation

use anyhow::{Context, Result};
use sw_migrate::{MigrationReport, Migrator};

use crate::cli::{GlobalArgs, MigrateArgs, ReportOutput};
use crate::commands::common::{load_context, print_json};

/// Execute the migrate command
pub(crate) fn execute(args: &MigrateArgs, global: &GlobalArgs) -> Result<()> {
    let ctx = load_context(global)?;
    let db = ctx.connect()?;
    let mut migrator = Migrator::new(db.as_ref(), ctx.migrator_config()?);

    let report = migrator
        .ensure_and_apply()
        .context("Migration run failed; no changes were kept")?;

    match args.output {
        ReportOutput::Text => print_summary(&report),
        ReportOutput::Json => print_json(&report)?,
    }
    Ok(())
}

fn print_summary(report: &MigrationReport) {
    if report.applied.is_empty() {
        println!(
            "Nothing to apply ({} migration{} on disk)",
            report.discovered,
            if report.discovered == 1 { "" } else { "s" }
        );
        return;
    }

    for name in &report.applied {
        println!("  applied  {}", name);
    }
    println!();
    println!(
        "Applied {} of {} migration{}",
        report.applied.len(),
        report.discovered,
        if report.discovered == 1 { "" } else { "s" }
    );

    let notes: Vec<String> = [
        (report.skipped_statements, "statement(s) skipped for this dialect"),
        (report.skipped_columns, "existing column(s) left unchanged"),
        (report.ignored_errors, "ignorable error(s) tolerated"),
    ]
    .iter()
    .filter(|(count, _)| *count > 0)
    .map(|(count, what)| format!("{} {}", count, what))
    .collect();
    if !notes.is_empty() {
        println!("  {}", notes.join(", "));
    }
}
