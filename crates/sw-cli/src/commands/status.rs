//! Status command implementation

use anyhow::{Context, Result};
use sw_migrate::{Migrator, StatusReport};

use crate::cli::{GlobalArgs, ListOutput, StatusArgs};
use crate::commands::common::{load_context, print_json, print_table, ExitCode};

/// Execute the status command
pub(crate) fn execute(args: &StatusArgs, global: &GlobalArgs) -> Result<()> {
    let ctx = load_context(global)?;
    let db = ctx.connect()?;
    let migrator = Migrator::new(db.as_ref(), ctx.migrator_config()?);

    let report = migrator.status().context("Failed to read migration status")?;

    match args.output {
        ListOutput::Table => print_status_table(&report),
        ListOutput::Json => print_json(&report)?,
    }

    if args.check && report.pending_count() > 0 {
        return Err(ExitCode(1).into());
    }
    Ok(())
}

fn print_status_table(report: &StatusReport) {
    if report.migrations.is_empty() {
        println!("No migrations found");
    } else {
        let rows: Vec<Vec<String>> = report
            .migrations
            .iter()
            .map(|m| {
                vec![
                    m.version.to_string(),
                    m.name.clone(),
                    format!("{:?}", m.state).to_lowercase(),
                    m.applied_at
                        .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
                        .unwrap_or_else(|| "-".to_string()),
                ]
            })
            .collect();
        print_table(&["VERSION", "NAME", "STATE", "APPLIED AT"], &rows);
    }

    if !report.orphaned.is_empty() {
        println!();
        println!("Applied but missing on disk:");
        for entry in &report.orphaned {
            println!("  {}", entry.name);
        }
    }

    println!();
    println!(
        "{} applied, {} pending",
        report.migrations.len() - report.pending_count(),
        report.pending_count()
    );
}
