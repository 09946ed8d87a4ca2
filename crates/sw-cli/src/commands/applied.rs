//! Applied command implementation

use anyhow::Result;
use sw_migrate::Migrator;

use crate::cli::{AppliedArgs, GlobalArgs, ListOutput};
use crate::commands::common::{load_context, print_json, print_table};

/// Execute the applied command
pub(crate) fn execute(args: &AppliedArgs, global: &GlobalArgs) -> Result<()> {
    let ctx = load_context(global)?;
    let db = ctx.connect()?;
    let migrator = Migrator::new(db.as_ref(), ctx.migrator_config()?);

    let applied = migrator.list_applied();

    match args.output {
        ListOutput::Json => print_json(&applied)?,
        ListOutput::Table if applied.is_empty() => println!("No migrations applied"),
        ListOutput::Table => {
            let rows: Vec<Vec<String>> = applied
                .iter()
                .map(|a| {
                    vec![
                        a.name.clone(),
                        a.applied_at
                            .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
                            .unwrap_or_default(),
                    ]
                })
                .collect();
            print_table(&["NAME", "APPLIED AT"], &rows);
        }
    }
    Ok(())
}
