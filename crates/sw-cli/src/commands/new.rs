//! New command implementation

use anyhow::{Context, Result};
use sw_migrate::create_migration;

use crate::cli::{GlobalArgs, NewArgs};
use crate::commands::common::load_context;

/// Execute the new command
pub(crate) fn execute(args: &NewArgs, global: &GlobalArgs) -> Result<()> {
    let ctx = load_context(global)?;
    let dir = ctx.migrations_dir()?;
    let description = args.description.join(" ");

    let path = create_migration(&dir, &description).context("Failed to create migration")?;
    println!("{}", path.display());
    Ok(())
}
