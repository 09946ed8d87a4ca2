//! sw-migrate - Migration engine for Stepwise
//!
//! Ties the pieces together: discover migration files, filter them against
//! the applied-migration ledger, split and translate each file for the
//! connection's dialect and apply everything pending in one transaction.
//!
//! ```no_run
//! use sw_db::SqliteBackend;
//! use sw_migrate::{Migrator, MigratorConfig};
//!
//! let db = SqliteBackend::new("app.db")?;
//! let report = Migrator::new(&db, MigratorConfig::default()).ensure_and_apply()?;
//! println!("applied {} migration(s)", report.applied.len());
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod error;
pub mod ledger;
pub mod migrator;
pub mod policy;
pub mod preview;
pub mod scaffold;

pub use error::{MigrateError, MigrateResult};
pub use ledger::{AppliedMigration, Ledger};
pub use migrator::{
    FileState, MigrationReport, MigrationStatus, Migrator, MigratorConfig, RunState, StatusReport,
};
pub use preview::{preview, preview_sql, FilePreview, StatementPreview};
pub use scaffold::create_migration;
