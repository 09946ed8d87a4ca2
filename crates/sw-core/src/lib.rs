//! sw-core - Core library for Stepwise
//!
//! This crate provides configuration parsing, SQL dialects, migration file
//! discovery, statement splitting and dialect translation. Nothing here
//! touches a database; execution lives in `sw-db` and `sw-migrate`.

pub mod catalog;
pub mod config;
pub mod dialect;
pub mod error;
pub(crate) mod lexer;
pub mod splitter;
pub mod sql_utils;
pub mod translate;

pub use catalog::{discover, MigrationFile};
pub use config::{Config, DatabaseConfig, TargetConfig};
pub use dialect::Dialect;
pub use error::{CoreError, CoreResult};
pub use splitter::split;
pub use translate::{translate, AddColumnPlan, ColumnAddition, SkipReason, Translation};
