//! Migration System - versioned SQL scripts applied in batches
//!
//! - `definitions`: migration, record and result types
//! - `manager`: migration files on disk
//! - `runner`: applying, rolling back and reporting against an engine

pub mod definitions;
pub mod manager;
pub mod runner;

pub use definitions::{
    Migration, MigrationConfig, MigrationRecord, MigrationRunResult, MigrationStatus,
    RollbackResult,
};
pub use manager::{parse_migration, MigrationManager};
pub use runner::MigrationRunner;
