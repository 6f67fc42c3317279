//! Migration Definitions - migrations, tracking records and run results

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// One migration file: a versioned pair of schema scripts
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Migration {
    /// File stem, `<YYYYMMDD_HHMMSS>_<name>`; sorts in creation order
    pub id: String,
    /// Human-readable name
    pub name: String,
    pub up_sql: String,
    pub down_sql: String,
    /// Parsed from the id's timestamp
    pub created_at: DateTime<Utc>,
}

/// Row of the tracking table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct MigrationRecord {
    pub id: String,
    pub applied_at: DateTime<Utc>,
    /// Every migration applied by one run shares a batch number
    pub batch: i64,
}

/// Where migrations live and where their state is tracked
#[derive(Debug, Clone)]
pub struct MigrationConfig {
    pub migrations_dir: PathBuf,
    pub migrations_table: String,
}

impl Default for MigrationConfig {
    fn default() -> Self {
        Self {
            migrations_dir: PathBuf::from("migrations"),
            migrations_table: "grace_migrations".to_string(),
        }
    }
}

/// Outcome of applying pending migrations
#[derive(Debug)]
pub struct MigrationRunResult {
    pub applied_count: usize,
    pub applied_migrations: Vec<String>,
    /// Migrations that were already applied
    pub skipped_count: usize,
    /// Zero when nothing was applied
    pub batch: i64,
    pub execution_time_ms: u128,
}

/// Outcome of rolling back a batch
#[derive(Debug)]
pub struct RollbackResult {
    pub rolled_back_count: usize,
    /// In the order they were undone
    pub rolled_back_migrations: Vec<String>,
    pub execution_time_ms: u128,
}

/// Whether a migration file has been applied
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MigrationStatus {
    Pending,
    Applied { applied_at: DateTime<Utc>, batch: i64 },
}

impl MigrationStatus {
    pub fn is_applied(&self) -> bool {
        matches!(self, MigrationStatus::Applied { .. })
    }
}
