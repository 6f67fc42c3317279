//! Migration Runner - applies and rolls back migrations against an engine
//!
//! Each migration runs in its own transaction together with the change to
//! the tracking table, so a failing script leaves neither schema changes nor
//! a record behind. Migrations applied by one run share a batch number;
//! rollback undoes the most recent batch in reverse order.

use sqlx::Executor;
use std::collections::HashMap;
use std::time::Instant;

use super::definitions::{
    Migration, MigrationRecord, MigrationRunResult, MigrationStatus, RollbackResult,
};
use super::manager::MigrationManager;
use crate::engine::Engine;
use crate::error::{ModelError, ModelResult};
use crate::schema::quote_identifier;

/// Executes migrations from a [`MigrationManager`] on an [`Engine`]
#[derive(Debug, Clone)]
pub struct MigrationRunner {
    manager: MigrationManager,
    engine: Engine,
}

impl MigrationRunner {
    pub fn new(manager: MigrationManager, engine: Engine) -> Self {
        Self { manager, engine }
    }

    pub fn manager(&self) -> &MigrationManager {
        &self.manager
    }

    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    /// Apply every pending migration as one new batch
    pub async fn run_migrations(&self) -> ModelResult<MigrationRunResult> {
        let start = Instant::now();
        self.ensure_migrations_table().await?;

        let applied = self.applied_migrations().await?;
        let pending: Vec<Migration> = self
            .manager
            .load_migrations()?
            .into_iter()
            .filter(|migration| !applied.iter().any(|record| record.id == migration.id))
            .collect();

        if pending.is_empty() {
            tracing::info!("No pending migrations");
            return Ok(MigrationRunResult {
                applied_count: 0,
                applied_migrations: Vec::new(),
                skipped_count: applied.len(),
                batch: 0,
                execution_time_ms: start.elapsed().as_millis(),
            });
        }

        let batch = self.latest_batch().await? + 1;
        let mut applied_ids = Vec::with_capacity(pending.len());
        for migration in &pending {
            self.apply_migration(migration, batch).await?;
            applied_ids.push(migration.id.clone());
        }

        Ok(MigrationRunResult {
            applied_count: applied_ids.len(),
            applied_migrations: applied_ids,
            skipped_count: applied.len(),
            batch,
            execution_time_ms: start.elapsed().as_millis(),
        })
    }

    /// Undo every migration of the most recent batch, newest first
    pub async fn rollback_last_batch(&self) -> ModelResult<RollbackResult> {
        let start = Instant::now();
        self.ensure_migrations_table().await?;

        let batch = self.latest_batch().await?;
        let records: Vec<MigrationRecord> = self
            .applied_migrations()
            .await?
            .into_iter()
            .filter(|record| record.batch == batch)
            .collect();

        if batch == 0 || records.is_empty() {
            tracing::info!("Nothing to roll back");
            return Ok(RollbackResult {
                rolled_back_count: 0,
                rolled_back_migrations: Vec::new(),
                execution_time_ms: start.elapsed().as_millis(),
            });
        }

        let migrations: HashMap<String, Migration> = self
            .manager
            .load_migrations()?
            .into_iter()
            .map(|migration| (migration.id.clone(), migration))
            .collect();

        let mut rolled_back = Vec::with_capacity(records.len());
        for record in records.iter().rev() {
            let migration = migrations.get(&record.id).ok_or_else(|| {
                ModelError::Migration(format!(
                    "Migration file not found for applied migration {}",
                    record.id
                ))
            })?;
            self.revert_migration(migration).await?;
            rolled_back.push(record.id.clone());
        }

        Ok(RollbackResult {
            rolled_back_count: rolled_back.len(),
            rolled_back_migrations: rolled_back,
            execution_time_ms: start.elapsed().as_millis(),
        })
    }

    /// Every migration file with its applied state, oldest first
    pub async fn get_migration_status(&self) -> ModelResult<Vec<(Migration, MigrationStatus)>> {
        self.ensure_migrations_table().await?;

        let applied: HashMap<String, MigrationRecord> = self
            .applied_migrations()
            .await?
            .into_iter()
            .map(|record| (record.id.clone(), record))
            .collect();

        Ok(self
            .manager
            .load_migrations()?
            .into_iter()
            .map(|migration| {
                let status = match applied.get(&migration.id) {
                    Some(record) => MigrationStatus::Applied {
                        applied_at: record.applied_at,
                        batch: record.batch,
                    },
                    None => MigrationStatus::Pending,
                };
                (migration, status)
            })
            .collect())
    }

    async fn apply_migration(&self, migration: &Migration, batch: i64) -> ModelResult<()> {
        tracing::info!(migration = %migration.id, name = %migration.name, batch, "Applying migration");

        let mut tx = self.engine.transaction().await?;
        if !migration.up_sql.is_empty() {
            (&mut *tx)
                .execute(migration.up_sql.as_str())
                .await
                .map_err(|e| {
                    ModelError::Migration(format!(
                        "Failed to execute migration {}: {}",
                        migration.id, e
                    ))
                })?;
        }

        sqlx::query(&format!(
            "INSERT INTO {} (id, applied_at, batch) VALUES (?, ?, ?)",
            self.table()
        ))
        .bind(&migration.id)
        .bind(chrono::Utc::now())
        .bind(batch)
        .execute(&mut *tx)
        .await
        .map_err(|e| ModelError::Migration(format!("Failed to record migration: {}", e)))?;

        tx.commit().await?;
        Ok(())
    }

    async fn revert_migration(&self, migration: &Migration) -> ModelResult<()> {
        tracing::info!(migration = %migration.id, name = %migration.name, "Rolling back migration");

        let mut tx = self.engine.transaction().await?;
        if !migration.down_sql.is_empty() {
            (&mut *tx)
                .execute(migration.down_sql.as_str())
                .await
                .map_err(|e| {
                    ModelError::Migration(format!(
                        "Failed to roll back migration {}: {}",
                        migration.id, e
                    ))
                })?;
        }

        sqlx::query(&format!("DELETE FROM {} WHERE id = ?", self.table()))
            .bind(&migration.id)
            .execute(&mut *tx)
            .await
            .map_err(|e| ModelError::Migration(format!("Failed to remove migration record: {}", e)))?;

        tx.commit().await?;
        Ok(())
    }

    async fn ensure_migrations_table(&self) -> ModelResult<()> {
        let sql = format!(
            "CREATE TABLE IF NOT EXISTS {} (\n    \
                id TEXT PRIMARY KEY,\n    \
                applied_at TIMESTAMP NOT NULL,\n    \
                batch INTEGER NOT NULL\n\
            )",
            self.table()
        );
        self.engine.execute_script(&sql).await.map_err(|e| {
            ModelError::Migration(format!("Failed to create migrations table: {}", e))
        })?;
        Ok(())
    }

    async fn applied_migrations(&self) -> ModelResult<Vec<MigrationRecord>> {
        let sql = format!(
            "SELECT id, applied_at, batch FROM {} ORDER BY batch, id",
            self.table()
        );
        let mut session = self.engine.session().await?;
        let records = sqlx::query_as::<_, MigrationRecord>(&sql)
            .fetch_all(&mut *session)
            .await?;
        Ok(records)
    }

    async fn latest_batch(&self) -> ModelResult<i64> {
        let sql = format!("SELECT COALESCE(MAX(batch), 0) FROM {}", self.table());
        let mut session = self.engine.session().await?;
        let batch = sqlx::query_scalar::<_, i64>(&sql)
            .fetch_one(&mut *session)
            .await?;
        Ok(batch)
    }

    fn table(&self) -> String {
        quote_identifier(&self.manager.config().migrations_table)
    }
}
