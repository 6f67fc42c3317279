//! Engine - pooled SQLite connections and scoped sessions
//!
//! An `Engine` is a cheap, cloneable handle. Every query or mutation borrows
//! exactly one connection (a `Session`) or one transaction from it and gives
//! it back when that value is dropped, whether the operation succeeded or not.

use std::ops::{Deref, DerefMut};
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use sqlx::pool::PoolConnection;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use sqlx::{Executor, Sqlite, SqliteConnection, Transaction};

use crate::error::ModelResult;

/// Connection pool configuration
#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    pub acquire_timeout: Duration,
    pub idle_timeout: Option<Duration>,
    pub max_lifetime: Option<Duration>,
    pub create_if_missing: bool,
    pub foreign_keys: bool,
}

impl EngineConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            max_connections: 5,
            min_connections: 0,
            acquire_timeout: Duration::from_secs(30),
            idle_timeout: Some(Duration::from_secs(600)),
            max_lifetime: Some(Duration::from_secs(1800)),
            create_if_missing: true,
            foreign_keys: true,
        }
    }

    pub fn max_connections(mut self, max: u32) -> Self {
        self.max_connections = max;
        self
    }

    pub fn min_connections(mut self, min: u32) -> Self {
        self.min_connections = min;
        self
    }

    pub fn acquire_timeout(mut self, timeout: Duration) -> Self {
        self.acquire_timeout = timeout;
        self
    }

    pub fn idle_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.idle_timeout = timeout;
        self
    }

    pub fn create_if_missing(mut self, create: bool) -> Self {
        self.create_if_missing = create;
        self
    }

    /// Whether the URL points at a private in-memory database
    pub fn is_in_memory(&self) -> bool {
        self.url.contains(":memory:") || self.url.contains("mode=memory")
    }

    fn pool_options(&self) -> SqlitePoolOptions {
        // An in-memory database lives only as long as its connections do,
        // so keep exactly one open for the lifetime of the pool.
        if self.is_in_memory() {
            return SqlitePoolOptions::new()
                .max_connections(1)
                .min_connections(1)
                .acquire_timeout(self.acquire_timeout)
                .idle_timeout(None)
                .max_lifetime(None);
        }

        SqlitePoolOptions::new()
            .max_connections(self.max_connections)
            .min_connections(self.min_connections)
            .acquire_timeout(self.acquire_timeout)
            .idle_timeout(self.idle_timeout)
            .max_lifetime(self.max_lifetime)
    }
}

/// Shared handle to a database connection pool
#[derive(Debug, Clone)]
pub struct Engine {
    pool: SqlitePool,
    config: Arc<EngineConfig>,
}

impl Engine {
    /// Connect with default pool settings
    pub async fn connect(url: &str) -> ModelResult<Self> {
        Self::connect_with(EngineConfig::new(url)).await
    }

    /// Connect using an explicit configuration
    pub async fn connect_with(config: EngineConfig) -> ModelResult<Self> {
        let options = SqliteConnectOptions::from_str(&config.url)?
            .create_if_missing(config.create_if_missing)
            .foreign_keys(config.foreign_keys);

        let pool = config.pool_options().connect_with(options).await?;

        tracing::info!(
            url = %config.url,
            in_memory = config.is_in_memory(),
            "Database engine connected"
        );

        Ok(Self {
            pool,
            config: Arc::new(config),
        })
    }

    /// Wrap an existing pool
    pub fn from_pool(pool: SqlitePool) -> Self {
        Self {
            pool,
            config: Arc::new(EngineConfig::new("")),
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Whether two handles share the same underlying pool
    pub fn same_as(&self, other: &Engine) -> bool {
        Arc::ptr_eq(&self.config, &other.config)
    }

    /// Acquire one connection for the duration of a single operation
    pub async fn session(&self) -> ModelResult<Session> {
        let conn = self.pool.acquire().await.map_err(|e| {
            tracing::error!("Failed to acquire database connection: {}", e);
            e
        })?;

        tracing::debug!(
            "Database session opened (size: {}, idle: {})",
            self.pool.size(),
            self.pool.num_idle()
        );

        Ok(Session { conn })
    }

    /// Begin a transaction; dropping it without `commit` rolls it back
    pub async fn transaction(&self) -> ModelResult<Transaction<'static, Sqlite>> {
        let tx = self.pool.begin().await?;
        tracing::debug!("Database transaction started");
        Ok(tx)
    }

    /// Run a raw SQL script, possibly holding several statements
    pub async fn execute_script(&self, sql: &str) -> ModelResult<u64> {
        let mut session = self.session().await?;
        let result = (&mut *session).execute(sql).await?;
        Ok(result.rows_affected())
    }

    /// Close the pool, waiting for checked-out connections to come back
    pub async fn close(&self) {
        self.pool.close().await;
        tracing::info!("Database engine closed");
    }
}

/// One pooled connection, returned to the pool on drop
#[derive(Debug)]
pub struct Session {
    conn: PoolConnection<Sqlite>,
}

impl Deref for Session {
    type Target = SqliteConnection;

    fn deref(&self) -> &Self::Target {
        &self.conn
    }
}

impl DerefMut for Session {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.conn
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        tracing::trace!("Database session released");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_in_memory_detection() {
        assert!(EngineConfig::new("sqlite::memory:").is_in_memory());
        assert!(EngineConfig::new("sqlite://file:bot?mode=memory&cache=shared").is_in_memory());
        assert!(!EngineConfig::new("sqlite://bot.db").is_in_memory());
    }

    #[test]
    fn test_builder_settings() {
        let config = EngineConfig::new("sqlite://bot.db")
            .max_connections(8)
            .min_connections(2)
            .idle_timeout(None)
            .create_if_missing(false);

        assert_eq!(config.max_connections, 8);
        assert_eq!(config.min_connections, 2);
        assert_eq!(config.idle_timeout, None);
        assert!(!config.create_if_missing);
    }

    #[tokio::test]
    async fn test_session_round_trip() {
        let engine = Engine::connect("sqlite::memory:").await.unwrap();
        engine
            .execute_script("CREATE TABLE pings (id INTEGER PRIMARY KEY); INSERT INTO pings DEFAULT VALUES;")
            .await
            .unwrap();

        let mut session = engine.session().await.unwrap();
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM pings")
            .fetch_one(&mut *session)
            .await
            .unwrap();
        assert_eq!(count, 1);
    }

    #[tokio::test]
    async fn test_in_memory_data_survives_between_sessions() {
        let engine = Engine::connect("sqlite::memory:").await.unwrap();
        engine
            .execute_script("CREATE TABLE notes (body TEXT)")
            .await
            .unwrap();

        drop(engine.session().await.unwrap());

        let mut session = engine.session().await.unwrap();
        let tables: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = 'notes'",
        )
        .fetch_one(&mut *session)
        .await
        .unwrap();
        assert_eq!(tables, 1);
    }

    #[tokio::test]
    async fn test_dropped_transaction_rolls_back() {
        let engine = Engine::connect("sqlite::memory:").await.unwrap();
        engine
            .execute_script("CREATE TABLE notes (body TEXT)")
            .await
            .unwrap();

        {
            let mut tx = engine.transaction().await.unwrap();
            sqlx::query("INSERT INTO notes (body) VALUES ('draft')")
                .execute(&mut *tx)
                .await
                .unwrap();
        }

        let mut session = engine.session().await.unwrap();
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM notes")
            .fetch_one(&mut *session)
            .await
            .unwrap();
        assert_eq!(count, 0);
    }
}
