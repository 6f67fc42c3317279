//! # grace-orm: Database Layer for Grace bots
//!
//! Active-record models over SQLite: an engine registry, a fluent query
//! builder, instance persistence and file-based migrations.
//!
//! ```ignore
//! use grace_orm::prelude::*;
//!
//! let mut db = Database::new();
//! db.set_default_engine(Engine::connect("sqlite::memory:").await?);
//! db.register::<User>()?;
//!
//! let user = User::create(&db, User::new("Alice", 30)).await?;
//! let adults = User::filter(&db, User::AGE.gte(18))?
//!     .order_by(User::AGE.desc())
//!     .all()
//!     .await?;
//! ```

pub mod config;
pub mod database;
pub mod engine;
pub mod error;
pub mod migrations;
pub mod model;
pub mod query;
pub mod schema;

pub use config::{ConfigError, DatabaseConfig, Environment};
pub use database::Database;
pub use engine::{Engine, EngineConfig, Session};
pub use error::{ModelError, ModelResult};
pub use migrations::{MigrationConfig, MigrationManager, MigrationRunner};
pub use model::{ActiveRecord, Finders, Persistence};
pub use query::{Condition, Distinct, OrderDirection, Ordering, Query};
pub use schema::{Column, Model};

/// Everything a model definition and its callers need
pub mod prelude {
    pub use crate::database::Database;
    pub use crate::engine::Engine;
    pub use crate::error::{ModelError, ModelResult};
    pub use crate::model::{ActiveRecord, Finders, Persistence};
    pub use crate::query::{Condition, OrderDirection, Query};
    pub use crate::schema::{Column, Model};
}
