//! Database - the engine registry shared by every model
//!
//! Built once at startup and passed by reference to queries and the
//! active-record methods. Binding requires `&mut Database`; lookups only
//! need `&Database`, so a finished registry can be shared freely.

use std::any::TypeId;
use std::collections::HashMap;

use crate::config::DatabaseConfig;
use crate::engine::Engine;
use crate::error::{ModelError, ModelResult};
use crate::schema::{validate_model, Model};

/// Association between model types and the engines that run their queries
#[derive(Debug, Clone, Default)]
pub struct Database {
    engines: HashMap<TypeId, Engine>,
    default_engine: Option<Engine>,
}

impl Database {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry whose default engine is connected from configuration
    pub async fn from_config(config: &DatabaseConfig) -> ModelResult<Self> {
        config.validate()?;
        let engine = Engine::connect_with(config.engine_config()).await?;

        let mut db = Self::new();
        db.set_default_engine(engine);
        Ok(db)
    }

    /// Bind `engine` to model `M`, replacing any earlier binding
    ///
    /// The model declaration is validated first; a malformed model is never
    /// bound.
    pub fn set_engine<M: Model>(&mut self, engine: Engine) -> ModelResult<()> {
        validate_model::<M>()?;
        if self.engines.insert(TypeId::of::<M>(), engine).is_some() {
            tracing::debug!(model = M::model_name(), "Replaced engine binding");
        } else {
            tracing::debug!(model = M::model_name(), "Bound engine");
        }
        Ok(())
    }

    /// Bind `engine` to every model without a specific binding
    pub fn set_default_engine(&mut self, engine: Engine) {
        tracing::debug!("Bound default engine");
        self.default_engine = Some(engine);
    }

    /// Validate model `M` and bind it to the default engine
    pub fn register<M: Model>(&mut self) -> ModelResult<()> {
        let engine = self.default_engine.clone().ok_or_else(|| {
            ModelError::Configuration(format!(
                "Cannot register {} without a default engine. Call Database::set_default_engine() first.",
                M::model_name()
            ))
        })?;
        self.set_engine::<M>(engine)
    }

    /// Engine for model `M`: its own binding, else the default
    ///
    /// Models reaching the default engine without being registered are
    /// validated here, so a malformed declaration never runs a query.
    pub fn get_engine<M: Model>(&self) -> ModelResult<Engine> {
        if let Some(engine) = self.engines.get(&TypeId::of::<M>()) {
            return Ok(engine.clone());
        }

        match &self.default_engine {
            Some(engine) => {
                validate_model::<M>()?;
                Ok(engine.clone())
            }
            None => Err(ModelError::Configuration(format!(
                "No engine set for {}. Call Database::set_engine() first.",
                M::model_name()
            ))),
        }
    }

    /// Whether model `M` has an engine available
    pub fn has_engine<M: Model>(&self) -> bool {
        self.engines.contains_key(&TypeId::of::<M>()) || self.default_engine.is_some()
    }
}
