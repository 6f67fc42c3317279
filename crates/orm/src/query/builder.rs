//! Query Builder - deferred, additive SELECT construction for one model

use std::fmt;
use std::marker::PhantomData;

use super::condition::Predicate;
use super::ordering::OrderTerm;
use crate::database::Database;
use crate::engine::Engine;
use crate::error::ModelResult;
use crate::schema::Model;

/// Not-yet-executed query against the table of model `M`
///
/// Every clause method consumes and returns the builder, so calls chain.
/// Filters and orderings accumulate left to right; `limit` and `offset`
/// overwrite. Nothing touches the database until a terminal method runs.
pub struct Query<M> {
    pub(crate) engine: Engine,
    pub(crate) predicates: Vec<Predicate>,
    pub(crate) order_by: Vec<OrderTerm>,
    pub(crate) limit_count: Option<i64>,
    pub(crate) offset_value: Option<i64>,
    pub(crate) distinct: bool,
    _model: PhantomData<fn() -> M>,
}

impl<M> Clone for Query<M> {
    fn clone(&self) -> Self {
        Self {
            engine: self.engine.clone(),
            predicates: self.predicates.clone(),
            order_by: self.order_by.clone(),
            limit_count: self.limit_count,
            offset_value: self.offset_value,
            distinct: self.distinct,
            _model: PhantomData,
        }
    }
}

impl<M> fmt::Debug for Query<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Query")
            .field("predicates", &self.predicates)
            .field("order_by", &self.order_by)
            .field("limit", &self.limit_count)
            .field("offset", &self.offset_value)
            .field("distinct", &self.distinct)
            .finish()
    }
}

impl<M: Model> Query<M> {
    /// Start a query using the engine bound to `M`
    pub fn new(db: &Database) -> ModelResult<Self> {
        Ok(Self::with_engine(db.get_engine::<M>()?))
    }

    /// Start a query on an explicit engine
    pub fn with_engine(engine: Engine) -> Self {
        Self {
            engine,
            predicates: Vec::new(),
            order_by: Vec::new(),
            limit_count: None,
            offset_value: None,
            distinct: false,
            _model: PhantomData,
        }
    }

    pub fn engine(&self) -> &Engine {
        &self.engine
    }
}
