//! Query Builder ORDER BY operations

use std::fmt;
use std::marker::PhantomData;

use super::builder::Query;
use super::types::OrderDirection;
use crate::error::ModelResult;
use crate::schema::{resolve_column, Column, Model};

/// Untyped ORDER BY term
#[derive(Debug, Clone, PartialEq)]
pub struct OrderTerm {
    pub column: String,
    pub direction: OrderDirection,
}

/// An ORDER BY term over a column of model `M`
pub struct Ordering<M> {
    term: OrderTerm,
    _model: PhantomData<fn() -> M>,
}

impl<M> Clone for Ordering<M> {
    fn clone(&self) -> Self {
        Self {
            term: self.term.clone(),
            _model: PhantomData,
        }
    }
}

impl<M> fmt::Debug for Ordering<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Ordering").field(&self.term).finish()
    }
}

impl<M> Ordering<M> {
    pub(crate) fn new(column: &str, direction: OrderDirection) -> Self {
        Self {
            term: OrderTerm {
                column: column.to_string(),
                direction,
            },
            _model: PhantomData,
        }
    }

    pub fn term(&self) -> &OrderTerm {
        &self.term
    }
}

/// A bare column sorts ascending
impl<M, T> From<Column<M, T>> for Ordering<M> {
    fn from(column: Column<M, T>) -> Self {
        column.asc()
    }
}

impl<M: Model> Query<M> {
    /// Add a positional ORDER BY term
    pub fn order_by(mut self, ordering: impl Into<Ordering<M>>) -> Self {
        self.order_by.push(ordering.into().term);
        self
    }

    /// Add an ORDER BY term for a named field and an `"asc"`/`"desc"` direction
    pub fn order_by_field(mut self, field: &str, direction: &str) -> ModelResult<Self> {
        let column = resolve_column::<M>(field)?;
        let direction: OrderDirection = direction.parse()?;
        self.order_by.push(OrderTerm {
            column: column.to_string(),
            direction,
        });
        Ok(self)
    }

    /// Add one ORDER BY term per `(field, direction)` pair
    pub fn order_by_fields(mut self, fields: &[(&str, &str)]) -> ModelResult<Self> {
        let mut resolved = Vec::with_capacity(fields.len());
        for (field, direction) in fields {
            resolved.push(OrderTerm {
                column: resolve_column::<M>(field)?.to_string(),
                direction: direction.parse()?,
            });
        }
        self.order_by.extend(resolved);
        Ok(self)
    }
}
