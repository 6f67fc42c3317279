//! Query Builder WHERE clause operations

use serde_json::Value;

use super::builder::Query;
use super::condition::{Condition, Predicate};
use super::types::Operator;
use crate::error::ModelResult;
use crate::schema::{resolve_column, Model};

impl<M: Model> Query<M> {
    /// Add a positional condition, ANDed with the existing ones
    pub fn filter(mut self, condition: Condition<M>) -> Self {
        self.predicates.push(condition.into_predicate());
        self
    }

    /// Add several positional conditions at once
    pub fn filter_all(mut self, conditions: impl IntoIterator<Item = Condition<M>>) -> Self {
        self.predicates
            .extend(conditions.into_iter().map(Condition::into_predicate));
        self
    }

    /// Add an equality condition on a named field
    ///
    /// The field is checked against the model's declared columns right away,
    /// so a typo fails here rather than when the query runs.
    pub fn where_eq(mut self, field: &str, value: impl Into<Value>) -> ModelResult<Self> {
        let column = resolve_column::<M>(field)?;
        self.predicates.push(Predicate::Compare {
            column: column.to_string(),
            operator: Operator::Equal,
            value: value.into(),
        });
        Ok(self)
    }

    /// Add an equality condition for each `(field, value)` pair
    ///
    /// Every field is resolved before any is added, so a failed call leaves
    /// nothing half-applied.
    pub fn where_fields(mut self, fields: &[(&str, Value)]) -> ModelResult<Self> {
        let mut resolved = Vec::with_capacity(fields.len());
        for (field, value) in fields {
            resolved.push(Predicate::Compare {
                column: resolve_column::<M>(field)?.to_string(),
                operator: Operator::Equal,
                value: value.clone(),
            });
        }
        self.predicates.extend(resolved);
        Ok(self)
    }

    pub(crate) fn push_predicate(mut self, predicate: Predicate) -> Self {
        self.predicates.push(predicate);
        self
    }
}
