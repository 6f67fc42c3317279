//! Finders - class-level lookups and query shortcuts for models

use serde_json::Value;

use crate::database::Database;
use crate::error::{ModelError, ModelResult};
use crate::query::{Condition, Ordering, Predicate, Query};
use crate::query::types::Operator;
use crate::schema::Model;

/// Lookups and query shortcuts available on every model
pub trait Finders: Model {
    /// Start a query for this model
    fn query(db: &Database) -> ModelResult<Query<Self>> {
        Query::new(db)
    }

    /// Find a record by its primary key
    ///
    /// Models with a composite primary key must use [`Finders::find_by`].
    async fn find(db: &Database, id: impl Into<Value>) -> ModelResult<Option<Self>> {
        let key = match Self::primary_key_columns() {
            [key] => *key,
            keys => {
                return Err(ModelError::InvalidKey(format!(
                    "{} has a composite primary key ({}); use find_by instead",
                    Self::model_name(),
                    keys.join(", ")
                )))
            }
        };

        Self::query(db)?
            .push_predicate(Predicate::Compare {
                column: key.to_string(),
                operator: Operator::Equal,
                value: id.into(),
            })
            .first()
            .await
    }

    /// First record whose fields equal every given value
    async fn find_by(db: &Database, fields: &[(&str, Value)]) -> ModelResult<Option<Self>> {
        if fields.is_empty() {
            return Err(ModelError::Precondition(
                "At least one keyword argument is required for find_by".to_string(),
            ));
        }

        Self::query(db)?.where_fields(fields)?.first().await
    }

    fn filter(db: &Database, condition: Condition<Self>) -> ModelResult<Query<Self>> {
        Ok(Self::query(db)?.filter(condition))
    }

    fn where_eq(db: &Database, field: &str, value: impl Into<Value>) -> ModelResult<Query<Self>> {
        Self::query(db)?.where_eq(field, value)
    }

    fn order_by(db: &Database, ordering: impl Into<Ordering<Self>>) -> ModelResult<Query<Self>> {
        Ok(Self::query(db)?.order_by(ordering))
    }

    fn order_by_field(db: &Database, field: &str, direction: &str) -> ModelResult<Query<Self>> {
        Self::query(db)?.order_by_field(field, direction)
    }

    fn limit(db: &Database, count: i64) -> ModelResult<Query<Self>> {
        Ok(Self::query(db)?.limit(count))
    }

    async fn all(db: &Database) -> ModelResult<Vec<Self>> {
        Self::query(db)?.all().await
    }

    async fn first(db: &Database) -> ModelResult<Option<Self>> {
        Self::query(db)?.first().await
    }

    async fn count(db: &Database) -> ModelResult<i64> {
        Self::query(db)?.count().await
    }
}

impl<T: Model> Finders for T {}
