//! Field sets - a model viewed as `(column, value)` pairs

use serde_json::{Map, Value};

use crate::error::{ModelError, ModelResult};
use crate::schema::Model;

/// Declared columns of `model` with their values, in `columns()` order
pub(crate) fn to_fields<M: Model>(model: &M) -> ModelResult<Vec<(&'static str, Value)>> {
    let mut object = to_object(model)?;

    M::columns()
        .iter()
        .map(|column| {
            object.remove(*column).map(|value| (*column, value)).ok_or_else(|| {
                ModelError::Schema(format!(
                    "{} does not serialize declared column '{}'",
                    M::model_name(),
                    column
                ))
            })
        })
        .collect()
}

/// Copy of `model` with each declared field in `fields` assigned
///
/// Keys that are not declared columns are skipped.
pub(crate) fn assign_fields<M: Model>(model: &M, fields: &[(&str, Value)]) -> ModelResult<M> {
    let mut object = to_object(model)?;

    for (field, value) in fields {
        if M::has_column(field) {
            object.insert((*field).to_string(), value.clone());
        } else {
            tracing::debug!(model = M::model_name(), field = %field, "Ignoring undeclared field");
        }
    }

    Ok(serde_json::from_value(Value::Object(object))?)
}

fn to_object<M: Model>(model: &M) -> ModelResult<Map<String, Value>> {
    match serde_json::to_value(model)? {
        Value::Object(object) => Ok(object),
        other => Err(ModelError::Schema(format!(
            "{} must serialize to a map of fields, got {}",
            M::model_name(),
            other
        ))),
    }
}
