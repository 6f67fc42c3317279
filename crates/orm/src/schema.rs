//! Model declarations - table names, declared columns and typed column handles
//!
//! A model is a plain struct that derives `sqlx::FromRow`, `Serialize` and
//! `Deserialize` and implements [`Model`]. Column handles give positional
//! conditions and orderings that are checked by the compiler; string field
//! names are resolved against [`Model::columns`] when they are used.

use std::fmt;
use std::marker::PhantomData;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use sqlx::sqlite::SqliteRow;
use sqlx::FromRow;

use crate::error::{ModelError, ModelResult};
use crate::query::condition::{Condition, Predicate};
use crate::query::ordering::Ordering;
use crate::query::types::{Operator, OrderDirection};

/// A type persisted as one row of one table
pub trait Model:
    for<'r> FromRow<'r, SqliteRow>
    + Serialize
    + DeserializeOwned
    + fmt::Debug
    + Send
    + Sync
    + Unpin
    + 'static
{
    /// Table name for this model
    fn table_name() -> &'static str;

    /// Every declared column, in insert order
    fn columns() -> &'static [&'static str];

    /// Primary key column(s)
    fn primary_key_columns() -> &'static [&'static str] {
        &["id"]
    }

    /// Name used in error messages
    fn model_name() -> &'static str {
        let full = std::any::type_name::<Self>();
        let base = full.split('<').next().unwrap_or(full);
        base.rsplit("::").next().unwrap_or(base)
    }

    /// Whether `field` is a declared column
    fn has_column(field: &str) -> bool {
        Self::columns().iter().any(|column| *column == field)
    }
}

/// Resolve a field name to its declared column, failing on unknown names
pub fn resolve_column<M: Model>(field: &str) -> ModelResult<&'static str> {
    M::columns()
        .iter()
        .copied()
        .find(|column| *column == field)
        .ok_or_else(|| ModelError::unknown_field(M::model_name(), field))
}

/// Whether `name` can be used as a table or column identifier
pub fn is_valid_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() || first == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Check a model declaration before it is bound to an engine
pub fn validate_model<M: Model>() -> ModelResult<()> {
    let model = M::model_name();

    if !is_valid_identifier(M::table_name()) {
        return Err(ModelError::Schema(format!(
            "{} has an invalid table name '{}'",
            model,
            M::table_name()
        )));
    }

    if M::columns().is_empty() {
        return Err(ModelError::Schema(format!("{} declares no columns", model)));
    }

    for (index, column) in M::columns().iter().enumerate() {
        if !is_valid_identifier(column) {
            return Err(ModelError::Schema(format!(
                "{} has an invalid column name '{}'",
                model, column
            )));
        }
        if M::columns()[..index].contains(column) {
            return Err(ModelError::Schema(format!(
                "{} declares column '{}' more than once",
                model, column
            )));
        }
    }

    if M::primary_key_columns().is_empty() {
        return Err(ModelError::Schema(format!("{} has no primary key", model)));
    }

    for key in M::primary_key_columns() {
        if !M::has_column(key) {
            return Err(ModelError::Schema(format!(
                "{} primary key '{}' is not a declared column",
                model, key
            )));
        }
    }

    Ok(())
}

/// Quote an identifier for safe use in generated SQL
pub(crate) fn quote_identifier(identifier: &str) -> String {
    format!("\"{}\"", identifier.replace('"', "\"\""))
}

/// Typed handle to one column of model `M` holding values of type `T`
///
/// Declared as associated constants on the model:
///
/// ```ignore
/// impl User {
///     pub const AGE: Column<User, i64> = Column::new("age");
/// }
///
/// let adults = User::filter(&db, User::AGE.gte(18))?.all().await?;
/// ```
pub struct Column<M, T> {
    name: &'static str,
    _marker: PhantomData<fn() -> (M, T)>,
}

impl<M, T> Clone for Column<M, T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<M, T> Copy for Column<M, T> {}

impl<M, T> fmt::Debug for Column<M, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Column").field(&self.name).finish()
    }
}

impl<M, T> Column<M, T> {
    pub const fn new(name: &'static str) -> Self {
        Self {
            name,
            _marker: PhantomData,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn is_null(self) -> Condition<M> {
        Condition::from_predicate(Predicate::Null {
            column: self.name.to_string(),
            negated: false,
        })
    }

    pub fn is_not_null(self) -> Condition<M> {
        Condition::from_predicate(Predicate::Null {
            column: self.name.to_string(),
            negated: true,
        })
    }

    pub fn asc(self) -> Ordering<M> {
        Ordering::new(self.name, OrderDirection::Asc)
    }

    pub fn desc(self) -> Ordering<M> {
        Ordering::new(self.name, OrderDirection::Desc)
    }
}

impl<M, T: Into<Value>> Column<M, T> {
    fn compare(self, operator: Operator, value: T) -> Condition<M> {
        Condition::from_predicate(Predicate::Compare {
            column: self.name.to_string(),
            operator,
            value: value.into(),
        })
    }

    pub fn eq(self, value: impl Into<T>) -> Condition<M> {
        self.compare(Operator::Equal, value.into())
    }

    pub fn ne(self, value: impl Into<T>) -> Condition<M> {
        self.compare(Operator::NotEqual, value.into())
    }

    pub fn gt(self, value: impl Into<T>) -> Condition<M> {
        self.compare(Operator::GreaterThan, value.into())
    }

    pub fn gte(self, value: impl Into<T>) -> Condition<M> {
        self.compare(Operator::GreaterThanOrEqual, value.into())
    }

    pub fn lt(self, value: impl Into<T>) -> Condition<M> {
        self.compare(Operator::LessThan, value.into())
    }

    pub fn lte(self, value: impl Into<T>) -> Condition<M> {
        self.compare(Operator::LessThanOrEqual, value.into())
    }

    pub fn like(self, pattern: impl Into<T>) -> Condition<M> {
        self.compare(Operator::Like, pattern.into())
    }

    pub fn is_in<I>(self, values: I) -> Condition<M>
    where
        I: IntoIterator,
        I::Item: Into<T>,
    {
        Condition::from_predicate(Predicate::In {
            column: self.name.to_string(),
            values: values
                .into_iter()
                .map(|v| Into::<T>::into(v).into())
                .collect(),
            negated: false,
        })
    }

    pub fn not_in<I>(self, values: I) -> Condition<M>
    where
        I: IntoIterator,
        I::Item: Into<T>,
    {
        Condition::from_predicate(Predicate::In {
            column: self.name.to_string(),
            values: values
                .into_iter()
                .map(|v| Into::<T>::into(v).into())
                .collect(),
            negated: true,
        })
    }

    pub fn between(self, low: impl Into<T>, high: impl Into<T>) -> Condition<M> {
        Condition::from_predicate(Predicate::Between {
            column: self.name.to_string(),
            low: Into::<T>::into(low).into(),
            high: Into::<T>::into(high).into(),
        })
    }
}
