//! Persistence - create, save, update and delete for model instances
//!
//! Every write runs in its own transaction on the model's engine and is
//! committed before the method returns. Writes that produce a row read it
//! back with `RETURNING *`, so server-assigned values (autoincrement keys,
//! column defaults) land on the in-memory value.

use serde_json::Value;

use super::fields::{assign_fields, to_fields};
use crate::database::Database;
use crate::error::{ModelError, ModelResult};
use crate::query::sql_generation::arguments;
use crate::schema::{quote_identifier, Model};

/// Instance-level writes available on every model
pub trait Persistence: Model {
    /// Persist a new record and return it as stored
    async fn create(db: &Database, mut model: Self) -> ModelResult<Self> {
        model.save(db).await?;
        Ok(model)
    }

    /// Insert the record, or update it when its primary key already exists
    ///
    /// On success `self` is replaced by the stored row.
    async fn save(&mut self, db: &Database) -> ModelResult<()> {
        let engine = db.get_engine::<Self>()?;
        let (sql, params) = save_statement::<Self>(to_fields(self)?);
        log_write::<Self>(&sql);

        let mut tx = engine.transaction().await?;
        let stored = sqlx::query_as_with::<_, Self, _>(&sql, arguments(params))
            .fetch_one(&mut *tx)
            .await?;
        tx.commit().await?;

        *self = stored;
        Ok(())
    }

    /// Remove the backing row; the in-memory value is left as it was
    async fn delete(&self, db: &Database) -> ModelResult<()> {
        let (sql, params) = delete_statement::<Self>(&to_fields(self)?)?;
        let engine = db.get_engine::<Self>()?;
        log_write::<Self>(&sql);

        let mut tx = engine.transaction().await?;
        let result = sqlx::query_with(&sql, arguments(params))
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;

        tracing::debug!(
            model = Self::model_name(),
            rows = result.rows_affected(),
            "Deleted record"
        );
        Ok(())
    }

    /// Assign the declared fields among `fields`, then save
    ///
    /// Keys that are not declared columns are ignored.
    async fn update(&mut self, db: &Database, fields: &[(&str, Value)]) -> ModelResult<()> {
        *self = assign_fields(self, fields)?;
        self.save(db).await
    }
}

impl<T: Model> Persistence for T {}

fn log_write<M: Model>(sql: &str) {
    tracing::debug!(
        target: "grace_orm::query",
        model = M::model_name(),
        sql = %sql,
        "Executing statement"
    );
}

/// INSERT for a record, as an upsert when every primary key is set
///
/// Null primary key columns are left out of a plain insert so the database
/// assigns them.
fn save_statement<M: Model>(fields: Vec<(&'static str, Value)>) -> (String, Vec<Value>) {
    let keys = M::primary_key_columns();
    let table = quote_identifier(M::table_name());

    let has_identity = keys
        .iter()
        .all(|key| fields.iter().any(|(column, value)| column == key && !value.is_null()));

    let fields: Vec<(&'static str, Value)> = if has_identity {
        fields
    } else {
        fields
            .into_iter()
            .filter(|(column, value)| !(keys.contains(column) && value.is_null()))
            .collect()
    };

    if fields.is_empty() {
        return (format!("INSERT INTO {} DEFAULT VALUES RETURNING *", table), Vec::new());
    }

    let columns: Vec<String> = fields.iter().map(|(column, _)| quote_identifier(column)).collect();
    let placeholders = vec!["?"; fields.len()].join(", ");
    let mut sql = format!(
        "INSERT INTO {} ({}) VALUES ({})",
        table,
        columns.join(", "),
        placeholders
    );

    if has_identity {
        let conflict: Vec<String> = keys.iter().map(|key| quote_identifier(key)).collect();
        let mut assignments: Vec<String> = fields
            .iter()
            .filter(|(column, _)| !keys.contains(column))
            .map(|(column, _)| excluded(column))
            .collect();
        // key-only tables still need a SET so RETURNING yields the row
        if assignments.is_empty() {
            assignments = keys.iter().map(|key| excluded(key)).collect();
        }
        sql.push_str(&format!(
            " ON CONFLICT ({}) DO UPDATE SET {}",
            conflict.join(", "),
            assignments.join(", ")
        ));
    }

    sql.push_str(" RETURNING *");
    let params = fields.into_iter().map(|(_, value)| value).collect();
    (sql, params)
}

fn excluded(column: &str) -> String {
    let quoted = quote_identifier(column);
    format!("{} = excluded.{}", quoted, quoted)
}

fn delete_statement<M: Model>(fields: &[(&'static str, Value)]) -> ModelResult<(String, Vec<Value>)> {
    let mut predicates = Vec::new();
    let mut params = Vec::new();

    for key in M::primary_key_columns() {
        let value = fields
            .iter()
            .find(|(column, _)| column == key)
            .map(|(_, value)| value)
            .filter(|value| !value.is_null())
            .ok_or(ModelError::MissingPrimaryKey)?;

        predicates.push(format!("{} = ?", quote_identifier(key)));
        params.push(value.clone());
    }

    let sql = format!(
        "DELETE FROM {} WHERE {}",
        quote_identifier(M::table_name()),
        predicates.join(" AND ")
    );
    Ok((sql, params))
}
