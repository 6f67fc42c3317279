//! Query Builder execution - terminal operations
//!
//! Each terminal borrows one session from the engine for a single round trip
//! and releases it before returning, so a builder can be executed again.

use serde_json::Value;

use super::builder::Query;
use super::sql_generation::{arguments, count_sql, Projection};
use crate::error::{ModelError, ModelResult};
use crate::schema::Model;

impl<M: Model> Query<M> {
    /// Every matching row, in the order the database returns them
    pub async fn all(&self) -> ModelResult<Vec<M>> {
        let (sql, params) = self.build_select(Projection::Rows);
        self.fetch_rows(sql, params).await
    }

    /// The first matching row, or `None` when nothing matches
    pub async fn first(&self) -> ModelResult<Option<M>> {
        let capped = self.capped(1);
        let (sql, params) = capped.build_select(Projection::Rows);
        let rows = self.fetch_rows(sql, params).await?;
        Ok(rows.into_iter().next())
    }

    /// Exactly one matching row
    ///
    /// Fails with `NoResultFound` on zero rows and `MultipleResultsFound` on
    /// two or more. At most two rows are fetched to decide.
    pub async fn one(&self) -> ModelResult<M> {
        let capped = self.capped(2);
        let (sql, params) = capped.build_select(Projection::Rows);
        let mut rows = self.fetch_rows(sql, params).await?;

        match rows.len() {
            0 => Err(ModelError::NoResultFound),
            1 => Ok(rows.remove(0)),
            _ => Err(ModelError::MultipleResultsFound),
        }
    }

    /// Number of matching rows, counted by the database
    pub async fn count(&self) -> ModelResult<i64> {
        let (inner, params) = self.build_select(Projection::Rows);
        self.fetch_count(inner, params).await
    }

    /// Whether any row matches
    pub async fn exists(&self) -> ModelResult<bool> {
        let capped = self.capped(1);
        let (inner, params) = capped.build_select(Projection::Rows);
        Ok(self.fetch_count(inner, params).await? > 0)
    }

    /// Copy of this query whose limit is at most `max`
    ///
    /// A negative limit is unbounded in SQLite, so it is replaced by `max`.
    fn capped(&self, max: i64) -> Query<M> {
        let mut query = self.clone();
        query.limit_count = Some(match self.limit_count {
            Some(limit) if limit >= 0 => limit.min(max),
            _ => max,
        });
        query
    }

    async fn fetch_rows(&self, sql: String, params: Vec<Value>) -> ModelResult<Vec<M>> {
        self.log_statement(&sql);

        let mut session = self.engine.session().await?;
        let rows = sqlx::query_as_with::<_, M, _>(&sql, arguments(params))
            .fetch_all(&mut *session)
            .await?;
        Ok(rows)
    }

    pub(crate) async fn fetch_count(&self, inner: String, params: Vec<Value>) -> ModelResult<i64> {
        let sql = count_sql(&inner);
        self.log_statement(&sql);

        let mut session = self.engine.session().await?;
        let count = sqlx::query_scalar_with::<_, i64, _>(&sql, arguments(params))
            .fetch_one(&mut *session)
            .await?;
        Ok(count)
    }
}
