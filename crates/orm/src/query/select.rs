//! Query Builder DISTINCT projections

use std::fmt;
use std::marker::PhantomData;

use sqlx::Sqlite;

use super::builder::Query;
use super::sql_generation::{arguments, Projection};
use crate::error::ModelResult;
use crate::schema::{Column, Model};

impl<M: Model> Query<M> {
    /// Select distinct rows
    pub fn distinct(mut self) -> Self {
        self.distinct = true;
        self
    }

    /// Rewrite the query to return the distinct values of one column
    ///
    /// Filters, ordering, limit and offset carry over to the projection.
    pub fn unique<T>(self, column: Column<M, T>) -> Distinct<M, T> {
        Distinct {
            query: self,
            column: column.name(),
            _value: PhantomData,
        }
    }
}

/// Distinct values of a single column of model `M`
pub struct Distinct<M, T> {
    query: Query<M>,
    column: &'static str,
    _value: PhantomData<fn() -> T>,
}

impl<M, T> Clone for Distinct<M, T> {
    fn clone(&self) -> Self {
        Self {
            query: self.query.clone(),
            column: self.column,
            _value: PhantomData,
        }
    }
}

impl<M, T> fmt::Debug for Distinct<M, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Distinct")
            .field("column", &self.column)
            .field("query", &self.query)
            .finish()
    }
}

impl<M, T> Distinct<M, T>
where
    M: Model,
    T: for<'r> sqlx::Decode<'r, Sqlite> + sqlx::Type<Sqlite> + Send + Unpin,
{
    /// Render the projection with `?` placeholders
    pub fn to_sql(&self) -> String {
        self.query
            .build_select(Projection::DistinctColumn(self.column))
            .0
    }

    /// Every distinct value, in database order
    pub async fn all(&self) -> ModelResult<Vec<T>> {
        let (sql, params) = self
            .query
            .build_select(Projection::DistinctColumn(self.column));
        self.query.log_statement(&sql);

        let mut session = self.query.engine.session().await?;
        let values = sqlx::query_scalar_with::<_, T, _>(&sql, arguments(params))
            .fetch_all(&mut *session)
            .await?;
        Ok(values)
    }

    /// Number of distinct values, counted by the database
    pub async fn count(&self) -> ModelResult<i64> {
        let (inner, params) = self
            .query
            .build_select(Projection::DistinctColumn(self.column));
        self.query.fetch_count(inner, params).await
    }
}
